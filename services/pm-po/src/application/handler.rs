//! 采购订单业务处理

use std::sync::Arc;

use chrono::NaiveDate;
use softwear_common::{PagedResult, Pagination, UserId};
use softwear_errors::{AppError, AppResult};
use tracing::{info, warn};

use crate::domain::{
    CreatedPurchaseOrder, PoFilter, PurchaseOrder, PurchaseOrderDetails,
    PurchaseOrderRepository, StatusOutcome,
};

use super::commands::{CreatePurchaseOrderCommand, UpdatePoStatusCommand};

pub struct ServiceHandler {
    orders: Arc<dyn PurchaseOrderRepository>,
}

impl ServiceHandler {
    pub fn new(orders: Arc<dyn PurchaseOrderRepository>) -> Self {
        Self { orders }
    }

    /// 供应商不属于卖家或已停用时返回 None
    pub async fn create_purchase_order(
        &self,
        cmd: CreatePurchaseOrderCommand,
    ) -> AppResult<Option<CreatedPurchaseOrder>> {
        let order = cmd.validate()?;
        let created = self.orders.insert(&order).await?;
        match &created {
            Some(po) => info!(
                po_id = po.id,
                po_number = %po.po_number,
                supplier_id = order.supplier_id,
                total = %order.total_amount(),
                "Purchase order created"
            ),
            None => warn!(
                seller = order.seller.0,
                supplier_id = order.supplier_id,
                "Purchase order rejected: supplier unavailable"
            ),
        }
        Ok(created)
    }

    pub async fn list_purchase_orders(
        &self,
        filter: &PoFilter,
        pagination: Pagination,
    ) -> AppResult<PagedResult<PurchaseOrder>> {
        let items = self.orders.list(filter, pagination).await?;
        let total = self.orders.count(filter).await?;
        Ok(PagedResult::new(items, total, &pagination))
    }

    pub async fn count_purchase_orders(&self, filter: &PoFilter) -> AppResult<u64> {
        self.orders.count(filter).await
    }

    pub async fn purchase_order_details(
        &self,
        id: i32,
        seller: UserId,
    ) -> AppResult<Option<PurchaseOrderDetails>> {
        self.orders.details(id, seller).await
    }

    pub async fn update_status(&self, cmd: UpdatePoStatusCommand) -> AppResult<()> {
        let change = cmd.validate()?;
        match self.orders.update_status(&change).await? {
            StatusOutcome::NotFound => Err(AppError::not_found(format!(
                "采购订单 {} 不存在",
                change.id
            ))),
            StatusOutcome::Updated { received_items } => {
                info!(
                    po_id = change.id,
                    status = %change.status,
                    received_items,
                    "Purchase order status updated"
                );
                Ok(())
            }
        }
    }

    pub async fn update_expected_date(
        &self,
        id: i32,
        seller: UserId,
        updated_by: UserId,
        date: Option<NaiveDate>,
    ) -> AppResult<()> {
        if !self
            .orders
            .update_expected_date(id, seller, updated_by, date)
            .await?
        {
            return Err(AppError::not_found(format!("采购订单 {} 不存在", id)));
        }
        Ok(())
    }

    pub async fn delete_purchase_order(
        &self,
        id: i32,
        seller: UserId,
        updated_by: UserId,
    ) -> AppResult<()> {
        if !self.orders.archive(id, seller, updated_by).await? {
            return Err(AppError::not_found(format!("采购订单 {} 不存在", id)));
        }
        info!(po_id = id, "Purchase order archived");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::PoItemInput;
    use crate::domain::{MockPurchaseOrderRepository, PoStatus};
    use rust_decimal::Decimal;

    const SELLER: UserId = UserId(4);

    fn create_command() -> CreatePurchaseOrderCommand {
        CreatePurchaseOrderCommand {
            seller: SELLER,
            created_by: SELLER,
            supplier_id: 8,
            notes: None,
            expected_delivery_date: None,
            items: vec![PoItemInput {
                variant_id: 1,
                size_id: Some(2),
                color_id: None,
                quantity: 10,
                unit_price: Decimal::new(15000, 2),
            }],
        }
    }

    #[tokio::test]
    async fn test_create_passes_computed_total() {
        let mut repo = MockPurchaseOrderRepository::new();
        repo.expect_insert()
            .withf(|o| o.total_amount() == Decimal::new(150000, 2))
            .returning(|_| {
                Ok(Some(CreatedPurchaseOrder {
                    id: 1,
                    po_number: "PO-202501-0001".to_string(),
                }))
            });

        let created = ServiceHandler::new(Arc::new(repo))
            .create_purchase_order(create_command())
            .await
            .unwrap();
        assert_eq!(created.map(|po| po.po_number).as_deref(), Some("PO-202501-0001"));
    }

    #[tokio::test]
    async fn test_unavailable_supplier_is_none() {
        let mut repo = MockPurchaseOrderRepository::new();
        repo.expect_insert().returning(|_| Ok(None));

        let created = ServiceHandler::new(Arc::new(repo))
            .create_purchase_order(create_command())
            .await
            .unwrap();
        assert!(created.is_none());
    }

    #[tokio::test]
    async fn test_status_update_on_missing_order() {
        let mut repo = MockPurchaseOrderRepository::new();
        repo.expect_update_status()
            .withf(|c| c.status == PoStatus::Completed && c.seller == SELLER)
            .returning(|_| Ok(StatusOutcome::NotFound));

        let err = ServiceHandler::new(Arc::new(repo))
            .update_status(UpdatePoStatusCommand {
                id: 3,
                seller: SELLER,
                updated_by: SELLER,
                status: "Completed".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_unknown_status_never_reaches_repository() {
        let mut repo = MockPurchaseOrderRepository::new();
        repo.expect_update_status().never();

        let result = ServiceHandler::new(Arc::new(repo))
            .update_status(UpdatePoStatusCommand {
                id: 3,
                seller: SELLER,
                updated_by: SELLER,
                status: "Received".to_string(),
            })
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
