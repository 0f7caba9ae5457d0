//! 退货业务处理

use std::sync::Arc;

use chrono::Utc;
use softwear_common::{DateRange, PagedResult, Pagination, UserId};
use softwear_errors::AppResult;
use tracing::{info, warn};

use crate::domain::{
    CreatedReturn, DailyReturns, ReturnDetails, ReturnFilter, ReturnOwner, ReturnRepository,
    ReturnReport, ReturnableSale, ReturnableSaleFilter, ReturnableSaleItem, StatusOutcome,
    fill_daily_returns,
};

use super::commands::{CreateReturnCommand, UpdateReturnStatusCommand};

pub struct ServiceHandler {
    returns: Arc<dyn ReturnRepository>,
}

impl ServiceHandler {
    pub fn new(returns: Arc<dyn ReturnRepository>) -> Self {
        Self { returns }
    }

    /// 提交退货申请，状态为 Pending
    pub async fn create_return(&self, cmd: CreateReturnCommand) -> AppResult<CreatedReturn> {
        let sales_return = cmd.validate()?;
        let created = self.returns.insert(&sales_return).await?;
        info!(
            return_id = created.id,
            return_number = %created.return_number,
            sale_id = sales_return.sale_id,
            cashier = sales_return.cashier.0,
            "Return created"
        );
        Ok(created)
    }

    /// 退货单不存在时返回 false
    pub async fn update_return_status(&self, cmd: UpdateReturnStatusCommand) -> AppResult<bool> {
        let change = cmd.validate()?;
        match self.returns.update_status(&change).await? {
            StatusOutcome::NotFound => {
                warn!(return_id = change.return_id, "Return not found for status update");
                Ok(false)
            }
            StatusOutcome::Updated { restocked } => {
                info!(
                    return_id = change.return_id,
                    status = %change.status,
                    approved_by = change.approved_by.0,
                    "Return status updated"
                );
                if let Some((items, refund)) = restocked {
                    info!(return_id = change.return_id, items, refund = %refund, "Return restocked");
                }
                Ok(true)
            }
        }
    }

    pub async fn list_returns(
        &self,
        filter: &ReturnFilter,
        pagination: Pagination,
    ) -> AppResult<PagedResult<ReturnReport>> {
        let items = self.returns.list(filter, pagination).await?;
        let total = self.returns.count(filter).await?;
        Ok(PagedResult::new(items, total, &pagination))
    }

    pub async fn count_returns(&self, filter: &ReturnFilter) -> AppResult<u64> {
        self.returns.count(filter).await
    }

    pub async fn return_details(
        &self,
        return_id: i32,
        owner: ReturnOwner,
    ) -> AppResult<Option<ReturnDetails>> {
        let Some(report) = self.returns.find(return_id, owner).await? else {
            return Ok(None);
        };
        let items = self.returns.items(return_id).await?;
        Ok(Some(ReturnDetails { report, items }))
    }

    pub async fn returnable_sales(
        &self,
        filter: &ReturnableSaleFilter,
        pagination: Pagination,
    ) -> AppResult<PagedResult<ReturnableSale>> {
        let items = self.returns.returnable_sales(filter, pagination).await?;
        let total = self.returns.count_returnable_sales(filter).await?;
        Ok(PagedResult::new(items, total, &pagination))
    }

    pub async fn returnable_sale(
        &self,
        sale_id: i32,
        cashier: UserId,
    ) -> AppResult<Option<ReturnableSale>> {
        self.returns.returnable_sale(sale_id, cashier).await
    }

    pub async fn returnable_items(&self, sale_id: i32) -> AppResult<Vec<ReturnableSaleItem>> {
        self.returns.returnable_items(sale_id).await
    }

    pub async fn daily_returns(&self, cashier: UserId, days: u32) -> AppResult<Vec<DailyReturns>> {
        let range = DateRange::last_days(Utc::now().date_naive(), days);
        let data = self.returns.daily(cashier, &range).await?;
        Ok(fill_daily_returns(&range, &data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ReturnItemInput;
    use crate::domain::{MockReturnRepository, ReturnStatus};
    use rust_decimal::Decimal;
    use softwear_errors::AppError;

    fn status_command(status: &str) -> UpdateReturnStatusCommand {
        UpdateReturnStatusCommand {
            return_id: 5,
            seller: UserId(1),
            approved_by: UserId(2),
            status: status.to_string(),
        }
    }

    #[tokio::test]
    async fn test_missing_return_reports_false() {
        let mut repo = MockReturnRepository::new();
        repo.expect_update_status()
            .returning(|_| Ok(StatusOutcome::NotFound));

        let updated = ServiceHandler::new(Arc::new(repo))
            .update_return_status(status_command("Rejected"))
            .await
            .unwrap();
        assert!(!updated);
    }

    #[tokio::test]
    async fn test_approval_passes_status() {
        let mut repo = MockReturnRepository::new();
        repo.expect_update_status()
            .withf(|c| c.status == ReturnStatus::Approved && c.return_id == 5)
            .returning(|_| {
                Ok(StatusOutcome::Updated {
                    restocked: Some((2, Decimal::new(70000, 2))),
                })
            });

        assert!(
            ServiceHandler::new(Arc::new(repo))
                .update_return_status(status_command("Approved"))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_invalid_return_is_not_written() {
        let mut repo = MockReturnRepository::new();
        repo.expect_insert().never();

        let err = ServiceHandler::new(Arc::new(repo))
            .create_return(CreateReturnCommand {
                sale_id: 1,
                cashier: UserId(3),
                reason: None,
                items: vec![ReturnItemInput {
                    sale_item_id: 1,
                    quantity: -1,
                    condition: "New".to_string(),
                }],
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_details_skip_items_when_missing() {
        let mut repo = MockReturnRepository::new();
        repo.expect_find().returning(|_, _| Ok(None));
        repo.expect_items().never();

        let details = ServiceHandler::new(Arc::new(repo))
            .return_details(9, ReturnOwner::Seller(UserId(1)))
            .await
            .unwrap();
        assert!(details.is_none());
    }
}
