//! 应付业务处理

use std::sync::Arc;

use softwear_common::{PagedResult, Pagination, UserId};
use softwear_errors::AppResult;
use tracing::{info, warn};

use crate::domain::{
    Payable, PayableFilter, PayableRepository, PayableSummary, PaymentTarget, StockGroupKey,
    SupplierPayment, merge_payables,
};

use super::commands::CreatePaymentCommand;

pub struct ServiceHandler {
    payables: Arc<dyn PayableRepository>,
}

impl ServiceHandler {
    pub fn new(payables: Arc<dyn PayableRepository>) -> Self {
        Self { payables }
    }

    async fn all_payables(&self, filter: &PayableFilter) -> AppResult<Vec<Payable>> {
        let orders = self.payables.purchase_order_payables(filter).await?;
        let groups = self.payables.stock_group_payables(filter).await?;
        Ok(merge_payables(orders, groups, filter.status))
    }

    /// 两个来源合并后在内存中分页
    pub async fn list_payables(
        &self,
        filter: &PayableFilter,
        pagination: Pagination,
    ) -> AppResult<PagedResult<Payable>> {
        let all = self.all_payables(filter).await?;
        let total = all.len() as u64;
        Ok(PagedResult::new(pagination.slice(&all), total, &pagination))
    }

    pub async fn count_payables(&self, filter: &PayableFilter) -> AppResult<u64> {
        Ok(self.all_payables(filter).await?.len() as u64)
    }

    pub async fn payable_summary(&self, filter: &PayableFilter) -> AppResult<PayableSummary> {
        let all = self.all_payables(filter).await?;
        Ok(PayableSummary::from_payables(&all))
    }

    pub async fn payable_by_purchase_order(
        &self,
        po_id: i32,
        seller: UserId,
    ) -> AppResult<Option<Payable>> {
        self.payables.purchase_order_payable(po_id, seller).await
    }

    /// 分组键格式错误时返回 None
    pub async fn payable_by_stock_group(
        &self,
        key: &str,
        seller: UserId,
    ) -> AppResult<Option<Payable>> {
        let Some(key) = StockGroupKey::parse(key) else {
            return Ok(None);
        };
        self.payables.stock_group_payable(key, seller).await
    }

    pub async fn payments_by_purchase_order(
        &self,
        po_id: i32,
        seller: UserId,
    ) -> AppResult<Vec<SupplierPayment>> {
        self.payables
            .payments(PaymentTarget::PurchaseOrder(po_id), seller)
            .await
    }

    pub async fn payments_by_stock_group(
        &self,
        key: &str,
        seller: UserId,
    ) -> AppResult<Vec<SupplierPayment>> {
        let Some(key) = StockGroupKey::parse(key) else {
            return Ok(Vec::new());
        };
        self.payables
            .payments(PaymentTarget::StockGroup(key), seller)
            .await
    }

    pub async fn payments_by_invoice(
        &self,
        invoice_id: i32,
        seller: UserId,
    ) -> AppResult<Vec<SupplierPayment>> {
        self.payables
            .payments(PaymentTarget::Invoice(invoice_id), seller)
            .await
    }

    /// 付款对象不存在或不属于卖家时返回 None
    pub async fn create_payment(&self, cmd: CreatePaymentCommand) -> AppResult<Option<i32>> {
        let payment = cmd.validate()?;
        let created = self.payables.insert_payment(&payment).await?;
        match created {
            Some(id) => info!(
                payment_id = id,
                seller = payment.seller.0,
                target = ?payment.target,
                amount = %payment.amount,
                "Supplier payment recorded"
            ),
            None => warn!(
                seller = payment.seller.0,
                target = ?payment.target,
                "Supplier payment rejected: target unavailable"
            ),
        }
        Ok(created)
    }

    pub async fn delete_payment(&self, payment_id: i32, seller: UserId) -> AppResult<bool> {
        let archived = self.payables.archive_payment(payment_id, seller).await?;
        if archived {
            info!(payment_id, seller = seller.0, "Supplier payment archived");
        }
        Ok(archived)
    }
}
