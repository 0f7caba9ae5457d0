//! 应付仓储接口

use async_trait::async_trait;
use softwear_common::UserId;
use softwear_errors::AppResult;

use super::{NewSupplierPayment, Payable, PayableFilter, PaymentTarget, StockGroupKey, SupplierPayment};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PayableRepository: Send + Sync {
    /// 已完成采购订单；不按付款状态过滤
    async fn purchase_order_payables(&self, filter: &PayableFilter) -> AppResult<Vec<Payable>>;

    /// 散装入库分组；不按付款状态过滤
    async fn stock_group_payables(&self, filter: &PayableFilter) -> AppResult<Vec<Payable>>;

    async fn purchase_order_payable(&self, po_id: i32, seller: UserId) -> AppResult<Option<Payable>>;

    async fn stock_group_payable(
        &self,
        key: StockGroupKey,
        seller: UserId,
    ) -> AppResult<Option<Payable>>;

    async fn payments(&self, target: PaymentTarget, seller: UserId) -> AppResult<Vec<SupplierPayment>>;

    /// 付款对象不存在或不属于卖家时返回 None；超付时报 Validation
    async fn insert_payment(&self, payment: &NewSupplierPayment) -> AppResult<Option<i32>>;

    async fn archive_payment(&self, payment_id: i32, seller: UserId) -> AppResult<bool>;
}
