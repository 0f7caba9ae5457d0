//! 采购订单仓储接口

use async_trait::async_trait;
use chrono::NaiveDate;
use softwear_common::{Pagination, UserId};
use softwear_errors::AppResult;

use super::{
    CreatedPurchaseOrder, NewPurchaseOrder, PoFilter, PurchaseOrder, PurchaseOrderDetails,
    StatusChange, StatusOutcome,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PurchaseOrderRepository: Send + Sync {
    async fn list(&self, filter: &PoFilter, pagination: Pagination) -> AppResult<Vec<PurchaseOrder>>;

    async fn count(&self, filter: &PoFilter) -> AppResult<u64>;

    /// `UserId::ANY` 不校验归属
    async fn details(&self, id: i32, seller: UserId) -> AppResult<Option<PurchaseOrderDetails>>;

    /// 订单号在同一事务内生成；供应商不可用时为 None
    async fn insert(&self, order: &NewPurchaseOrder) -> AppResult<Option<CreatedPurchaseOrder>>;

    /// 首次完成时按明细入库
    async fn update_status(&self, change: &StatusChange) -> AppResult<StatusOutcome>;

    async fn update_expected_date(
        &self,
        id: i32,
        seller: UserId,
        updated_by: UserId,
        date: Option<NaiveDate>,
    ) -> AppResult<bool>;

    async fn archive(&self, id: i32, seller: UserId, updated_by: UserId) -> AppResult<bool>;
}
