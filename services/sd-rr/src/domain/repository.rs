//! 退货仓储接口

use async_trait::async_trait;
use softwear_common::{DateRange, Pagination, UserId};
use softwear_errors::AppResult;

use super::{
    CreatedReturn, DailyReturns, NewReturn, ReturnFilter, ReturnOwner, ReturnReport,
    ReturnReportItem, ReturnableSale, ReturnableSaleFilter, ReturnableSaleItem, StatusChange,
    StatusOutcome,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReturnRepository: Send + Sync {
    /// 校验可退数量后写入；销售单不存在或未完成时报 NotFound
    async fn insert(&self, sales_return: &NewReturn) -> AppResult<CreatedReturn>;

    /// 状态、回库、管理费冲销在同一事务内完成
    async fn update_status(&self, change: &StatusChange) -> AppResult<StatusOutcome>;

    async fn list(&self, filter: &ReturnFilter, pagination: Pagination) -> AppResult<Vec<ReturnReport>>;

    async fn count(&self, filter: &ReturnFilter) -> AppResult<u64>;

    async fn find(&self, return_id: i32, owner: ReturnOwner) -> AppResult<Option<ReturnReport>>;

    async fn items(&self, return_id: i32) -> AppResult<Vec<ReturnReportItem>>;

    async fn returnable_sales(
        &self,
        filter: &ReturnableSaleFilter,
        pagination: Pagination,
    ) -> AppResult<Vec<ReturnableSale>>;

    async fn count_returnable_sales(&self, filter: &ReturnableSaleFilter) -> AppResult<u64>;

    async fn returnable_sale(&self, sale_id: i32, cashier: UserId) -> AppResult<Option<ReturnableSale>>;

    async fn returnable_items(&self, sale_id: i32) -> AppResult<Vec<ReturnableSaleItem>>;

    /// 只返回有退货的日期
    async fn daily(&self, cashier: UserId, range: &DateRange) -> AppResult<Vec<DailyReturns>>;
}
