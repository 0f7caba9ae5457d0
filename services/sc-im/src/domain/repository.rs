//! 库存仓储接口

use async_trait::async_trait;
use softwear_common::{DateRange, Pagination, UserId};
use softwear_errors::AppResult;

use super::{
    AdjustmentFilter, AdjustmentOutcome, DailyQuantity, InventoryItem, InventoryStats,
    LowStockItem, MovementFilter, NewStockAdjustment, NewStockIn, NewStockOut,
    ReorderLevelUpdate, StockAdjustment, StockIn, StockInDetails, StockKey, StockOut,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InventoryRepository: Send + Sync {
    /// 只含库存大于 0 的组合，按商品、款式、尺码、颜色名排序
    async fn list(
        &self,
        seller: UserId,
        search: Option<String>,
        pagination: Pagination,
    ) -> AppResult<Vec<InventoryItem>>;

    async fn count(&self, seller: UserId, search: Option<String>) -> AppResult<u64>;

    /// 尺码、颜色按精确匹配（NULL 与 NULL 相等）
    async fn details(&self, seller: UserId, key: StockKey) -> AppResult<Option<InventoryItem>>;

    async fn current_stock(&self, seller: UserId, key: StockKey) -> AppResult<i32>;

    /// 款式不属于卖家时返回 false
    async fn set_reorder_level(&self, update: &ReorderLevelUpdate) -> AppResult<bool>;

    async fn stats(&self, seller: UserId) -> AppResult<InventoryStats>;

    /// 库存最低的在前
    async fn low_stock(&self, seller: UserId, limit: i64) -> AppResult<Vec<LowStockItem>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StockInRepository: Send + Sync {
    /// 新记录在前
    async fn list(&self, filter: &MovementFilter, pagination: Pagination) -> AppResult<Vec<StockIn>>;

    async fn count(&self, filter: &MovementFilter) -> AppResult<u64>;

    async fn details(&self, id: i32, filter: &MovementFilter) -> AppResult<Option<StockInDetails>>;

    async fn insert(&self, stock_in: &NewStockIn) -> AppResult<i32>;

    /// 只返回有记录的日期
    async fn daily(&self, seller: UserId, range: &DateRange) -> AppResult<Vec<DailyQuantity>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StockOutRepository: Send + Sync {
    async fn list(&self, filter: &MovementFilter, pagination: Pagination) -> AppResult<Vec<StockOut>>;

    async fn count(&self, filter: &MovementFilter) -> AppResult<u64>;

    async fn details(&self, id: i32, filter: &MovementFilter) -> AppResult<Option<StockOut>>;

    async fn insert(&self, stock_out: &NewStockOut) -> AppResult<i32>;

    async fn daily(&self, seller: UserId, range: &DateRange) -> AppResult<Vec<DailyQuantity>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StockAdjustmentRepository: Send + Sync {
    async fn list(
        &self,
        filter: &AdjustmentFilter,
        pagination: Pagination,
    ) -> AppResult<Vec<StockAdjustment>>;

    async fn count(&self, filter: &AdjustmentFilter) -> AppResult<u64>;

    async fn details(&self, seller: UserId, id: i32) -> AppResult<Option<StockAdjustment>>;

    /// 校验款式归属，减少时在同一事务内校验当前库存
    async fn insert(&self, adjustment: &NewStockAdjustment) -> AppResult<AdjustmentOutcome>;
}
