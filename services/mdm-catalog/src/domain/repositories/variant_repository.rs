use async_trait::async_trait;
use softwear_common::{Pagination, UserId};
use softwear_errors::AppResult;

use super::ListFilter;
use crate::domain::entities::{ProductOption, Variant, VariantDraft};
use crate::domain::enums::RecordScope;

/// 款式仓储，搜索覆盖款式名与商品名
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VariantRepository: Send + Sync {
    /// 列表中的尺码与颜色只带名称
    async fn list(
        &self,
        owner: UserId,
        filter: &ListFilter,
        pagination: Pagination,
    ) -> AppResult<Vec<Variant>>;

    async fn count(&self, owner: UserId, filter: &ListFilter) -> AppResult<u64>;

    async fn find(&self, owner: UserId, id: i32, scope: RecordScope) -> AppResult<Option<Variant>>;

    /// 写入款式及其尺码、颜色关联（同一事务）
    async fn insert(&self, owner: UserId, draft: &VariantDraft) -> AppResult<i32>;

    /// 更新款式并整体替换关联（同一事务）
    async fn update(&self, owner: UserId, id: i32, draft: &VariantDraft) -> AppResult<bool>;

    async fn set_archived(&self, owner: UserId, id: i32, archived: bool) -> AppResult<bool>;

    /// 在用商品，按名称排序
    async fn active_products(&self, owner: UserId) -> AppResult<Vec<ProductOption>>;
}
