use async_trait::async_trait;
use softwear_common::{Pagination, UserId};
use softwear_errors::AppResult;

use super::ListFilter;
use crate::domain::entities::{Product, ProductDraft};
use crate::domain::enums::RecordScope;

/// 商品仓储，搜索覆盖商品名、描述与分类名
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn list(
        &self,
        owner: UserId,
        filter: &ListFilter,
        pagination: Pagination,
    ) -> AppResult<Vec<Product>>;

    async fn count(&self, owner: UserId, filter: &ListFilter) -> AppResult<u64>;

    async fn find(&self, owner: UserId, id: i32, scope: RecordScope) -> AppResult<Option<Product>>;

    async fn insert(&self, owner: UserId, draft: &ProductDraft) -> AppResult<i32>;

    /// `draft.image` 为 None 时保留原图
    async fn update(&self, owner: UserId, id: i32, draft: &ProductDraft) -> AppResult<bool>;

    /// 归档或恢复商品及其款式
    async fn set_archived(&self, owner: UserId, id: i32, archived: bool) -> AppResult<bool>;
}
