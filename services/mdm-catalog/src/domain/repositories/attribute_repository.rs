use async_trait::async_trait;
use softwear_common::{Pagination, UserId};
use softwear_errors::AppResult;

use super::ListFilter;
use crate::domain::entities::{AttributeDraft, AttributeOption, CatalogAttribute};
use crate::domain::enums::{AttributeKind, RecordScope};

/// 分类 / 颜色 / 尺码仓储，所有操作都限定在卖家范围内
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AttributeRepository: Send + Sync {
    /// 按创建时间倒序（归档视图按归档时间倒序）
    async fn list(
        &self,
        kind: AttributeKind,
        owner: UserId,
        filter: &ListFilter,
        pagination: Pagination,
    ) -> AppResult<Vec<CatalogAttribute>>;

    async fn count(
        &self,
        kind: AttributeKind,
        owner: UserId,
        filter: &ListFilter,
    ) -> AppResult<u64>;

    async fn find(
        &self,
        kind: AttributeKind,
        owner: UserId,
        id: i32,
        scope: RecordScope,
    ) -> AppResult<Option<CatalogAttribute>>;

    async fn insert(
        &self,
        kind: AttributeKind,
        owner: UserId,
        draft: &AttributeDraft,
    ) -> AppResult<i32>;

    /// 只修改在用记录，返回是否命中
    async fn update(
        &self,
        kind: AttributeKind,
        owner: UserId,
        id: i32,
        draft: &AttributeDraft,
    ) -> AppResult<bool>;

    /// 归档或恢复；分类会连带其商品与款式
    async fn set_archived(
        &self,
        kind: AttributeKind,
        owner: UserId,
        id: i32,
        archived: bool,
    ) -> AppResult<bool>;

    /// 在用记录，按名称排序
    async fn options(&self, kind: AttributeKind, owner: UserId) -> AppResult<Vec<AttributeOption>>;
}
