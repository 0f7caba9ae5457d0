//! 供应商仓储接口

use async_trait::async_trait;
use softwear_common::{Pagination, UserId};
use softwear_errors::AppResult;

use super::{Supplier, SupplierDraft, SupplierOption, SupplierStatus};

/// 列表过滤条件
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SupplierFilter {
    /// 匹配公司名、联系人、邮箱、电话
    pub search: Option<String>,
    pub status: Option<SupplierStatus>,
    pub archived: bool,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SupplierRepository: Send + Sync {
    /// 在用列表按创建时间倒序，归档列表按归档时间倒序
    async fn list(
        &self,
        owner: UserId,
        filter: &SupplierFilter,
        pagination: Pagination,
    ) -> AppResult<Vec<Supplier>>;

    async fn count(&self, owner: UserId, filter: &SupplierFilter) -> AppResult<u64>;

    /// 带地址的详情
    async fn find(&self, owner: UserId, id: i32, archived: bool) -> AppResult<Option<Supplier>>;

    /// 供应商与地址在同一事务中写入
    async fn insert(&self, owner: UserId, draft: &SupplierDraft) -> AppResult<i32>;

    /// 更新在用供应商，地址存在则修改否则新增
    async fn update(&self, owner: UserId, id: i32, draft: &SupplierDraft) -> AppResult<bool>;

    /// 归档或恢复，地址随之归档或恢复
    async fn set_archived(&self, owner: UserId, id: i32, archived: bool) -> AppResult<bool>;

    /// 状态为 Active 且未归档，按公司名排序
    async fn active_options(&self, owner: UserId) -> AppResult<Vec<SupplierOption>>;
}
