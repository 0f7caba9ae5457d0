//! 订阅仓储接口

use async_trait::async_trait;
use softwear_common::{DateRange, Pagination, UserId};
use softwear_errors::AppResult;

use super::{
    AdminFeeRecord, AdminFeeSummary, SellerSubscription, SubscriptionPlan,
    SubscriptionTransaction, TransactionFilter,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// 按 display_order 排序
    async fn list_plans(&self, active_only: bool) -> AppResult<Vec<SubscriptionPlan>>;

    async fn find_plan(&self, plan_id: i32) -> AppResult<Option<SubscriptionPlan>>;

    /// 代码不区分大小写，只查启用的套餐
    async fn find_plan_by_code(&self, code: &str) -> AppResult<Option<SubscriptionPlan>>;

    async fn active_subscription(&self, seller: UserId) -> AppResult<Option<SellerSubscription>>;

    /// 已有有效订阅时不写入并返回 None
    async fn insert_subscription(&self, seller: UserId, plan_id: i32) -> AppResult<Option<i32>>;

    /// 更换套餐并记录原套餐与更换时间
    async fn change_plan(
        &self,
        subscription_id: i32,
        new_plan_id: i32,
        previous_plan_id: i32,
    ) -> AppResult<bool>;

    async fn cancel(&self, seller: UserId) -> AppResult<bool>;

    /// 新订阅在前
    async fn history(&self, seller: UserId) -> AppResult<Vec<SellerSubscription>>;

    async fn insert_admin_fee(&self, record: &AdminFeeRecord) -> AppResult<i32>;

    async fn list_transactions(
        &self,
        filter: &TransactionFilter,
        pagination: Pagination,
    ) -> AppResult<Vec<SubscriptionTransaction>>;

    async fn count_transactions(&self, filter: &TransactionFilter) -> AppResult<u64>;

    async fn fee_summary(&self, seller: UserId, range: &DateRange)
    -> AppResult<Option<AdminFeeSummary>>;

    /// 按管理费总额倒序
    async fn fee_summaries(&self, range: &DateRange) -> AppResult<Vec<AdminFeeSummary>>;

    /// 仅 Pending → Collected
    async fn mark_collected(&self, transaction_id: i32) -> AppResult<bool>;
}
