//! 订阅与管理费业务处理

use std::sync::Arc;

use rust_decimal::Decimal;
use softwear_common::{DateRange, PagedResult, Pagination, UserId};
use softwear_errors::{AppError, AppResult};
use tracing::{debug, info};

use crate::domain::{
    AdminFeeRecord, AdminFeeSummary, SellerSubscription, SubscriptionPlan, SubscriptionRepository,
    SubscriptionTransaction, TransactionFilter, calculate_admin_fee,
};

const SELLER_ROLE: &str = "seller";

pub struct ServiceHandler {
    repo: Arc<dyn SubscriptionRepository>,
}

impl ServiceHandler {
    pub fn new(repo: Arc<dyn SubscriptionRepository>) -> Self {
        Self { repo }
    }

    // ====== 套餐 ======

    pub async fn plans(&self, active_only: bool) -> AppResult<Vec<SubscriptionPlan>> {
        self.repo.list_plans(active_only).await
    }

    pub async fn plan(&self, plan_id: i32) -> AppResult<Option<SubscriptionPlan>> {
        self.repo.find_plan(plan_id).await
    }

    pub async fn plan_by_code(&self, code: &str) -> AppResult<Option<SubscriptionPlan>> {
        self.repo.find_plan_by_code(code.trim()).await
    }

    // ====== 订阅 ======

    pub async fn seller_subscription(&self, seller: UserId) -> AppResult<Option<SellerSubscription>> {
        self.repo.active_subscription(seller).await
    }

    /// 已有有效订阅时返回 None
    pub async fn create_subscription(&self, seller: UserId, plan_id: i32) -> AppResult<Option<i32>> {
        self.require_plan(plan_id).await?;
        let id = self.repo.insert_subscription(seller, plan_id).await?;
        match id {
            Some(id) => info!(seller = seller.0, plan_id, subscription_id = id, "Subscription created"),
            None => debug!(seller = seller.0, "Seller already has an active subscription"),
        }
        Ok(id)
    }

    /// 没有订阅则新建；已是该套餐直接返回 true
    pub async fn change_plan(&self, seller: UserId, new_plan_id: i32) -> AppResult<bool> {
        self.require_plan(new_plan_id).await?;
        let Some(current) = self.repo.active_subscription(seller).await? else {
            return Ok(self.repo.insert_subscription(seller, new_plan_id).await?.is_some());
        };
        if current.plan_id == new_plan_id {
            return Ok(true);
        }

        let changed = self
            .repo
            .change_plan(current.id, new_plan_id, current.plan_id)
            .await?;
        if changed {
            info!(
                seller = seller.0,
                from = current.plan_id,
                to = new_plan_id,
                "Subscription plan changed"
            );
        }
        Ok(changed)
    }

    pub async fn cancel_subscription(&self, seller: UserId) -> AppResult<bool> {
        let cancelled = self.repo.cancel(seller).await?;
        if cancelled {
            info!(seller = seller.0, "Subscription cancelled");
        }
        Ok(cancelled)
    }

    pub async fn has_active_subscription(&self, seller: UserId) -> AppResult<bool> {
        Ok(self.repo.active_subscription(seller).await?.is_some())
    }

    pub async fn can_access_module(&self, seller: UserId, module_name: &str) -> AppResult<bool> {
        Ok(self
            .repo
            .active_subscription(seller)
            .await?
            .is_some_and(|s| s.can_access(module_name)))
    }

    /// 只有卖家需要有效订阅
    pub async fn validate_on_login(&self, user: UserId, role: &str) -> AppResult<bool> {
        if !role.trim().eq_ignore_ascii_case(SELLER_ROLE) {
            return Ok(true);
        }
        self.has_active_subscription(user).await
    }

    pub async fn subscription_history(&self, seller: UserId) -> AppResult<Vec<SellerSubscription>> {
        self.repo.history(seller).await
    }

    // ====== 管理费 ======

    pub async fn admin_fee_percentage(&self, seller: UserId) -> AppResult<Decimal> {
        Ok(self
            .repo
            .active_subscription(seller)
            .await?
            .map(|s| s.admin_fee_percentage)
            .unwrap_or(Decimal::ZERO))
    }

    pub async fn calculate_admin_fee(&self, seller: UserId, amount: Decimal) -> AppResult<Decimal> {
        let percentage = self.admin_fee_percentage(seller).await?;
        Ok(calculate_admin_fee(amount, percentage))
    }

    /// 记录一笔销售的管理费；无订阅或舍入后费用为 0 时不记录
    pub async fn record_admin_fee(
        &self,
        seller: UserId,
        sale_id: i32,
        sale_amount: Decimal,
    ) -> AppResult<Option<i32>> {
        let Some(subscription) = self.repo.active_subscription(seller).await? else {
            return Ok(None);
        };
        if subscription.admin_fee_percentage <= Decimal::ZERO {
            return Ok(None);
        }
        let admin_fee_amount = calculate_admin_fee(sale_amount, subscription.admin_fee_percentage);
        if admin_fee_amount.is_zero() {
            debug!(seller = seller.0, sale_id, "Admin fee rounds to zero, not recorded");
            return Ok(None);
        }

        let record = AdminFeeRecord {
            seller,
            subscription_id: subscription.id,
            sale_id,
            sale_amount,
            admin_fee_percentage: subscription.admin_fee_percentage,
            admin_fee_amount,
        };
        let id = self.repo.insert_admin_fee(&record).await?;
        debug!(
            seller = seller.0,
            sale_id,
            fee = %record.admin_fee_amount,
            "Admin fee recorded"
        );
        Ok(Some(id))
    }

    pub async fn transactions(
        &self,
        filter: &TransactionFilter,
        pagination: Pagination,
    ) -> AppResult<PagedResult<SubscriptionTransaction>> {
        let items = self.repo.list_transactions(filter, pagination).await?;
        let total = self.repo.count_transactions(filter).await?;
        Ok(PagedResult::new(items, total, &pagination))
    }

    pub async fn count_transactions(&self, filter: &TransactionFilter) -> AppResult<u64> {
        self.repo.count_transactions(filter).await
    }

    pub async fn fee_summary(
        &self,
        seller: UserId,
        range: &DateRange,
    ) -> AppResult<Option<AdminFeeSummary>> {
        self.repo.fee_summary(seller, range).await
    }

    pub async fn fee_summaries(&self, range: &DateRange) -> AppResult<Vec<AdminFeeSummary>> {
        self.repo.fee_summaries(range).await
    }

    pub async fn mark_collected(&self, transaction_id: i32) -> AppResult<bool> {
        let collected = self.repo.mark_collected(transaction_id).await?;
        if collected {
            info!(transaction_id, "Admin fee collected");
        }
        Ok(collected)
    }

    async fn require_plan(&self, plan_id: i32) -> AppResult<SubscriptionPlan> {
        self.repo
            .find_plan(plan_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("订阅套餐 {} 不存在", plan_id)))
    }
}
