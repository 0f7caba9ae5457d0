//! 订阅仓储的 PostgreSQL 实现

use async_trait::async_trait;
use rust_decimal::Decimal;
use softwear_adapter_postgres::{db_error, push_date_range, push_page, to_count, utc_date};
use softwear_common::{DateRange, Pagination, UserId};
use softwear_errors::AppResult;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use tracing::debug;

use crate::domain::{
    AdminFeeRecord, AdminFeeSummary, SellerSubscription, SubscriptionPlan, SubscriptionRepository,
    SubscriptionTransaction, TransactionFilter, TransactionType, calculate_admin_fee,
};

use super::rows::{PlanRow, SubscriptionRow, SummaryRow, TransactionRow};

const PLAN_COLUMNS: &str = r#"
    id, name, code, description, price, admin_fee_percentage,
    has_stock_clerk_access, has_cashier_access, has_accounting_access,
    has_full_reports_access, display_order, is_active, created_at
"#;

const SUBSCRIPTION_SELECT: &str = r#"
    SELECT ss.id, ss.seller_user_id, ss.plan_id, sp.name AS plan_name, sp.code AS plan_code,
           sp.admin_fee_percentage, ss.start_date, ss.end_date, ss.status,
           ss.last_payment_date, ss.next_billing_date, ss.previous_plan_id,
           pp.name AS previous_plan_name, ss.plan_changed_at,
           sp.has_stock_clerk_access, sp.has_cashier_access, sp.has_accounting_access,
           sp.has_full_reports_access
    FROM tbl_seller_subscriptions ss
    JOIN tbl_subscription_plans sp ON sp.id = ss.plan_id
    LEFT JOIN tbl_subscription_plans pp ON pp.id = ss.previous_plan_id
"#;

const SUMMARY_SELECT: &str = r#"
    SELECT st.seller_user_id, u.name, u.fname, u.lname, u.email,
           sp.name AS plan_name, sp.admin_fee_percentage,
           COALESCE(SUM(st.sale_amount), 0) AS total_sales_amount,
           COALESCE(SUM(st.admin_fee_amount), 0) AS total_admin_fees,
           COALESCE(SUM(CASE WHEN st.status = 'Pending' THEN st.admin_fee_amount ELSE 0 END), 0) AS pending_admin_fees,
           COALESCE(SUM(CASE WHEN st.status = 'Collected' THEN st.admin_fee_amount ELSE 0 END), 0) AS collected_admin_fees,
           COUNT(*) AS total_transactions
    FROM tbl_subscription_transactions st
    JOIN tbl_seller_subscriptions ss ON ss.id = st.subscription_id
    JOIN tbl_subscription_plans sp ON sp.id = ss.plan_id
    JOIN tbl_users u ON u.id = st.seller_user_id
    WHERE st.transaction_type = 'AdminFee'
"#;

const SUMMARY_GROUP: &str =
    " GROUP BY st.seller_user_id, u.name, u.fname, u.lname, u.email, sp.name, sp.admin_fee_percentage";

pub struct PostgresSubscriptionRepository {
    pool: PgPool,
}

impl PostgresSubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &TransactionFilter) {
        if let Some(seller) = filter.seller {
            qb.push(" AND st.seller_user_id = ").push_bind(seller.0);
        }
        push_date_range(qb, &utc_date("st.created_at"), &filter.range);
        if let Some(status) = filter.status {
            qb.push(" AND st.status = ").push_bind(status.as_str());
        }
    }

    async fn load_summaries(
        &self,
        seller: Option<UserId>,
        range: &DateRange,
    ) -> AppResult<Vec<AdminFeeSummary>> {
        let mut qb = QueryBuilder::<Postgres>::new(SUMMARY_SELECT);
        if let Some(seller) = seller {
            qb.push(" AND st.seller_user_id = ").push_bind(seller.0);
        }
        push_date_range(&mut qb, &utc_date("st.created_at"), range);
        qb.push(SUMMARY_GROUP);
        qb.push(" ORDER BY total_admin_fees DESC");

        let rows = qb
            .build_query_as::<SummaryRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("汇总管理费"))?;
        Ok(rows.into_iter().map(AdminFeeSummary::from).collect())
    }
}

/// 退货批准时在同一事务内冲销管理费；卖家无有效订阅或舍入后费用为 0 时不写入
pub async fn record_admin_fee_reversal(
    tx: &mut Transaction<'static, Postgres>,
    seller: UserId,
    sale_id: i32,
    return_id: i32,
    refund_amount: Decimal,
) -> AppResult<Option<i32>> {
    let subscription: Option<(i32, Decimal)> = sqlx::query_as(
        r#"
        SELECT ss.id, sp.admin_fee_percentage
        FROM tbl_seller_subscriptions ss
        JOIN tbl_subscription_plans sp ON sp.id = ss.plan_id
        WHERE ss.seller_user_id = $1 AND ss.status = 'Active' AND ss.archived_at IS NULL
        ORDER BY ss.id DESC
        LIMIT 1
        "#,
    )
    .bind(seller.0)
    .fetch_optional(&mut **tx)
    .await
    .map_err(db_error("查询卖家订阅"))?;

    let Some((subscription_id, percentage)) = subscription else {
        return Ok(None);
    };
    if percentage <= Decimal::ZERO {
        return Ok(None);
    }

    let fee = calculate_admin_fee(refund_amount, percentage);
    if fee.is_zero() {
        return Ok(None);
    }
    let id: i32 = sqlx::query_scalar(
        r#"
        INSERT INTO tbl_subscription_transactions
            (seller_user_id, subscription_id, sale_id, return_id, transaction_type, sale_amount,
             admin_fee_percentage, admin_fee_amount, status, collected_at, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'Collected', NOW(), NOW())
        RETURNING id
        "#,
    )
    .bind(seller.0)
    .bind(subscription_id)
    .bind(sale_id)
    .bind(return_id)
    .bind(TransactionType::AdminFeeReversal.as_str())
    .bind(-refund_amount)
    .bind(percentage)
    .bind(-fee)
    .fetch_one(&mut **tx)
    .await
    .map_err(db_error("冲销管理费"))?;

    debug!(seller = seller.0, return_id, fee = %fee, "Admin fee reversed");
    Ok(Some(id))
}

#[async_trait]
impl SubscriptionRepository for PostgresSubscriptionRepository {
    async fn list_plans(&self, active_only: bool) -> AppResult<Vec<SubscriptionPlan>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM tbl_subscription_plans WHERE TRUE",
            PLAN_COLUMNS
        ));
        if active_only {
            qb.push(" AND is_active");
        }
        qb.push(" ORDER BY display_order, id");

        let rows = qb
            .build_query_as::<PlanRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("查询订阅套餐"))?;
        Ok(rows.into_iter().map(SubscriptionPlan::from).collect())
    }

    async fn find_plan(&self, plan_id: i32) -> AppResult<Option<SubscriptionPlan>> {
        let row = sqlx::query_as::<_, PlanRow>(&format!(
            "SELECT {} FROM tbl_subscription_plans WHERE id = $1",
            PLAN_COLUMNS
        ))
        .bind(plan_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("查询订阅套餐"))?;
        Ok(row.map(SubscriptionPlan::from))
    }

    async fn find_plan_by_code(&self, code: &str) -> AppResult<Option<SubscriptionPlan>> {
        let row = sqlx::query_as::<_, PlanRow>(&format!(
            "SELECT {} FROM tbl_subscription_plans WHERE code = $1 AND is_active",
            PLAN_COLUMNS
        ))
        .bind(code.to_uppercase())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("按代码查询订阅套餐"))?;
        Ok(row.map(SubscriptionPlan::from))
    }

    async fn active_subscription(&self, seller: UserId) -> AppResult<Option<SellerSubscription>> {
        let row = sqlx::query_as::<_, SubscriptionRow>(&format!(
            "{} WHERE ss.seller_user_id = $1 AND ss.status = 'Active' AND ss.archived_at IS NULL ORDER BY ss.id DESC LIMIT 1",
            SUBSCRIPTION_SELECT
        ))
        .bind(seller.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("查询卖家订阅"))?;
        row.map(SubscriptionRow::into_subscription).transpose()
    }

    async fn insert_subscription(&self, seller: UserId, plan_id: i32) -> AppResult<Option<i32>> {
        sqlx::query_scalar(
            r#"
            INSERT INTO tbl_seller_subscriptions (seller_user_id, plan_id, start_date, status, created_at)
            SELECT $1, $2, NOW(), 'Active', NOW()
            WHERE NOT EXISTS (
                SELECT 1 FROM tbl_seller_subscriptions
                WHERE seller_user_id = $1 AND status = 'Active' AND archived_at IS NULL
            )
            RETURNING id
            "#,
        )
        .bind(seller.0)
        .bind(plan_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("新增卖家订阅"))
    }

    async fn change_plan(
        &self,
        subscription_id: i32,
        new_plan_id: i32,
        previous_plan_id: i32,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE tbl_seller_subscriptions
            SET plan_id = $1, previous_plan_id = $2, plan_changed_at = NOW(), updated_at = NOW()
            WHERE id = $3 AND status = 'Active'
            "#,
        )
        .bind(new_plan_id)
        .bind(previous_plan_id)
        .bind(subscription_id)
        .execute(&self.pool)
        .await
        .map_err(db_error("更换订阅套餐"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn cancel(&self, seller: UserId) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE tbl_seller_subscriptions
            SET status = 'Cancelled', end_date = NOW(), updated_at = NOW()
            WHERE seller_user_id = $1 AND status = 'Active' AND archived_at IS NULL
            "#,
        )
        .bind(seller.0)
        .execute(&self.pool)
        .await
        .map_err(db_error("取消订阅"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn history(&self, seller: UserId) -> AppResult<Vec<SellerSubscription>> {
        let rows = sqlx::query_as::<_, SubscriptionRow>(&format!(
            "{} WHERE ss.seller_user_id = $1 AND ss.archived_at IS NULL ORDER BY ss.created_at DESC, ss.id DESC",
            SUBSCRIPTION_SELECT
        ))
        .bind(seller.0)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("查询订阅历史"))?;
        rows.into_iter().map(SubscriptionRow::into_subscription).collect()
    }

    async fn insert_admin_fee(&self, record: &AdminFeeRecord) -> AppResult<i32> {
        sqlx::query_scalar(
            r#"
            INSERT INTO tbl_subscription_transactions
                (seller_user_id, subscription_id, sale_id, transaction_type, sale_amount,
                 admin_fee_percentage, admin_fee_amount, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'Pending', NOW())
            RETURNING id
            "#,
        )
        .bind(record.seller.0)
        .bind(record.subscription_id)
        .bind(record.sale_id)
        .bind(TransactionType::AdminFee.as_str())
        .bind(record.sale_amount)
        .bind(record.admin_fee_percentage)
        .bind(record.admin_fee_amount)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("记录管理费"))
    }

    async fn list_transactions(
        &self,
        filter: &TransactionFilter,
        pagination: Pagination,
    ) -> AppResult<Vec<SubscriptionTransaction>> {
        let mut qb = QueryBuilder::<Postgres>::new(
            r#"
            SELECT st.id, st.seller_user_id, st.subscription_id, st.sale_id, s.sale_number,
                   st.return_id, st.transaction_type, st.sale_amount, st.admin_fee_percentage,
                   st.admin_fee_amount, st.status, st.collected_at, st.created_at
            FROM tbl_subscription_transactions st
            LEFT JOIN tbl_sales s ON s.id = st.sale_id
            WHERE TRUE
            "#,
        );
        Self::push_filter(&mut qb, filter);
        qb.push(" ORDER BY st.created_at DESC, st.id DESC");
        push_page(&mut qb, pagination);

        let rows = qb
            .build_query_as::<TransactionRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("查询管理费流水"))?;
        rows.into_iter().map(TransactionRow::into_transaction).collect()
    }

    async fn count_transactions(&self, filter: &TransactionFilter) -> AppResult<u64> {
        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM tbl_subscription_transactions st WHERE TRUE",
        );
        Self::push_filter(&mut qb, filter);

        let total = qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("统计管理费流水"))?;
        Ok(to_count(total))
    }

    async fn fee_summary(
        &self,
        seller: UserId,
        range: &DateRange,
    ) -> AppResult<Option<AdminFeeSummary>> {
        // 换过套餐的卖家按套餐分组，取金额最大的一组
        Ok(self.load_summaries(Some(seller), range).await?.into_iter().next())
    }

    async fn fee_summaries(&self, range: &DateRange) -> AppResult<Vec<AdminFeeSummary>> {
        self.load_summaries(None, range).await
    }

    async fn mark_collected(&self, transaction_id: i32) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE tbl_subscription_transactions
            SET status = 'Collected', collected_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND status = 'Pending'
            "#,
        )
        .bind(transaction_id)
        .execute(&self.pool)
        .await
        .map_err(db_error("标记管理费已收取"))?;
        Ok(result.rows_affected() > 0)
    }
}
