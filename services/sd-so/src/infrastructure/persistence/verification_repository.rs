//! 每日销售核对的 PostgreSQL 实现
//!
//! 汇总按 (收银员, UTC 日期) 分组；退货归到原销售所在的日期。

use async_trait::async_trait;
use chrono::NaiveDate;
use softwear_adapter_postgres::{
    db_error, push_date_range, push_page, push_search, to_count, utc_date,
};
use softwear_common::{Pagination, UserId};
use softwear_errors::AppResult;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::domain::{
    DailySalesDetails, DailySalesSummary, VerificationDecision, VerificationFilter,
    VerificationRepository, VerificationStatus,
};

use super::rows::{DayReturnRow, MethodTotalRow, SaleReportRow, SummaryRow};
use super::sale_repository::{FROM_SALE_REPORTS, SALE_REPORT_COLUMNS};

const CASHIER_SEARCH_COLUMNS: [&str; 3] = ["u.name", "u.fname", "u.lname"];

/// 汇总查询的范围
#[derive(Debug, Clone, Copy)]
enum SummaryScope {
    /// 未核对或待核对
    Pending,
    Report(Option<VerificationStatus>),
    Day(UserId, NaiveDate),
}

pub struct PostgresVerificationRepository {
    pool: PgPool,
}

impl PostgresVerificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn push_sales_scope(
        qb: &mut QueryBuilder<'_, Postgres>,
        filter: &VerificationFilter,
        scope: SummaryScope,
    ) {
        let sale_date = utc_date("s.created_at");
        qb.push(" AND u.archived_at IS NULL AND u.user_id = ")
            .push_bind(filter.seller.0);
        if let SummaryScope::Day(cashier, day) = scope {
            qb.push(" AND s.user_id = ")
                .push_bind(cashier.0)
                .push(" AND ")
                .push(&sale_date)
                .push(" = ")
                .push_bind(day);
        }
        push_date_range(qb, &sale_date, &filter.range);
    }

    /// 汇总 SQL，不含排序分页
    fn push_summary(
        qb: &mut QueryBuilder<'_, Postgres>,
        filter: &VerificationFilter,
        scope: SummaryScope,
    ) {
        let sale_date = utc_date("s.created_at");
        qb.push("WITH daily_sales AS (SELECT s.user_id AS cashier_id, ");
        qb.push(&sale_date).push(
            r#" AS sale_date,
                   COUNT(*) AS transaction_count,
                   COALESCE(SUM(s.amount), 0) AS total_sales,
                   COALESCE(SUM(CASE
                       WHEN p.payment_method = 'Cash' THEN p.amount_paid - p.change_given
                       WHEN p.payment_method IS NULL AND s.payment_type = 'Cash' THEN s.amount
                       ELSE 0 END), 0) AS cash_amount,
                   COALESCE(SUM(CASE
                       WHEN COALESCE(p.payment_method, s.payment_type) = 'GCash' THEN s.amount
                       ELSE 0 END), 0) AS gcash_amount
            FROM tbl_sales s
            JOIN tbl_users u ON u.id = s.user_id
            LEFT JOIN tbl_payments p ON p.sale_id = s.id AND p.archived_at IS NULL
            WHERE s.archived_at IS NULL AND s.status = 'Completed'"#,
        );
        Self::push_sales_scope(qb, filter, scope);
        qb.push(" GROUP BY 1, 2), daily_returns AS (SELECT s.user_id AS cashier_id, ");
        qb.push(&sale_date).push(
            r#" AS sale_date,
                   COUNT(DISTINCT r.id) AS return_count,
                   COALESCE(SUM(ri.quantity * si.price), 0) AS total_returns
            FROM tbl_returns r
            JOIN tbl_sales s ON s.id = r.sale_id
            JOIN tbl_users u ON u.id = s.user_id
            JOIN tbl_return_items ri ON ri.return_id = r.id
            JOIN tbl_sales_items si ON si.id = ri.sale_item_id
            WHERE r.archived_at IS NULL AND r.status = 'Approved' AND s.archived_at IS NULL
              AND ri.archived_at IS NULL AND si.archived_at IS NULL"#,
        );
        Self::push_sales_scope(qb, filter, scope);
        qb.push(
            r#" GROUP BY 1, 2)
            SELECT ds.cashier_id, u.name AS cashier_name, u.fname AS cashier_fname,
                   u.lname AS cashier_lname, u.email AS cashier_email, ds.sale_date,
                   ds.transaction_count, ds.total_sales, ds.cash_amount, ds.gcash_amount,
                   COALESCE(dr.return_count, 0) AS return_count,
                   COALESCE(dr.total_returns, 0) AS total_returns,
                   COALESCE(dsv.status, 'Pending') AS status, dsv.updated_at AS verified_at,
                   vu.name AS verifier_name, vu.fname AS verifier_fname,
                   vu.lname AS verifier_lname, vu.email AS verifier_email
            FROM daily_sales ds
            JOIN tbl_users u ON u.id = ds.cashier_id
            LEFT JOIN daily_returns dr ON dr.cashier_id = ds.cashier_id AND dr.sale_date = ds.sale_date
            LEFT JOIN tbl_daily_sales_verifications dsv
                   ON dsv.cashier_user_id = ds.cashier_id AND dsv.sale_date = ds.sale_date
                  AND dsv.archived_at IS NULL AND dsv.seller_user_id = "#,
        )
        .push_bind(filter.seller.0)
        .push(" LEFT JOIN tbl_users vu ON vu.id = dsv.verified_by WHERE TRUE");

        match scope {
            SummaryScope::Pending => {
                qb.push(" AND (dsv.status IS NULL OR dsv.status = 'Pending')");
            }
            SummaryScope::Report(Some(status)) => {
                qb.push(" AND COALESCE(dsv.status, 'Pending') = ")
                    .push_bind(status.as_str());
            }
            SummaryScope::Report(None) | SummaryScope::Day(..) => {}
        }
        push_search(qb, &CASHIER_SEARCH_COLUMNS, filter.search.as_deref());
    }

    async fn summaries(
        &self,
        filter: &VerificationFilter,
        scope: SummaryScope,
        pagination: Option<Pagination>,
    ) -> AppResult<Vec<DailySalesSummary>> {
        let mut qb = QueryBuilder::<Postgres>::new("");
        Self::push_summary(&mut qb, filter, scope);
        qb.push(" ORDER BY ds.sale_date DESC, u.name, u.fname, ds.cashier_id");
        if let Some(pagination) = pagination {
            push_page(&mut qb, pagination);
        }

        let rows = qb
            .build_query_as::<SummaryRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("查询每日销售汇总"))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn belongs_to(&self, cashier: UserId, seller: UserId) -> AppResult<bool> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM tbl_users WHERE id = $1 AND user_id = $2 AND archived_at IS NULL)",
        )
        .bind(cashier.0)
        .bind(seller.0)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("校验收银员归属"))
    }
}

#[async_trait]
impl VerificationRepository for PostgresVerificationRepository {
    async fn pending(
        &self,
        filter: &VerificationFilter,
        pagination: Pagination,
    ) -> AppResult<Vec<DailySalesSummary>> {
        self.summaries(filter, SummaryScope::Pending, Some(pagination))
            .await
    }

    async fn count_pending(&self, filter: &VerificationFilter) -> AppResult<u64> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM (");
        Self::push_summary(&mut qb, filter, SummaryScope::Pending);
        qb.push(") pending");
        let total = qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("统计待核对日期"))?;
        Ok(to_count(total))
    }

    async fn details(
        &self,
        seller: UserId,
        cashier: UserId,
        sale_date: NaiveDate,
    ) -> AppResult<Option<DailySalesDetails>> {
        if !self.belongs_to(cashier, seller).await? {
            return Ok(None);
        }

        let filter = VerificationFilter::new(seller);
        let Some(summary) = self
            .summaries(&filter, SummaryScope::Day(cashier, sale_date), None)
            .await?
            .into_iter()
            .next()
        else {
            return Ok(None);
        };

        let sale_date_expr = utc_date("s.created_at");

        let mut qb = QueryBuilder::<Postgres>::new(SALE_REPORT_COLUMNS);
        qb.push(FROM_SALE_REPORTS)
            .push(" AND s.user_id = ")
            .push_bind(cashier.0)
            .push(" AND ")
            .push(&sale_date_expr)
            .push(" = ")
            .push_bind(sale_date)
            .push(" ORDER BY s.created_at DESC, s.id DESC");
        let sales: Vec<SaleReportRow> = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("查询当日销售"))?;

        let returns: Vec<DayReturnRow> = sqlx::query_as(&format!(
            r#"
            SELECT r.id, r.return_number, r.sale_id, s.sale_number, r.reason, r.status, r.created_at
            FROM tbl_returns r
            JOIN tbl_sales s ON s.id = r.sale_id
            WHERE r.archived_at IS NULL AND r.status = 'Approved' AND s.archived_at IS NULL
              AND s.user_id = $1 AND {} = $2
            ORDER BY r.created_at DESC, r.id DESC
            "#,
            sale_date_expr
        ))
        .bind(cashier.0)
        .bind(sale_date)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("查询当日退货"))?;

        let breakdown: Vec<MethodTotalRow> = sqlx::query_as(&format!(
            r#"
            SELECT p.payment_method, COUNT(*) AS count, COALESCE(SUM(s.amount), 0) AS total_amount
            FROM tbl_sales s
            JOIN tbl_payments p ON p.sale_id = s.id AND p.archived_at IS NULL
            WHERE s.archived_at IS NULL AND s.status = 'Completed'
              AND s.user_id = $1 AND {} = $2
            GROUP BY p.payment_method
            ORDER BY total_amount DESC
            "#,
            sale_date_expr
        ))
        .bind(cashier.0)
        .bind(sale_date)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("统计当日收款方式"))?;

        Ok(Some(DailySalesDetails {
            summary,
            sales: sales.into_iter().map(Into::into).collect(),
            returns: returns.into_iter().map(Into::into).collect(),
            payment_breakdown: breakdown.into_iter().map(Into::into).collect(),
        }))
    }

    async fn decide(&self, decision: &VerificationDecision) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO tbl_daily_sales_verifications
                (cashier_user_id, sale_date, status, verified_by, seller_user_id, created_at, updated_at)
            SELECT u.id, $2, $3, $4, $5, NOW(), NOW()
            FROM tbl_users u
            WHERE u.id = $1 AND u.user_id = $5 AND u.archived_at IS NULL
            ON CONFLICT (cashier_user_id, sale_date) DO UPDATE
            SET status = EXCLUDED.status,
                verified_by = EXCLUDED.verified_by,
                seller_user_id = EXCLUDED.seller_user_id,
                updated_at = NOW(),
                archived_at = NULL
            "#,
        )
        .bind(decision.cashier.0)
        .bind(decision.sale_date)
        .bind(decision.status.as_str())
        .bind(decision.verified_by.0)
        .bind(decision.seller.0)
        .execute(&self.pool)
        .await
        .map_err(db_error("保存每日核对结果"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn report(&self, filter: &VerificationFilter) -> AppResult<Vec<DailySalesSummary>> {
        self.summaries(filter, SummaryScope::Report(filter.status), None)
            .await
    }
}
