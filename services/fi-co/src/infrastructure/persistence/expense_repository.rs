//! 费用的 PostgreSQL 实现

use async_trait::async_trait;
use rust_decimal::Decimal;
use softwear_adapter_postgres::{db_error, push_date_range, push_page, push_search, to_count};
use softwear_common::{DateRange, Pagination, ReceiptImage, UserId};
use softwear_errors::AppResult;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;

use crate::domain::{Expense, ExpenseDraft, ExpenseFilter, ExpenseRepository, ExpenseTypeTotal};

use super::rows::{ExpenseRow, ExpenseTypeTotalRow};

const SEARCH_COLUMNS: [&str; 2] = ["e.expense_type", "e.description"];

const EXPENSE_COLUMNS: &str = r#"
    SELECT e.id, e.expense_type, e.amount, e.description, e.expense_date,
           e.receipt_image, e.receipt_content_type, e.created_by,
           u.name AS creator_name, u.fname AS creator_fname, u.lname AS creator_lname,
           u.email AS creator_email, e.created_at, e.updated_at, e.archived_at
    FROM tbl_expenses e
    JOIN tbl_users u ON u.id = e.created_by"#;

pub struct PostgresExpenseRepository {
    pool: PgPool,
}

impl PostgresExpenseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn push_conditions(qb: &mut QueryBuilder<'_, Postgres>, seller: UserId, filter: &ExpenseFilter) {
        qb.push(" WHERE e.seller_user_id = ").push_bind(seller.0);
        qb.push(if filter.archived {
            " AND e.archived_at IS NOT NULL"
        } else {
            " AND e.archived_at IS NULL"
        });
        if let Some(expense_type) = filter.expense_type {
            qb.push(" AND e.expense_type = ").push_bind(expense_type.as_str());
        }
        push_search(qb, &SEARCH_COLUMNS, filter.search.as_deref());
        push_date_range(qb, "e.expense_date", &filter.range);
    }

    fn list_query(
        seller: UserId,
        filter: &ExpenseFilter,
        pagination: Pagination,
    ) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::<Postgres>::new(EXPENSE_COLUMNS);
        Self::push_conditions(&mut qb, seller, filter);
        qb.push(if filter.archived {
            " ORDER BY e.archived_at DESC, e.id DESC"
        } else {
            " ORDER BY e.expense_date DESC, e.created_at DESC, e.id DESC"
        });
        push_page(&mut qb, pagination);
        qb
    }

    fn active_in_range(
        select: &str,
        seller: UserId,
        range: &DateRange,
    ) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::<Postgres>::new(select);
        qb.push(" FROM tbl_expenses e WHERE e.archived_at IS NULL AND e.seller_user_id = ")
            .push_bind(seller.0);
        push_date_range(&mut qb, "e.expense_date", range);
        qb
    }
}

#[async_trait]
impl ExpenseRepository for PostgresExpenseRepository {
    async fn list(
        &self,
        seller: UserId,
        filter: &ExpenseFilter,
        pagination: Pagination,
    ) -> AppResult<Vec<Expense>> {
        let rows = Self::list_query(seller, filter, pagination)
            .build_query_as::<ExpenseRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("查询费用列表"))?;
        rows.into_iter().map(Expense::try_from).collect()
    }

    async fn count(&self, seller: UserId, filter: &ExpenseFilter) -> AppResult<u64> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM tbl_expenses e");
        Self::push_conditions(&mut qb, seller, filter);
        let total = qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("统计费用数量"))?;
        Ok(to_count(total))
    }

    async fn find(&self, seller: UserId, id: i32, archived: bool) -> AppResult<Option<Expense>> {
        let mut qb = QueryBuilder::<Postgres>::new(EXPENSE_COLUMNS);
        Self::push_conditions(
            &mut qb,
            seller,
            &ExpenseFilter {
                archived,
                ..Default::default()
            },
        );
        qb.push(" AND e.id = ").push_bind(id);

        let row = qb
            .build_query_as::<ExpenseRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("查询费用详情"))?;
        row.map(Expense::try_from).transpose()
    }

    async fn insert(
        &self,
        seller: UserId,
        created_by: UserId,
        draft: &ExpenseDraft,
    ) -> AppResult<i32> {
        let (receipt, receipt_type) = ReceiptImage::columns(draft.receipt.as_ref());
        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO tbl_expenses
                (expense_type, amount, description, expense_date, receipt_image,
                 receipt_content_type, created_by, seller_user_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW())
            RETURNING id
            "#,
        )
        .bind(draft.expense_type.as_str())
        .bind(draft.amount)
        .bind(&draft.description)
        .bind(draft.expense_date)
        .bind(receipt)
        .bind(receipt_type)
        .bind(created_by.0)
        .bind(seller.0)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("新增费用"))?;
        Ok(id)
    }

    async fn update(&self, seller: UserId, id: i32, draft: &ExpenseDraft) -> AppResult<bool> {
        let (receipt, receipt_type) = ReceiptImage::columns(draft.receipt.as_ref());
        let result = sqlx::query(
            r#"
            UPDATE tbl_expenses
            SET expense_type = $1, amount = $2, description = $3, expense_date = $4,
                receipt_image = $5, receipt_content_type = $6, updated_at = NOW()
            WHERE id = $7 AND seller_user_id = $8 AND archived_at IS NULL
            "#,
        )
        .bind(draft.expense_type.as_str())
        .bind(draft.amount)
        .bind(&draft.description)
        .bind(draft.expense_date)
        .bind(receipt)
        .bind(receipt_type)
        .bind(id)
        .bind(seller.0)
        .execute(&self.pool)
        .await
        .map_err(db_error("更新费用"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_archived(&self, seller: UserId, id: i32, archived: bool) -> AppResult<bool> {
        let sql = if archived {
            r#"
            UPDATE tbl_expenses SET archived_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND seller_user_id = $2 AND archived_at IS NULL
            "#
        } else {
            r#"
            UPDATE tbl_expenses SET archived_at = NULL, updated_at = NOW()
            WHERE id = $1 AND seller_user_id = $2 AND archived_at IS NOT NULL
            "#
        };
        let result = sqlx::query(sql)
            .bind(id)
            .bind(seller.0)
            .execute(&self.pool)
            .await
            .map_err(db_error("更新费用归档状态"))?;

        let changed = result.rows_affected() > 0;
        debug!(id, archived, changed, "Expense archive state changed");
        Ok(changed)
    }

    async fn total(&self, seller: UserId, range: &DateRange) -> AppResult<Decimal> {
        Self::active_in_range("SELECT COALESCE(SUM(e.amount), 0)", seller, range)
            .build_query_scalar::<Decimal>()
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("统计费用合计"))
    }

    async fn totals_by_type(
        &self,
        seller: UserId,
        range: &DateRange,
    ) -> AppResult<Vec<ExpenseTypeTotal>> {
        let mut qb = Self::active_in_range(
            "SELECT e.expense_type, COUNT(*) AS count, COALESCE(SUM(e.amount), 0) AS total",
            seller,
            range,
        );
        qb.push(" GROUP BY e.expense_type ORDER BY total DESC, e.expense_type");

        let rows = qb
            .build_query_as::<ExpenseTypeTotalRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("按类型统计费用"))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
