//! 操作日志仓储

use async_trait::async_trait;
use softwear_adapter_postgres::{db_error, push_date_range, push_page, push_search, to_count, utc_date};
use softwear_common::{Pagination, UserId};
use softwear_errors::AppResult;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::domain::{HistoryEntry, HistoryFilter, HistoryRepository, NewHistoryEntry};

use super::rows::HistoryRow;

const SEARCH_COLUMNS: [&str; 3] = ["h.description", "h.status", "h.module"];

pub struct PostgresHistoryRepository {
    pool: PgPool,
}

impl PostgresHistoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &HistoryFilter) {
        if let Some(user) = filter.user_id {
            qb.push(" AND h.user_id = ").push_bind(user.0);
        }
        push_search(qb, &SEARCH_COLUMNS, filter.search.as_deref());
        if let Some(status) = &filter.status {
            qb.push(" AND h.status = ").push_bind(status.clone());
        }
        if let Some(module) = &filter.module {
            qb.push(" AND h.module = ").push_bind(module.clone());
        }
        push_date_range(qb, &utc_date("h.ts"), &filter.range);
    }

    async fn distinct(&self, column: &str, user: Option<UserId>) -> AppResult<Vec<String>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT DISTINCT {0} FROM tbl_histories WHERE {0} IS NOT NULL AND {0} <> ''",
            column
        ));
        if let Some(user) = user {
            qb.push(" AND user_id = ").push_bind(user.0);
        }
        qb.push(format!(" ORDER BY {}", column));

        qb.build_query_scalar::<String>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error(format!("查询日志{}", column)))
    }
}

#[async_trait]
impl HistoryRepository for PostgresHistoryRepository {
    async fn insert(&self, entry: &NewHistoryEntry) -> AppResult<i32> {
        sqlx::query_scalar(
            r#"
            INSERT INTO tbl_histories (user_id, status, module, description, ts)
            VALUES ($1, $2, $3, $4, COALESCE($5, NOW()))
            RETURNING id
            "#,
        )
        .bind(entry.user_id.0)
        .bind(&entry.status)
        .bind(&entry.module)
        .bind(&entry.description)
        .bind(entry.ts)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("写入操作日志"))
    }

    async fn list(&self, filter: &HistoryFilter, pagination: Pagination) -> AppResult<Vec<HistoryEntry>> {
        let mut qb = QueryBuilder::<Postgres>::new(
            r#"
            SELECT h.id, h.user_id, h.status, h.module, h.description, h.ts,
                   u.name, u.fname, u.lname, u.email, r.name AS role_name
            FROM tbl_histories h
            JOIN tbl_users u ON u.id = h.user_id
            JOIN tbl_roles r ON r.id = u.role_id
            WHERE TRUE
            "#,
        );
        Self::push_filter(&mut qb, filter);
        qb.push(" ORDER BY h.ts DESC, h.id DESC");
        push_page(&mut qb, pagination);

        let rows = qb
            .build_query_as::<HistoryRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("查询操作日志"))?;
        Ok(rows.into_iter().map(HistoryEntry::from).collect())
    }

    async fn count(&self, filter: &HistoryFilter) -> AppResult<u64> {
        let mut qb = QueryBuilder::<Postgres>::new(
            r#"
            SELECT COUNT(*)
            FROM tbl_histories h
            JOIN tbl_users u ON u.id = h.user_id
            JOIN tbl_roles r ON r.id = u.role_id
            WHERE TRUE
            "#,
        );
        Self::push_filter(&mut qb, filter);

        let total = qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("统计操作日志"))?;
        Ok(to_count(total))
    }

    async fn distinct_statuses(&self, user: Option<UserId>) -> AppResult<Vec<String>> {
        self.distinct("status", user).await
    }

    async fn distinct_modules(&self, user: Option<UserId>) -> AppResult<Vec<String>> {
        self.distinct("module", user).await
    }
}
