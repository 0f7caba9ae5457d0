//! 出库记录的 PostgreSQL 实现

use async_trait::async_trait;
use softwear_adapter_postgres::{
    db_error, push_date_range, push_page, push_search, to_count, utc_date,
};
use softwear_common::{DateRange, Pagination, UserId};
use softwear_errors::AppResult;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::domain::{DailyQuantity, MovementFilter, NewStockOut, StockOut, StockOutRepository};

use super::levels::{KEY_NAME_COLUMNS, USER_NAME_COLUMNS, insert_stock_out};
use super::rows::{DailyRow, StockOutRow};

const SEARCH_COLUMNS: [&str; 3] = ["v.name", "p.name", "so.reason"];

const FROM_STOCK_OUT: &str = r#"
    FROM tbl_stock_out so
    JOIN tbl_variants v ON v.id = so.variant_id
    JOIN tbl_products p ON p.id = v.product_id
    JOIN tbl_users u ON u.id = so.user_id
    LEFT JOIN tbl_sizes sz ON sz.id = so.size_id
    LEFT JOIN tbl_colors c ON c.id = so.color_id
    WHERE so.archived_at IS NULL
"#;

pub struct PostgresStockOutRepository {
    pool: PgPool,
}

impl PostgresStockOutRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn select() -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new(
            "SELECT so.id, so.variant_id, so.size_id, so.color_id, so.quantity_removed, so.reason, so.created_at, ",
        );
        qb.push(KEY_NAME_COLUMNS)
            .push(", ")
            .push(USER_NAME_COLUMNS)
            .push(FROM_STOCK_OUT);
        qb
    }

    fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &MovementFilter) {
        if let Some(seller) = filter.seller {
            qb.push(" AND v.user_id = ").push_bind(seller.0);
        }
        if let Some(created_by) = filter.created_by {
            qb.push(" AND so.user_id = ").push_bind(created_by.0);
        }
        push_search(qb, &SEARCH_COLUMNS, filter.search.as_deref());
        push_date_range(qb, &utc_date("so.created_at"), &filter.range);
    }
}

#[async_trait]
impl StockOutRepository for PostgresStockOutRepository {
    async fn list(&self, filter: &MovementFilter, pagination: Pagination) -> AppResult<Vec<StockOut>> {
        let mut qb = Self::select();
        Self::push_filter(&mut qb, filter);
        qb.push(" ORDER BY so.created_at DESC, so.id DESC");
        push_page(&mut qb, pagination);

        let rows = qb
            .build_query_as::<StockOutRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("查询出库列表"))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn count(&self, filter: &MovementFilter) -> AppResult<u64> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
        qb.push(FROM_STOCK_OUT);
        Self::push_filter(&mut qb, filter);

        let total = qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("统计出库数量"))?;
        Ok(to_count(total))
    }

    async fn details(&self, id: i32, filter: &MovementFilter) -> AppResult<Option<StockOut>> {
        let mut qb = Self::select();
        qb.push(" AND so.id = ").push_bind(id);
        Self::push_filter(&mut qb, filter);

        let row = qb
            .build_query_as::<StockOutRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("查询出库详情"))?;
        Ok(row.map(Into::into))
    }

    async fn insert(&self, stock_out: &NewStockOut) -> AppResult<i32> {
        let mut conn = self.pool.acquire().await.map_err(db_error("获取数据库连接"))?;
        insert_stock_out(&mut conn, stock_out).await
    }

    async fn daily(&self, seller: UserId, range: &DateRange) -> AppResult<Vec<DailyQuantity>> {
        let date = utc_date("so.created_at");
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {date} AS date, COUNT(*) AS count, COALESCE(SUM(so.quantity_removed), 0)::BIGINT AS quantity \
             FROM tbl_stock_out so JOIN tbl_variants v ON v.id = so.variant_id \
             WHERE so.archived_at IS NULL AND v.user_id = "
        ));
        qb.push_bind(seller.0);
        push_date_range(&mut qb, &date, range);
        qb.push(" GROUP BY 1 ORDER BY 1");

        let rows = qb
            .build_query_as::<DailyRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("按日统计出库"))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
