//! 入库记录的 PostgreSQL 实现

use async_trait::async_trait;
use softwear_adapter_postgres::{
    db_error, push_date_range, push_page, push_search, to_count, utc_date,
};
use softwear_common::{DateRange, Pagination, UserId};
use softwear_errors::AppResult;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::domain::{DailyQuantity, MovementFilter, NewStockIn, StockIn, StockInDetails, StockInRepository};

use super::levels::{KEY_NAME_COLUMNS, USER_NAME_COLUMNS, insert_stock_in};
use super::rows::{DailyRow, StockInDetailsRow, StockInRow};

const SEARCH_COLUMNS: [&str; 3] = ["v.name", "p.name", "s.company_name"];

const FROM_STOCK_IN: &str = r#"
    FROM tbl_stock_in si
    JOIN tbl_variants v ON v.id = si.variant_id
    JOIN tbl_products p ON p.id = v.product_id
    JOIN tbl_users u ON u.id = si.user_id
    LEFT JOIN tbl_suppliers s ON s.id = si.supplier_id
    LEFT JOIN tbl_sizes sz ON sz.id = si.size_id
    LEFT JOIN tbl_colors c ON c.id = si.color_id
    WHERE si.archived_at IS NULL
"#;

pub struct PostgresStockInRepository {
    pool: PgPool,
}

impl PostgresStockInRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn select(details: bool) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new(
            "SELECT si.id, si.variant_id, si.size_id, si.color_id, si.quantity_added, si.cost_price, \
             si.supplier_id, s.company_name AS supplier_name, si.po_id, si.created_at, ",
        );
        qb.push(KEY_NAME_COLUMNS).push(", ").push(USER_NAME_COLUMNS);
        if details {
            qb.push(
                ", s.contact_person AS supplier_contact_person, s.email AS supplier_email, \
                 s.contact_number AS supplier_contact_number",
            );
        }
        qb.push(FROM_STOCK_IN);
        qb
    }

    fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &MovementFilter) {
        if let Some(seller) = filter.seller {
            qb.push(" AND v.user_id = ").push_bind(seller.0);
        }
        if let Some(created_by) = filter.created_by {
            qb.push(" AND si.user_id = ").push_bind(created_by.0);
        }
        push_search(qb, &SEARCH_COLUMNS, filter.search.as_deref());
        push_date_range(qb, &utc_date("si.created_at"), &filter.range);
    }
}

#[async_trait]
impl StockInRepository for PostgresStockInRepository {
    async fn list(&self, filter: &MovementFilter, pagination: Pagination) -> AppResult<Vec<StockIn>> {
        let mut qb = Self::select(false);
        Self::push_filter(&mut qb, filter);
        qb.push(" ORDER BY si.created_at DESC, si.id DESC");
        push_page(&mut qb, pagination);

        let rows = qb
            .build_query_as::<StockInRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("查询入库列表"))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn count(&self, filter: &MovementFilter) -> AppResult<u64> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
        qb.push(FROM_STOCK_IN);
        Self::push_filter(&mut qb, filter);

        let total = qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("统计入库数量"))?;
        Ok(to_count(total))
    }

    async fn details(&self, id: i32, filter: &MovementFilter) -> AppResult<Option<StockInDetails>> {
        let mut qb = Self::select(true);
        qb.push(" AND si.id = ").push_bind(id);
        Self::push_filter(&mut qb, filter);

        let row = qb
            .build_query_as::<StockInDetailsRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("查询入库详情"))?;
        Ok(row.map(Into::into))
    }

    async fn insert(&self, stock_in: &NewStockIn) -> AppResult<i32> {
        let mut conn = self.pool.acquire().await.map_err(db_error("获取数据库连接"))?;
        insert_stock_in(&mut conn, stock_in).await
    }

    async fn daily(&self, seller: UserId, range: &DateRange) -> AppResult<Vec<DailyQuantity>> {
        let date = utc_date("si.created_at");
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {date} AS date, COUNT(*) AS count, COALESCE(SUM(si.quantity_added), 0)::BIGINT AS quantity \
             FROM tbl_stock_in si JOIN tbl_variants v ON v.id = si.variant_id \
             WHERE si.archived_at IS NULL AND v.user_id = "
        ));
        qb.push_bind(seller.0);
        push_date_range(&mut qb, &date, range);
        qb.push(" GROUP BY 1 ORDER BY 1");

        let rows = qb
            .build_query_as::<DailyRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("按日统计入库"))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
