//! 库存水平的 PostgreSQL 实现

use async_trait::async_trait;
use rust_decimal::Decimal;
use softwear_adapter_postgres::{UTC_TODAY, db_error, push_page, push_search, to_count, utc_date};
use softwear_common::{Pagination, UserId};
use softwear_errors::AppResult;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::domain::{
    InventoryItem, InventoryRepository, InventoryStats, LowStockItem, ReorderLevelUpdate, StockKey,
};

use super::levels::{INVENTORY_JOIN, KEY_NAME_COLUMNS, USER_NAME_COLUMNS, current_stock, levels_query};
use super::rows::{InventoryRow, LowStockRow};

const SEARCH_COLUMNS: [&str; 4] = ["v.name", "p.name", "sz.name", "c.name"];

/// levels 与款式、商品、尺码、颜色的连接
const LEVEL_JOINS: &str = r#"
    FROM levels l
    JOIN tbl_variants v ON v.id = l.variant_id
    JOIN tbl_products p ON p.id = v.product_id
    LEFT JOIN tbl_sizes sz ON sz.id = l.size_id
    LEFT JOIN tbl_colors c ON c.id = l.color_id
"#;

/// 从补货线出发连接库存水平，没有变动的组合库存按 0 计；末尾等待绑定卖家
const LOW_STOCK_FROM: &str = r#"
    FROM tbl_inventories i
    JOIN tbl_variants v ON v.id = i.variant_id
    JOIN tbl_products p ON p.id = v.product_id
    LEFT JOIN tbl_sizes sz ON sz.id = i.size_id
    LEFT JOIN tbl_colors c ON c.id = i.color_id
    LEFT JOIN levels l
        ON l.variant_id = i.variant_id
        AND l.size_id IS NOT DISTINCT FROM i.size_id
        AND l.color_id IS NOT DISTINCT FROM i.color_id
    WHERE i.archived_at IS NULL AND v.archived_at IS NULL AND v.user_id = "#;

const LOW_STOCK_CONDITION: &str =
    " AND i.reorder_level > 0 AND COALESCE(l.current_stock, 0) <= i.reorder_level";

pub struct PostgresInventoryRepository {
    pool: PgPool,
}

impl PostgresInventoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn select_items(seller: UserId) -> QueryBuilder<'static, Postgres> {
        let mut qb = levels_query(seller);
        qb.push("SELECT l.variant_id, l.size_id, l.color_id, ")
            .push(KEY_NAME_COLUMNS)
            .push(", l.current_stock, COALESCE(i.reorder_level, 0) AS reorder_level, ")
            .push("COALESCE(i.updated_at, i.created_at) AS last_updated, i.user_id AS updated_by, ")
            .push(USER_NAME_COLUMNS)
            .push(", v.price, v.cost_price, p.image, p.image_content_type, p.category_id, cat.name AS category_name")
            .push(LEVEL_JOINS)
            .push(" LEFT JOIN tbl_categories cat ON cat.id = p.category_id")
            .push(INVENTORY_JOIN)
            .push(" LEFT JOIN tbl_users u ON u.id = i.user_id WHERE v.archived_at IS NULL");
        qb
    }

    /// 统计某张变动表的全部与今日数量
    async fn movement_totals(
        &self,
        seller: UserId,
        table: &str,
        quantity: &str,
    ) -> AppResult<(i64, i64)> {
        let created = utc_date("t.created_at");
        let sql = format!(
            r#"
            SELECT COALESCE(SUM({quantity}), 0)::BIGINT,
                   COALESCE(SUM({quantity}) FILTER (WHERE {created} = {UTC_TODAY}), 0)::BIGINT
            FROM {table} t
            JOIN tbl_variants v ON v.id = t.variant_id
            WHERE t.archived_at IS NULL AND v.user_id = $1
            "#
        );
        sqlx::query_as::<_, (i64, i64)>(&sql)
            .bind(seller.0)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error(format!("统计{}", table)))
    }
}

#[async_trait]
impl InventoryRepository for PostgresInventoryRepository {
    async fn list(
        &self,
        seller: UserId,
        search: Option<String>,
        pagination: Pagination,
    ) -> AppResult<Vec<InventoryItem>> {
        let mut qb = Self::select_items(seller);
        qb.push(" AND l.current_stock > 0");
        push_search(&mut qb, &SEARCH_COLUMNS, search.as_deref());
        qb.push(" ORDER BY p.name, v.name, sz.name NULLS FIRST, c.name NULLS FIRST");
        push_page(&mut qb, pagination);

        let rows = qb
            .build_query_as::<InventoryRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("查询库存列表"))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn count(&self, seller: UserId, search: Option<String>) -> AppResult<u64> {
        let mut qb = levels_query(seller);
        qb.push("SELECT COUNT(*)")
            .push(LEVEL_JOINS)
            .push(" WHERE v.archived_at IS NULL AND l.current_stock > 0");
        push_search(&mut qb, &SEARCH_COLUMNS, search.as_deref());

        let total = qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("统计库存数量"))?;
        Ok(to_count(total))
    }

    async fn details(&self, seller: UserId, key: StockKey) -> AppResult<Option<InventoryItem>> {
        let mut qb = Self::select_items(seller);
        qb.push(" AND l.variant_id = ")
            .push_bind(key.variant_id)
            .push(" AND l.size_id IS NOT DISTINCT FROM ")
            .push_bind(key.size_id)
            .push(" AND l.color_id IS NOT DISTINCT FROM ")
            .push_bind(key.color_id);

        let row = qb
            .build_query_as::<InventoryRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("查询库存详情"))?;
        Ok(row.map(Into::into))
    }

    async fn current_stock(&self, seller: UserId, key: StockKey) -> AppResult<i32> {
        let mut conn = self.pool.acquire().await.map_err(db_error("获取数据库连接"))?;
        current_stock(&mut conn, seller, key).await
    }

    async fn set_reorder_level(&self, update: &ReorderLevelUpdate) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO tbl_inventories
                (variant_id, size_id, color_id, current_stock, reorder_level, user_id, created_at, updated_at)
            SELECT v.id, $2, $3, 0, $4, $5, NOW(), NOW()
            FROM tbl_variants v
            WHERE v.id = $1 AND v.user_id = $6 AND v.archived_at IS NULL
            ON CONFLICT (variant_id, size_id, color_id) DO UPDATE
            SET reorder_level = EXCLUDED.reorder_level,
                user_id = EXCLUDED.user_id,
                updated_at = NOW(),
                archived_at = NULL
            "#,
        )
        .bind(update.key.variant_id)
        .bind(update.key.size_id)
        .bind(update.key.color_id)
        .bind(update.reorder_level)
        .bind(update.updated_by.0)
        .bind(update.seller.0)
        .execute(&self.pool)
        .await
        .map_err(db_error("更新补货线"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn stats(&self, seller: UserId) -> AppResult<InventoryStats> {
        let (total_stock_in, today_stock_in) = self
            .movement_totals(seller, "tbl_stock_in", "t.quantity_added")
            .await?;
        let (total_stock_out, today_stock_out) = self
            .movement_totals(seller, "tbl_stock_out", "t.quantity_removed")
            .await?;
        let (total_adjustments, today_adjustments) = self
            .movement_totals(seller, "tbl_stock_adjustments", "1")
            .await?;

        let mut qb = levels_query(seller);
        qb.push("SELECT COUNT(*)")
            .push(LOW_STOCK_FROM)
            .push_bind(seller.0)
            .push(LOW_STOCK_CONDITION);
        let low_stock_items = qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("统计低库存"))?;

        let mut qb = levels_query(seller);
        qb.push(
            r#"
            SELECT COALESCE(SUM(l.current_stock * COALESCE(v.cost_price, 0)), 0)
            FROM levels l
            JOIN tbl_variants v ON v.id = l.variant_id
            WHERE v.archived_at IS NULL AND l.current_stock > 0
            "#,
        );
        let total_inventory_value = qb
            .build_query_scalar::<Decimal>()
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("统计库存价值"))?;

        let total_products: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM tbl_variants WHERE user_id = $1 AND archived_at IS NULL",
        )
        .bind(seller.0)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("统计款式数量"))?;

        Ok(InventoryStats {
            total_stock_in,
            today_stock_in,
            total_stock_out,
            today_stock_out,
            total_adjustments,
            today_adjustments,
            low_stock_items,
            total_inventory_value,
            total_products,
        })
    }

    async fn low_stock(&self, seller: UserId, limit: i64) -> AppResult<Vec<LowStockItem>> {
        let mut qb = levels_query(seller);
        qb.push("SELECT i.variant_id, i.size_id, i.color_id, ")
            .push(KEY_NAME_COLUMNS)
            .push(", COALESCE(l.current_stock, 0) AS current_stock, i.reorder_level")
            .push(LOW_STOCK_FROM)
            .push_bind(seller.0)
            .push(LOW_STOCK_CONDITION)
            .push(" ORDER BY COALESCE(l.current_stock, 0), p.name, v.name LIMIT ")
            .push_bind(limit);

        let rows = qb
            .build_query_as::<LowStockRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("查询低库存"))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
