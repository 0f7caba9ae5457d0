//! 库存水平的公共 SQL 片段，以及供销售、退货、采购在其事务内复用的写入函数

use softwear_adapter_postgres::db_error;
use softwear_common::UserId;
use softwear_errors::AppResult;
use sqlx::{PgConnection, Postgres, QueryBuilder};

use crate::domain::{NewStockIn, NewStockOut, StockKey};

/// 所有未归档的库存变动，带符号数量列为 `qty`
pub(super) const STOCK_MOVEMENTS: &str = r#"
    SELECT variant_id, size_id, color_id, quantity_added AS qty
    FROM tbl_stock_in WHERE archived_at IS NULL
    UNION ALL
    SELECT variant_id, size_id, color_id, -quantity_removed
    FROM tbl_stock_out WHERE archived_at IS NULL
    UNION ALL
    SELECT variant_id, size_id, color_id,
           CASE adjustment_type WHEN 'Increase' THEN quantity_adjusted ELSE -quantity_adjusted END
    FROM tbl_stock_adjustments WHERE archived_at IS NULL
"#;

/// 以 `WITH levels AS (...)` 开头的查询，列为 variant_id/size_id/color_id/current_stock
pub(super) fn levels_query<'a>(seller: UserId) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new("WITH levels AS (SELECT m.variant_id, m.size_id, m.color_id, SUM(m.qty)::INTEGER AS current_stock FROM (");
    qb.push(STOCK_MOVEMENTS)
        .push(") m JOIN tbl_variants lv ON lv.id = m.variant_id WHERE lv.user_id = ")
        .push_bind(seller.0)
        .push(" GROUP BY m.variant_id, m.size_id, m.color_id) ");
    qb
}

/// 补货线所在行与库存组合的连接条件
pub(super) const INVENTORY_JOIN: &str = r#"
    LEFT JOIN tbl_inventories i
        ON i.variant_id = l.variant_id
        AND i.size_id IS NOT DISTINCT FROM l.size_id
        AND i.color_id IS NOT DISTINCT FROM l.color_id
        AND i.archived_at IS NULL
"#;

/// 款式、商品、尺码、颜色名称列；表别名为 v/p/sz/c
pub(super) const KEY_NAME_COLUMNS: &str =
    "v.name AS variant_name, p.name AS product_name, sz.name AS size_name, c.name AS color_name, c.hex_value AS color_hex";

/// 经办人姓名列；表别名为 u
pub(super) const USER_NAME_COLUMNS: &str =
    "u.name AS user_name, u.fname AS user_fname, u.lname AS user_lname, u.email AS user_email";

/// 某个组合的当前库存；组合不属于该卖家时为 0
pub async fn current_stock(conn: &mut PgConnection, seller: UserId, key: StockKey) -> AppResult<i32> {
    let mut qb = QueryBuilder::<Postgres>::new("SELECT COALESCE(SUM(m.qty), 0)::INTEGER FROM (");
    qb.push(STOCK_MOVEMENTS)
        .push(") m JOIN tbl_variants v ON v.id = m.variant_id WHERE v.user_id = ")
        .push_bind(seller.0)
        .push(" AND m.variant_id = ")
        .push_bind(key.variant_id)
        .push(" AND m.size_id IS NOT DISTINCT FROM ")
        .push_bind(key.size_id)
        .push(" AND m.color_id IS NOT DISTINCT FROM ")
        .push_bind(key.color_id);

    qb.build_query_scalar::<i32>()
        .fetch_one(conn)
        .await
        .map_err(db_error("查询当前库存"))
}

pub async fn insert_stock_in(conn: &mut PgConnection, stock_in: &NewStockIn) -> AppResult<i32> {
    sqlx::query_scalar(
        r#"
        INSERT INTO tbl_stock_in
            (user_id, variant_id, size_id, color_id, quantity_added, cost_price, supplier_id, po_id,
             return_id, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW())
        RETURNING id
        "#,
    )
    .bind(stock_in.user_id.0)
    .bind(stock_in.key.variant_id)
    .bind(stock_in.key.size_id)
    .bind(stock_in.key.color_id)
    .bind(stock_in.quantity)
    .bind(stock_in.cost_price)
    .bind(stock_in.supplier_id)
    .bind(stock_in.po_id)
    .bind(stock_in.return_id)
    .fetch_one(conn)
    .await
    .map_err(db_error("新增入库记录"))
}

pub async fn insert_stock_out(conn: &mut PgConnection, stock_out: &NewStockOut) -> AppResult<i32> {
    sqlx::query_scalar(
        r#"
        INSERT INTO tbl_stock_out
            (user_id, variant_id, size_id, color_id, quantity_removed, reason, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, NOW())
        RETURNING id
        "#,
    )
    .bind(stock_out.user_id.0)
    .bind(stock_out.key.variant_id)
    .bind(stock_out.key.size_id)
    .bind(stock_out.key.color_id)
    .bind(stock_out.quantity)
    .bind(&stock_out.reason)
    .fetch_one(conn)
    .await
    .map_err(db_error("新增出库记录"))
}
