//! 退货单的 PostgreSQL 实现

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sc_im::domain::{NewStockIn, StockKey};
use sc_im::infrastructure::insert_stock_in;
use softwear_adapter_postgres::{
    NumberSeries, TransactionManager, UTC_TODAY, db_error, push_date_range, push_page,
    push_search, to_count, utc_date,
};
use softwear_common::{DateRange, Pagination, UserId};
use softwear_errors::{AppError, AppResult};
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use sys_billing::infrastructure::record_admin_fee_reversal;
use tracing::debug;

use crate::domain::{
    CreatedReturn, DailyReturns, NewReturn, ReturnFilter, ReturnOwner, ReturnRepository,
    ReturnReport, ReturnReportItem, ReturnStatus, ReturnableLine, ReturnableSale,
    ReturnableSaleFilter, ReturnableSaleItem, StatusChange, StatusOutcome, check_quantities,
    check_returnable, refund_amount, return_number,
};

use super::rows::{
    DailyReturnsRow, RestockRow, ReturnItemRow, ReturnReportRow, ReturnableItemRow,
    ReturnableLineRow, ReturnableSaleRow,
};

const RETURN_NUMBERS: NumberSeries =
    NumberSeries::new(0x5245_5455_524e, "tbl_returns", "return_number");

const RETURN_SEARCH_COLUMNS: [&str; 2] = ["r.return_number", "s.sale_number"];
const SALE_SEARCH_COLUMNS: [&str; 1] = ["s.sale_number"];

const RETURN_COLUMNS: &str = r#"
    SELECT r.id, r.return_number, r.sale_id, s.sale_number, r.reason, r.status,
           (SELECT COALESCE(SUM(ri.quantity * si.price), 0)
            FROM tbl_return_items ri
            JOIN tbl_sales_items si ON si.id = ri.sale_item_id
            WHERE ri.return_id = r.id AND ri.archived_at IS NULL) AS refund_amount,
           u.name AS cashier_name, u.fname AS cashier_fname, u.lname AS cashier_lname,
           u.email AS cashier_email,
           au.name AS approver_name, au.fname AS approver_fname, au.lname AS approver_lname,
           au.email AS approver_email,
           r.created_at, r.updated_at"#;

const FROM_RETURNS: &str = r#"
    FROM tbl_returns r
    JOIN tbl_sales s ON s.id = r.sale_id
    JOIN tbl_users u ON u.id = r.user_id
    LEFT JOIN tbl_users au ON au.id = r.approved_by
    WHERE r.archived_at IS NULL"#;

const RETURNABLE_SALE_COLUMNS: &str = r#"
    SELECT s.id, s.sale_number, s.amount, s.payment_type,
           u.name AS cashier_name, u.fname AS cashier_fname, u.lname AS cashier_lname,
           u.email AS cashier_email, s.created_at"#;

const FROM_RETURNABLE_SALES: &str = r#"
    FROM tbl_sales s
    JOIN tbl_users u ON u.id = s.user_id
    WHERE s.archived_at IS NULL AND s.status = 'Completed'"#;

/// 未驳回退货中已占用的数量；表别名 si
const RETURNED_QUANTITY: &str = r#"
    COALESCE((SELECT SUM(ri.quantity)
              FROM tbl_return_items ri
              JOIN tbl_returns r ON r.id = ri.return_id
              WHERE ri.sale_item_id = si.id AND ri.archived_at IS NULL
                AND r.archived_at IS NULL AND r.status <> 'Rejected'), 0)::INTEGER"#;

/// 同上，但不计 `$2` 这张退货单本身
const RETURNED_QUANTITY_BY_OTHERS: &str = r#"
    COALESCE((SELECT SUM(ri.quantity)
              FROM tbl_return_items ri
              JOIN tbl_returns r ON r.id = ri.return_id
              WHERE ri.sale_item_id = si.id AND ri.archived_at IS NULL
                AND r.archived_at IS NULL AND r.status <> 'Rejected'
                AND r.id <> $2), 0)::INTEGER"#;

/// 该退货单是否已回库或已冲销手续费
const ALREADY_SETTLED: &str = r#"
    SELECT EXISTS (SELECT 1 FROM tbl_stock_in WHERE return_id = $1)
        OR EXISTS (SELECT 1 FROM tbl_subscription_transactions
                   WHERE return_id = $1 AND transaction_type = 'AdminFeeReversal')"#;

pub struct PostgresReturnRepository {
    pool: PgPool,
    tx_manager: TransactionManager,
}

impl PostgresReturnRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            tx_manager: TransactionManager::new(pool.clone()),
            pool,
        }
    }

    fn push_owner(qb: &mut QueryBuilder<'_, Postgres>, owner: ReturnOwner) {
        match owner {
            ReturnOwner::Any => {}
            ReturnOwner::Cashier(cashier) => {
                qb.push(" AND r.user_id = ").push_bind(cashier.0);
            }
            ReturnOwner::Seller(seller) => {
                qb.push(" AND (u.id = ")
                    .push_bind(seller.0)
                    .push(" OR u.user_id = ")
                    .push_bind(seller.0)
                    .push(")");
            }
        }
    }

    fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &ReturnFilter) {
        Self::push_owner(qb, filter.owner);
        push_search(qb, &RETURN_SEARCH_COLUMNS, filter.search.as_deref());
        if let Some(status) = filter.status {
            qb.push(" AND r.status = ").push_bind(status.as_str());
        }
        push_date_range(qb, &utc_date("r.created_at"), &filter.range);
    }

    fn push_sale_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &ReturnableSaleFilter) {
        qb.push(" AND s.user_id = ").push_bind(filter.cashier.0);
        push_search(qb, &SALE_SEARCH_COLUMNS, filter.search.as_deref());
        push_date_range(qb, &utc_date("s.created_at"), &filter.range);
    }

    /// 今天（UTC）未归档退货数 + 1
    async fn next_return_number(conn: &mut PgConnection) -> AppResult<String> {
        RETURN_NUMBERS.lock(conn).await?;

        let sql = format!(
            "SELECT COUNT(*) FROM tbl_returns WHERE archived_at IS NULL AND {} = {}",
            utc_date("created_at"),
            UTC_TODAY
        );
        let existing: i64 = sqlx::query_scalar(&sql)
            .fetch_one(&mut *conn)
            .await
            .map_err(db_error("统计今日退货单"))?;

        let today = Utc::now().date_naive();
        RETURN_NUMBERS
            .first_free(conn, existing + 1, |seq| return_number(today, seq))
            .await
    }

    /// 销售单收银员所属卖家
    async fn sale_seller(conn: &mut PgConnection, sale_id: i32) -> AppResult<UserId> {
        let seller: Option<i32> = sqlx::query_scalar(
            r#"
            SELECT CASE WHEN ro.name = 'seller' THEN u.id ELSE COALESCE(u.user_id, u.id) END
            FROM tbl_sales s
            JOIN tbl_users u ON u.id = s.user_id
            JOIN tbl_roles ro ON ro.id = u.role_id
            WHERE s.id = $1
            "#,
        )
        .bind(sale_id)
        .fetch_one(conn)
        .await
        .map_err(db_error("查询销售单所属卖家"))?;
        seller
            .map(UserId)
            .ok_or_else(|| AppError::not_found(format!("销售单 {} 没有所属卖家", sale_id)))
    }

    /// 批准前复核：本单数量不能超过扣除其他未驳回退货后的剩余数量
    async fn recheck_returnable(
        conn: &mut PgConnection,
        return_id: i32,
        sale_id: i32,
    ) -> AppResult<()> {
        let requested: Vec<(i32, i32)> = sqlx::query_as(
            r#"
            SELECT sale_item_id, quantity FROM tbl_return_items
            WHERE return_id = $1 AND archived_at IS NULL
            "#,
        )
        .bind(return_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(db_error("查询退货明细"))?;

        let lines: Vec<ReturnableLineRow> = sqlx::query_as(&format!(
            r#"
            SELECT si.id AS sale_item_id, si.quantity AS sold, {} AS returned
            FROM tbl_sales_items si
            WHERE si.sale_id = $1 AND si.archived_at IS NULL
            "#,
            RETURNED_QUANTITY_BY_OTHERS
        ))
        .bind(sale_id)
        .bind(return_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(db_error("查询可退数量"))?;
        let lines: Vec<ReturnableLine> = lines.into_iter().map(Into::into).collect();

        check_quantities(requested, &lines)
    }

    /// 按明细回库，返回 (件数, 退款金额)
    async fn restock(
        conn: &mut PgConnection,
        return_id: i32,
    ) -> AppResult<(usize, Decimal)> {
        let items: Vec<RestockRow> = sqlx::query_as(
            r#"
            SELECT ri.variant_id, ri.size_id, ri.color_id, ri.quantity,
                   COALESCE(v.user_id, s.user_id) AS owner_id,
                   COALESCE(v.cost_price, 0) AS cost_price,
                   si.price
            FROM tbl_return_items ri
            JOIN tbl_variants v ON v.id = ri.variant_id
            JOIN tbl_sales_items si ON si.id = ri.sale_item_id
            JOIN tbl_sales s ON s.id = si.sale_id
            WHERE ri.return_id = $1 AND ri.archived_at IS NULL
            ORDER BY ri.id
            "#,
        )
        .bind(return_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(db_error("查询退货明细"))?;

        for item in &items {
            let stock_in = NewStockIn {
                user_id: UserId(item.owner_id),
                key: StockKey::new(item.variant_id, item.size_id, item.color_id),
                quantity: item.quantity,
                cost_price: item.cost_price,
                supplier_id: None,
                po_id: None,
                return_id: Some(return_id),
            };
            insert_stock_in(&mut *conn, &stock_in).await?;
            debug!(
                return_id,
                variant_id = item.variant_id,
                quantity = item.quantity,
                "Return item restocked"
            );
        }

        let refund = refund_amount(items.iter().map(|i| (i.price, i.quantity)));
        Ok((items.len(), refund))
    }
}

#[async_trait]
impl ReturnRepository for PostgresReturnRepository {
    async fn insert(&self, sales_return: &NewReturn) -> AppResult<CreatedReturn> {
        let mut tx = self.tx_manager.begin().await?;

        // 锁住销售单，同一销售单的退货串行校验数量
        let sale: Option<i32> = sqlx::query_scalar(
            r#"
            SELECT id FROM tbl_sales
            WHERE id = $1 AND status = 'Completed' AND archived_at IS NULL
            FOR UPDATE
            "#,
        )
        .bind(sales_return.sale_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("查询退货销售单"))?;

        if sale.is_none() {
            TransactionManager::rollback(tx).await?;
            return Err(AppError::not_found(format!(
                "销售单 {} 不存在或未完成",
                sales_return.sale_id
            )));
        }

        let lines: Vec<ReturnableLineRow> = sqlx::query_as(&format!(
            r#"
            SELECT si.id AS sale_item_id, si.quantity AS sold, {} AS returned
            FROM tbl_sales_items si
            WHERE si.sale_id = $1 AND si.archived_at IS NULL
            "#,
            RETURNED_QUANTITY
        ))
        .bind(sales_return.sale_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(db_error("查询可退数量"))?;
        let lines: Vec<ReturnableLine> = lines.into_iter().map(Into::into).collect();

        if let Err(e) = check_returnable(&sales_return.items, &lines) {
            TransactionManager::rollback(tx).await?;
            return Err(e);
        }

        let number = Self::next_return_number(&mut tx).await?;
        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO tbl_returns (return_number, sale_id, reason, status, user_id, created_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            RETURNING id
            "#,
        )
        .bind(&number)
        .bind(sales_return.sale_id)
        .bind(&sales_return.reason)
        .bind(ReturnStatus::Pending.as_str())
        .bind(sales_return.cashier.0)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("新增退货单"))?;

        // 款式、尺码、颜色取自销售明细
        for item in &sales_return.items {
            sqlx::query(
                r#"
                INSERT INTO tbl_return_items
                    (return_id, sale_item_id, variant_id, size_id, color_id, quantity, condition, created_at)
                SELECT $1, si.id, si.variant_id, si.size_id, si.color_id, $3, $4, NOW()
                FROM tbl_sales_items si
                WHERE si.id = $2
                "#,
            )
            .bind(id)
            .bind(item.sale_item_id)
            .bind(item.quantity)
            .bind(item.condition.as_str())
            .execute(&mut *tx)
            .await
            .map_err(db_error("新增退货明细"))?;
        }

        TransactionManager::commit(tx).await?;
        Ok(CreatedReturn {
            id,
            return_number: number,
        })
    }

    async fn update_status(&self, change: &StatusChange) -> AppResult<StatusOutcome> {
        let mut tx = self.tx_manager.begin().await?;

        let mut qb = QueryBuilder::<Postgres>::new(
            r#"
            SELECT r.status, r.sale_id
            FROM tbl_returns r
            JOIN tbl_users u ON u.id = r.user_id
            WHERE r.archived_at IS NULL AND r.id = "#,
        );
        qb.push_bind(change.return_id);
        if !change.seller.is_any() {
            Self::push_owner(&mut qb, ReturnOwner::Seller(change.seller));
        }
        qb.push(" FOR UPDATE OF r");

        let current: Option<(String, i32)> = qb
            .build_query_as()
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error("查询退货单状态"))?;

        let Some((previous, sale_id)) = current else {
            TransactionManager::rollback(tx).await?;
            return Ok(StatusOutcome::NotFound);
        };

        let approving =
            change.status == ReturnStatus::Approved && previous != ReturnStatus::Approved.as_str();
        if approving {
            // 同一销售单的退货串行复核
            sqlx::query("SELECT id FROM tbl_sales WHERE id = $1 FOR UPDATE")
                .bind(sale_id)
                .execute(&mut *tx)
                .await
                .map_err(db_error("锁定退货销售单"))?;
            if let Err(e) = Self::recheck_returnable(&mut tx, change.return_id, sale_id).await {
                TransactionManager::rollback(tx).await?;
                return Err(e);
            }
        }

        sqlx::query(
            r#"
            UPDATE tbl_returns
            SET status = $2, approved_by = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(change.return_id)
        .bind(change.status.as_str())
        .bind(change.approved_by.0)
        .execute(&mut *tx)
        .await
        .map_err(db_error("更新退货单状态"))?;

        let mut restocked = None;
        if approving {
            let settled: bool = sqlx::query_scalar(ALREADY_SETTLED)
                .bind(change.return_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(db_error("查询退货回库记录"))?;
            if settled {
                debug!(return_id = change.return_id, "Return already restocked, skipping");
            } else {
                let (items, refund) = Self::restock(&mut tx, change.return_id).await?;
                if refund > Decimal::ZERO {
                    let seller = Self::sale_seller(&mut tx, sale_id).await?;
                    record_admin_fee_reversal(&mut tx, seller, sale_id, change.return_id, refund)
                        .await?;
                }
                restocked = Some((items, refund));
            }
        }

        TransactionManager::commit(tx).await?;
        Ok(StatusOutcome::Updated { restocked })
    }

    async fn list(&self, filter: &ReturnFilter, pagination: Pagination) -> AppResult<Vec<ReturnReport>> {
        let mut qb = QueryBuilder::<Postgres>::new(RETURN_COLUMNS);
        qb.push(FROM_RETURNS);
        Self::push_filter(&mut qb, filter);
        qb.push(" ORDER BY r.created_at DESC, r.id DESC");
        push_page(&mut qb, pagination);

        let rows = qb
            .build_query_as::<ReturnReportRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("查询退货列表"))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn count(&self, filter: &ReturnFilter) -> AppResult<u64> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
        qb.push(FROM_RETURNS);
        Self::push_filter(&mut qb, filter);

        let total = qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("统计退货数量"))?;
        Ok(to_count(total))
    }

    async fn find(&self, return_id: i32, owner: ReturnOwner) -> AppResult<Option<ReturnReport>> {
        let mut qb = QueryBuilder::<Postgres>::new(RETURN_COLUMNS);
        qb.push(FROM_RETURNS).push(" AND r.id = ").push_bind(return_id);
        Self::push_owner(&mut qb, owner);

        let row = qb
            .build_query_as::<ReturnReportRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("查询退货单"))?;
        Ok(row.map(Into::into))
    }

    async fn items(&self, return_id: i32) -> AppResult<Vec<ReturnReportItem>> {
        let rows: Vec<ReturnItemRow> = sqlx::query_as(
            r#"
            SELECT ri.id, ri.return_id, ri.sale_item_id, ri.variant_id, ri.size_id, ri.color_id,
                   p.name AS product_name, v.name AS variant_name,
                   sz.name AS size_name, c.name AS color_name, c.hex_value AS color_hex,
                   ri.quantity, ri.condition, si.price
            FROM tbl_return_items ri
            JOIN tbl_sales_items si ON si.id = ri.sale_item_id
            JOIN tbl_variants v ON v.id = ri.variant_id
            JOIN tbl_products p ON p.id = v.product_id
            LEFT JOIN tbl_sizes sz ON sz.id = ri.size_id
            LEFT JOIN tbl_colors c ON c.id = ri.color_id
            WHERE ri.return_id = $1 AND ri.archived_at IS NULL
            ORDER BY ri.id
            "#,
        )
        .bind(return_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("查询退货明细"))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn returnable_sales(
        &self,
        filter: &ReturnableSaleFilter,
        pagination: Pagination,
    ) -> AppResult<Vec<ReturnableSale>> {
        let mut qb = QueryBuilder::<Postgres>::new(RETURNABLE_SALE_COLUMNS);
        qb.push(FROM_RETURNABLE_SALES);
        Self::push_sale_filter(&mut qb, filter);
        qb.push(" ORDER BY s.created_at DESC, s.id DESC");
        push_page(&mut qb, pagination);

        let rows = qb
            .build_query_as::<ReturnableSaleRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("查询可退货销售单"))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn count_returnable_sales(&self, filter: &ReturnableSaleFilter) -> AppResult<u64> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
        qb.push(FROM_RETURNABLE_SALES);
        Self::push_sale_filter(&mut qb, filter);

        let total = qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("统计可退货销售单"))?;
        Ok(to_count(total))
    }

    async fn returnable_sale(&self, sale_id: i32, cashier: UserId) -> AppResult<Option<ReturnableSale>> {
        let mut qb = QueryBuilder::<Postgres>::new(RETURNABLE_SALE_COLUMNS);
        qb.push(FROM_RETURNABLE_SALES)
            .push(" AND s.id = ")
            .push_bind(sale_id)
            .push(" AND s.user_id = ")
            .push_bind(cashier.0);

        let row = qb
            .build_query_as::<ReturnableSaleRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("查询可退货销售单"))?;
        Ok(row.map(Into::into))
    }

    async fn returnable_items(&self, sale_id: i32) -> AppResult<Vec<ReturnableSaleItem>> {
        let rows: Vec<ReturnableItemRow> = sqlx::query_as(&format!(
            r#"
            SELECT si.id, si.sale_id, si.variant_id, si.size_id, si.color_id,
                   p.name AS product_name, v.name AS variant_name,
                   sz.name AS size_name, c.name AS color_name, c.hex_value AS color_hex,
                   si.quantity, si.price, si.subtotal, {} AS returned_quantity
            FROM tbl_sales_items si
            JOIN tbl_variants v ON v.id = si.variant_id
            JOIN tbl_products p ON p.id = v.product_id
            LEFT JOIN tbl_sizes sz ON sz.id = si.size_id
            LEFT JOIN tbl_colors c ON c.id = si.color_id
            WHERE si.sale_id = $1 AND si.archived_at IS NULL
            ORDER BY si.id
            "#,
            RETURNED_QUANTITY
        ))
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("查询可退货明细"))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn daily(&self, cashier: UserId, range: &DateRange) -> AppResult<Vec<DailyReturns>> {
        let return_date = utc_date("r.created_at");
        let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
        qb.push(&return_date)
            .push(
                r#" AS return_date, COUNT(*) AS count
            FROM tbl_returns r
            WHERE r.archived_at IS NULL AND r.user_id = "#,
            )
            .push_bind(cashier.0);
        push_date_range(&mut qb, &return_date, range);
        qb.push(" GROUP BY 1 ORDER BY 1");

        let rows = qb
            .build_query_as::<DailyReturnsRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("查询每日退货"))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter_sql(filter: &ReturnFilter) -> String {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
        qb.push(FROM_RETURNS);
        PostgresReturnRepository::push_filter(&mut qb, filter);
        qb.sql().to_string()
    }

    #[test]
    fn test_pending_list_scopes_seller_staff() {
        let sql = filter_sql(&ReturnFilter::pending_for(UserId(6)));
        assert!(sql.contains("(u.id = $1 OR u.user_id = $2)"));
        assert!(sql.contains("r.status = $3"));
    }

    #[test]
    fn test_cashier_report_filters_on_submitter() {
        let mut filter = ReturnFilter::new(ReturnOwner::Cashier(UserId(6)));
        filter.search = Some("RET-".to_string());
        let sql = filter_sql(&filter);
        assert!(sql.contains("r.user_id = $1"));
        assert!(sql.contains("r.return_number ILIKE $2 OR s.sale_number ILIKE $3"));
    }
}
