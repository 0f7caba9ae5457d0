//! 销售单的 PostgreSQL 实现

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sc_im::domain::NewStockOut;
use sc_im::infrastructure::insert_stock_out;
use softwear_adapter_postgres::{
    NumberSeries, TransactionManager, UTC_TODAY, db_error, push_date_range, push_page,
    push_search, to_count, utc_date,
};
use softwear_common::{DateRange, Pagination, UserId};
use softwear_errors::{AppError, AppResult};
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use tracing::debug;

use crate::domain::{
    CreatedSale, DailySales, HourlySales, NewSale, PaymentMethodStat, RecentTransaction,
    SaleFilter, SaleReport, SaleReportItem, SaleRepository, SalesDashboard, TopSellingProduct,
    sale_number, sale_stock_out_reason,
};

use super::rows::{
    DailySalesRow, DashboardRow, HourlySalesRow, MethodTotalRow, RecentTransactionRow,
    SaleReportItemRow, SaleReportRow, TopSellingRow,
};

const SALE_NUMBERS: NumberSeries = NumberSeries::new(0x5341_4c45, "tbl_sales", "sale_number");

/// 无收款记录时实收按应收、找零按 0
pub(super) const SALE_REPORT_COLUMNS: &str = r#"
    SELECT s.id, s.sale_number, s.amount, s.payment_type,
           COALESCE(p.amount_paid, s.amount) AS amount_paid,
           COALESCE(p.change_given, 0) AS change_given,
           p.reference_number,
           u.id AS cashier_id, u.name AS cashier_name, u.fname AS cashier_fname,
           u.lname AS cashier_lname, u.email AS cashier_email, s.created_at"#;

pub(super) const FROM_SALE_REPORTS: &str = r#"
    FROM tbl_sales s
    JOIN tbl_users u ON u.id = s.user_id
    LEFT JOIN tbl_payments p ON p.sale_id = s.id AND p.archived_at IS NULL
    WHERE s.archived_at IS NULL AND s.status = 'Completed'"#;

const SEARCH_COLUMNS: [&str; 1] = ["s.sale_number"];

pub struct PostgresSaleRepository {
    pool: PgPool,
    tx_manager: TransactionManager,
}

impl PostgresSaleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            tx_manager: TransactionManager::new(pool.clone()),
            pool,
        }
    }

    /// 卖家本人或其员工开的单
    pub(super) fn push_seller(qb: &mut QueryBuilder<'_, Postgres>, seller: UserId) {
        if seller.is_any() {
            return;
        }
        qb.push(" AND (u.id = ")
            .push_bind(seller.0)
            .push(" OR u.user_id = ")
            .push_bind(seller.0)
            .push(")");
    }

    fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &SaleFilter) {
        Self::push_seller(qb, filter.seller);
        if !filter.cashier.is_any() {
            qb.push(" AND s.user_id = ").push_bind(filter.cashier.0);
        }
        push_search(qb, &SEARCH_COLUMNS, filter.search.as_deref());
        push_date_range(qb, &utc_date("s.created_at"), &filter.range);
        if filter.only_approved_days {
            qb.push(" AND EXISTS (SELECT 1 FROM tbl_daily_sales_verifications dsv")
                .push(" WHERE dsv.cashier_user_id = s.user_id AND dsv.sale_date = ")
                .push(utc_date("s.created_at"))
                .push(" AND dsv.status = 'Approved' AND dsv.archived_at IS NULL)");
        }
    }

    /// 今天（UTC）未归档销售数 + 1
    async fn next_sale_number(conn: &mut PgConnection) -> AppResult<String> {
        SALE_NUMBERS.lock(conn).await?;

        let sql = format!(
            "SELECT COUNT(*) FROM tbl_sales WHERE archived_at IS NULL AND {} = {}",
            utc_date("created_at"),
            UTC_TODAY
        );
        let existing: i64 = sqlx::query_scalar(&sql)
            .fetch_one(&mut *conn)
            .await
            .map_err(db_error("统计今日销售单"))?;

        let today = Utc::now().date_naive();
        SALE_NUMBERS
            .first_free(conn, existing + 1, |seq| sale_number(today, seq))
            .await
    }

    /// 收银员所属卖家；卖家本人开单时为自己
    async fn seller_of(conn: &mut PgConnection, cashier: UserId) -> AppResult<UserId> {
        let owner: Option<Option<i32>> = sqlx::query_scalar(
            r#"
            SELECT CASE WHEN r.name = 'seller' THEN u.id ELSE u.user_id END
            FROM tbl_users u
            JOIN tbl_roles r ON r.id = u.role_id
            WHERE u.id = $1 AND u.archived_at IS NULL
            "#,
        )
        .bind(cashier.0)
        .fetch_optional(conn)
        .await
        .map_err(db_error("查询收银员所属卖家"))?;

        match owner {
            Some(seller) => Ok(UserId(seller.unwrap_or(cashier.0))),
            None => Err(AppError::not_found(format!("收银员 {} 不存在", cashier.0))),
        }
    }
}

#[async_trait]
impl SaleRepository for PostgresSaleRepository {
    async fn insert(&self, sale: &NewSale) -> AppResult<CreatedSale> {
        let mut tx = self.tx_manager.begin().await?;

        let seller = Self::seller_of(&mut tx, sale.cashier).await?;
        let number = Self::next_sale_number(&mut tx).await?;
        let total = sale.total();

        let sale_id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO tbl_sales (sale_number, amount, payment_type, status, user_id, created_at)
            VALUES ($1, $2, $3, 'Completed', $4, NOW())
            RETURNING id
            "#,
        )
        .bind(&number)
        .bind(total)
        .bind(sale.payment_method.as_str())
        .bind(sale.cashier.0)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("新增销售单"))?;

        let mut items = QueryBuilder::<Postgres>::new(
            "INSERT INTO tbl_sales_items (sale_id, variant_id, size_id, color_id, quantity, price, subtotal) ",
        );
        items.push_values(&sale.lines, |mut b, line| {
            b.push_bind(sale_id)
                .push_bind(line.key.variant_id)
                .push_bind(line.key.size_id)
                .push_bind(line.key.color_id)
                .push_bind(line.quantity)
                .push_bind(line.price)
                .push_bind(line.subtotal());
        });
        items
            .build()
            .execute(&mut *tx)
            .await
            .map_err(db_error("新增销售明细"))?;

        let reason = sale_stock_out_reason(&number);
        for line in &sale.lines {
            let owner: i32 =
                sqlx::query_scalar("SELECT COALESCE(user_id, $2) FROM tbl_variants WHERE id = $1")
                    .bind(line.key.variant_id)
                    .bind(sale.cashier.0)
                    .fetch_one(&mut *tx)
                    .await
                    .map_err(db_error("查询款式所属卖家"))?;

            let stock_out = NewStockOut {
                user_id: UserId(owner),
                key: line.key,
                quantity: line.quantity,
                reason: Some(reason.clone()),
            };
            insert_stock_out(&mut tx, &stock_out).await?;
            debug!(sale_id, variant_id = line.key.variant_id, quantity = line.quantity, "Sale line stocked out");
        }

        sqlx::query(
            r#"
            INSERT INTO tbl_payments (sale_id, amount_paid, payment_method, change_given, reference_number, created_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            "#,
        )
        .bind(sale_id)
        .bind(sale.amount_paid)
        .bind(sale.payment_method.as_str())
        .bind(sale.change_given)
        .bind(&sale.reference_number)
        .execute(&mut *tx)
        .await
        .map_err(db_error("新增收款记录"))?;

        TransactionManager::commit(tx).await?;
        Ok(CreatedSale {
            id: sale_id,
            sale_number: number,
            seller,
            total,
        })
    }

    async fn list(&self, filter: &SaleFilter, pagination: Pagination) -> AppResult<Vec<SaleReport>> {
        let mut qb = QueryBuilder::<Postgres>::new(SALE_REPORT_COLUMNS);
        qb.push(FROM_SALE_REPORTS);
        Self::push_filter(&mut qb, filter);
        qb.push(" ORDER BY s.created_at DESC, s.id DESC");
        push_page(&mut qb, pagination);

        let rows = qb
            .build_query_as::<SaleReportRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("查询销售报表"))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn count(&self, filter: &SaleFilter) -> AppResult<u64> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
        qb.push(FROM_SALE_REPORTS);
        Self::push_filter(&mut qb, filter);

        let total = qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("统计销售单数量"))?;
        Ok(to_count(total))
    }

    async fn find(&self, sale_id: i32, seller: UserId) -> AppResult<Option<SaleReport>> {
        let mut qb = QueryBuilder::<Postgres>::new(SALE_REPORT_COLUMNS);
        qb.push(FROM_SALE_REPORTS)
            .push(" AND s.id = ")
            .push_bind(sale_id);
        Self::push_seller(&mut qb, seller);

        let row = qb
            .build_query_as::<SaleReportRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("查询销售单"))?;
        Ok(row.map(Into::into))
    }

    async fn items(&self, sale_id: i32) -> AppResult<Vec<SaleReportItem>> {
        let rows: Vec<SaleReportItemRow> = sqlx::query_as(
            r#"
            SELECT si.id, si.sale_id, si.variant_id, si.size_id, si.color_id,
                   p.name AS product_name, v.name AS variant_name,
                   sz.name AS size_name, c.name AS color_name, c.hex_value AS color_hex,
                   si.quantity, si.price, si.subtotal
            FROM tbl_sales_items si
            JOIN tbl_variants v ON v.id = si.variant_id
            JOIN tbl_products p ON p.id = v.product_id
            LEFT JOIN tbl_sizes sz ON sz.id = si.size_id
            LEFT JOIN tbl_colors c ON c.id = si.color_id
            WHERE si.sale_id = $1 AND si.archived_at IS NULL
            ORDER BY si.id
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("查询销售明细"))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn dashboard(&self, cashier: UserId) -> AppResult<SalesDashboard> {
        let sql = format!(
            r#"
            WITH sales AS (
                SELECT COUNT(*) AS total_sales,
                       COALESCE(SUM(amount), 0) AS total_revenue,
                       COUNT(*) FILTER (WHERE {sale_date} = {today}) AS today_sales,
                       COALESCE(SUM(amount) FILTER (WHERE {sale_date} = {today}), 0) AS today_revenue
                FROM tbl_sales
                WHERE archived_at IS NULL AND status = 'Completed' AND user_id = $1
            ), returns AS (
                SELECT COUNT(*) AS total_returns,
                       COUNT(*) FILTER (WHERE {return_date} = {today}) AS today_returns
                FROM tbl_returns
                WHERE archived_at IS NULL AND user_id = $1
            )
            SELECT sales.*, returns.* FROM sales, returns
            "#,
            sale_date = utc_date("created_at"),
            return_date = utc_date("created_at"),
            today = UTC_TODAY,
        );

        let row: DashboardRow = sqlx::query_as(&sql)
            .bind(cashier.0)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("查询销售看板"))?;
        Ok(row.into())
    }

    async fn daily(&self, cashier: UserId, range: &DateRange) -> AppResult<Vec<DailySales>> {
        let sale_date = utc_date("s.created_at");
        let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
        qb.push(&sale_date)
            .push(
                r#" AS sale_date, COUNT(*) AS count, COALESCE(SUM(s.amount), 0) AS amount
            FROM tbl_sales s
            WHERE s.archived_at IS NULL AND s.status = 'Completed' AND s.user_id = "#,
            )
            .push_bind(cashier.0);
        push_date_range(&mut qb, &sale_date, range);
        qb.push(" GROUP BY 1 ORDER BY 1");

        let rows = qb
            .build_query_as::<DailySalesRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("查询每日销售"))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn top_selling(&self, cashier: UserId, limit: i64) -> AppResult<Vec<TopSellingProduct>> {
        let rows: Vec<TopSellingRow> = sqlx::query_as(
            r#"
            SELECT v.product_id, si.variant_id, p.name AS product_name, v.name AS variant_name,
                   SUM(si.quantity)::BIGINT AS total_quantity,
                   COALESCE(SUM(si.subtotal), 0) AS total_revenue,
                   COUNT(DISTINCT si.sale_id) AS sale_count
            FROM tbl_sales_items si
            JOIN tbl_sales s ON s.id = si.sale_id
            JOIN tbl_variants v ON v.id = si.variant_id
            JOIN tbl_products p ON p.id = v.product_id
            WHERE s.archived_at IS NULL AND s.status = 'Completed'
              AND si.archived_at IS NULL AND s.user_id = $1
            GROUP BY v.product_id, si.variant_id, p.name, v.name
            ORDER BY total_quantity DESC, total_revenue DESC
            LIMIT $2
            "#,
        )
        .bind(cashier.0)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("查询畅销商品"))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn payment_methods(&self, cashier: UserId) -> AppResult<Vec<PaymentMethodStat>> {
        let rows: Vec<MethodTotalRow> = sqlx::query_as(
            r#"
            SELECT s.payment_type AS payment_method, COUNT(*) AS count,
                   COALESCE(SUM(s.amount), 0) AS total_amount
            FROM tbl_sales s
            WHERE s.archived_at IS NULL AND s.status = 'Completed' AND s.user_id = $1
            GROUP BY s.payment_type
            "#,
        )
        .bind(cashier.0)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("统计收款方式"))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn recent(&self, cashier: UserId, limit: i64) -> AppResult<Vec<RecentTransaction>> {
        let rows: Vec<RecentTransactionRow> = sqlx::query_as(
            r#"
            SELECT s.id, s.sale_number, s.amount, s.payment_type, s.created_at
            FROM tbl_sales s
            WHERE s.archived_at IS NULL AND s.status = 'Completed' AND s.user_id = $1
            ORDER BY s.created_at DESC, s.id DESC
            LIMIT $2
            "#,
        )
        .bind(cashier.0)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("查询最近交易"))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn hourly_today(&self, cashier: UserId) -> AppResult<Vec<HourlySales>> {
        let sql = format!(
            r#"
            SELECT EXTRACT(HOUR FROM s.created_at AT TIME ZONE 'UTC')::INTEGER AS hour,
                   COUNT(*) AS count, COALESCE(SUM(s.amount), 0) AS amount
            FROM tbl_sales s
            WHERE s.archived_at IS NULL AND s.status = 'Completed' AND s.user_id = $1
              AND {} = {}
            GROUP BY 1
            ORDER BY 1
            "#,
            utc_date("s.created_at"),
            UTC_TODAY
        );

        let rows: Vec<HourlySalesRow> = sqlx::query_as(&sql)
            .bind(cashier.0)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("查询分时销售"))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn average_amount(&self, cashier: UserId) -> AppResult<Decimal> {
        sqlx::query_scalar(
            r#"
            SELECT COALESCE(ROUND(AVG(s.amount), 2), 0)
            FROM tbl_sales s
            WHERE s.archived_at IS NULL AND s.status = 'Completed' AND s.user_id = $1
            "#,
        )
        .bind(cashier.0)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("计算平均客单价"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter_sql(filter: &SaleFilter) -> String {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
        qb.push(FROM_SALE_REPORTS);
        PostgresSaleRepository::push_filter(&mut qb, filter);
        qb.sql().to_string()
    }

    #[test]
    fn test_all_cashiers_only_scopes_seller() {
        let sql = filter_sql(&SaleFilter::new(UserId(2)));
        assert!(sql.contains("(u.id = $1 OR u.user_id = $2)"));
        assert!(!sql.contains("s.user_id = $"));
        assert!(!sql.contains("tbl_daily_sales_verifications"));
    }

    #[test]
    fn test_approved_days_filter_matches_cashier_and_date() {
        let mut filter = SaleFilter::new(UserId(2));
        filter.cashier = UserId(8);
        filter.only_approved_days = true;
        let sql = filter_sql(&filter);
        assert!(sql.contains("s.user_id = $3"));
        assert!(sql.contains("dsv.sale_date = (s.created_at AT TIME ZONE 'UTC')::date"));
        assert!(sql.contains("dsv.status = 'Approved'"));
    }
}
