//! 损益与现金流水查询
//!
//! 销售、退货、管理费都按原销售的 UTC 日期归入区间。

use async_trait::async_trait;
use rust_decimal::Decimal;
use softwear_adapter_postgres::{db_error, push_date_range, utc_date};
use softwear_common::UserId;
use softwear_errors::AppResult;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::domain::{
    CashMovement, CashflowFilter, CashierSales, CategorySales, IncomeFilter, PaymentMethodSales,
    ReportRepository, SalesFigures,
};

use super::rows::{CashierSalesRow, CategorySalesRow, MethodSalesRow, MovementRow, SalesTotalsRow};

/// 已完成销售；表别名 s、u（收银员）
const FROM_SALES: &str = r#"
    FROM tbl_sales s
    JOIN tbl_users u ON u.id = s.user_id
    WHERE s.archived_at IS NULL AND s.status = 'Completed'"#;

/// 已完成销售的明细；表别名 si、s、u、v
const FROM_SALE_ITEMS: &str = r#"
    FROM tbl_sales_items si
    JOIN tbl_sales s ON s.id = si.sale_id
    JOIN tbl_users u ON u.id = s.user_id
    JOIN tbl_variants v ON v.id = si.variant_id"#;

const CASHIER_NAME_COLUMNS: &str = "u.id AS cashier_id, u.name AS cashier_name, u.fname AS cashier_fname, u.lname AS cashier_lname, u.email AS cashier_email";

/// 无收款记录时按应收；现金按实收减找零
const METHOD_EXPR: &str = "COALESCE(p.payment_method, s.payment_type)";
const CASH_AMOUNT_EXPR: &str = "CASE WHEN p.id IS NULL THEN s.amount ELSE p.amount_paid - p.change_given END";

pub struct PostgresReportRepository {
    pool: PgPool,
}

impl PostgresReportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn push_seller(qb: &mut QueryBuilder<'_, Postgres>, seller: UserId) {
        qb.push(" AND (u.id = ")
            .push_bind(seller.0)
            .push(" OR u.user_id = ")
            .push_bind(seller.0)
            .push(")");
    }

    fn push_approved_day(qb: &mut QueryBuilder<'_, Postgres>, sale_date: &str) {
        qb.push(" EXISTS (SELECT 1 FROM tbl_daily_sales_verifications dsv")
            .push(" WHERE dsv.cashier_user_id = s.user_id AND dsv.sale_date = ")
            .push(sale_date)
            .push(" AND dsv.status = 'Approved' AND dsv.archived_at IS NULL)");
    }

    /// 卖家、销售日期区间与对账日期条件，作用于别名 s、u
    fn push_sale_scope(qb: &mut QueryBuilder<'_, Postgres>, filter: &IncomeFilter) {
        Self::push_seller(qb, filter.seller);
        let sale_date = utc_date("s.created_at");
        push_date_range(qb, &sale_date, &filter.range);
        if filter.approved_days_only {
            qb.push(" AND");
            Self::push_approved_day(qb, &sale_date);
        }
    }

    fn sales_query(select: &str, filter: &IncomeFilter) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::<Postgres>::new(select);
        qb.push(FROM_SALES);
        Self::push_sale_scope(&mut qb, filter);
        qb
    }

    fn items_query(select: &str, joins: &str, filter: &IncomeFilter) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::<Postgres>::new(select);
        qb.push(FROM_SALE_ITEMS).push(joins).push(
            " WHERE si.archived_at IS NULL AND s.archived_at IS NULL AND s.status = 'Completed'",
        );
        Self::push_sale_scope(&mut qb, filter);
        qb
    }

    fn returns_query(filter: &IncomeFilter) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::<Postgres>::new(
            r#"
            SELECT COALESCE(SUM(ri.quantity * si.price), 0)
            FROM tbl_return_items ri
            JOIN tbl_returns r ON r.id = ri.return_id
            JOIN tbl_sales_items si ON si.id = ri.sale_item_id
            JOIN tbl_sales s ON s.id = r.sale_id
            JOIN tbl_users u ON u.id = s.user_id
            WHERE ri.archived_at IS NULL AND r.archived_at IS NULL AND r.status = 'Approved'
              AND s.archived_at IS NULL AND s.status = 'Completed'"#,
        );
        Self::push_sale_scope(&mut qb, filter);
        qb
    }

    /// 冲销记录金额为负，合计即净额；无关联销售时按记录日期
    fn admin_fee_query(filter: &IncomeFilter) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::<Postgres>::new(
            r#"
            SELECT COALESCE(SUM(st.admin_fee_amount), 0)
            FROM tbl_subscription_transactions st
            LEFT JOIN tbl_sales s ON s.id = st.sale_id
            WHERE st.transaction_type IN ('AdminFee', 'AdminFeeReversal') AND st.seller_user_id = "#,
        );
        qb.push_bind(filter.seller.0);
        push_date_range(
            &mut qb,
            &utc_date("COALESCE(s.created_at, st.created_at)"),
            &filter.range,
        );
        if filter.approved_days_only {
            qb.push(" AND (s.id IS NULL OR");
            Self::push_approved_day(&mut qb, &utc_date("s.created_at"));
            qb.push(")");
        }
        qb
    }

    fn movements_query(filter: &CashflowFilter) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM (");

        // 现金销售
        qb.push(format!(
            "SELECT s.created_at AS occurred_at, {CASHIER_NAME_COLUMNS}, 'Sale' AS category, \
             'Cash Sale' AS source, s.sale_number AS reference, {CASH_AMOUNT_EXPR} AS amount, \
             1 AS source_order \
             FROM tbl_sales s JOIN tbl_users u ON u.id = s.user_id \
             LEFT JOIN tbl_payments p ON p.sale_id = s.id AND p.archived_at IS NULL \
             WHERE s.archived_at IS NULL AND s.status = 'Completed' AND {METHOD_EXPR} = 'Cash'"
        ));
        Self::push_seller(&mut qb, filter.seller);
        Self::push_movement_scope(&mut qb, filter, "s.user_id", &utc_date("s.created_at"));

        // 已批准退款，按批准时间
        qb.push(format!(
            " UNION ALL SELECT COALESCE(r.updated_at, r.created_at), {CASHIER_NAME_COLUMNS}, \
             'Refund', 'Refund', r.return_number, \
             (SELECT COALESCE(SUM(ri.quantity * si.price), 0) FROM tbl_return_items ri \
              JOIN tbl_sales_items si ON si.id = ri.sale_item_id \
              WHERE ri.return_id = r.id AND ri.archived_at IS NULL), 2 \
             FROM tbl_returns r JOIN tbl_users u ON u.id = r.user_id \
             WHERE r.archived_at IS NULL AND r.status = 'Approved'"
        ));
        Self::push_seller(&mut qb, filter.seller);
        Self::push_movement_scope(
            &mut qb,
            filter,
            "r.user_id",
            &utc_date("COALESCE(r.updated_at, r.created_at)"),
        );

        // 费用
        qb.push(format!(
            " UNION ALL SELECT e.expense_date::timestamp AT TIME ZONE 'UTC', {CASHIER_NAME_COLUMNS}, \
             'Expense', e.expense_type, 'EXP-' || e.id, e.amount, 3 \
             FROM tbl_expenses e JOIN tbl_users u ON u.id = e.created_by \
             WHERE e.archived_at IS NULL AND e.seller_user_id = "
        ));
        qb.push_bind(filter.seller.0);
        Self::push_movement_scope(&mut qb, filter, "e.created_by", "e.expense_date");

        // 现金供应商付款
        qb.push(format!(
            " UNION ALL SELECT sp.payment_date::timestamp AT TIME ZONE 'UTC', {CASHIER_NAME_COLUMNS}, \
             'SupplierPayment', 'Supplier Payment', \
             COALESCE(NULLIF(po.po_number, ''), sp.stock_in_group_key, 'SUPPAY-' || sp.id), \
             sp.amount_paid, 4 \
             FROM tbl_supplier_payments sp JOIN tbl_users u ON u.id = sp.created_by \
             LEFT JOIN tbl_purchase_orders po ON po.id = sp.po_id \
             WHERE sp.archived_at IS NULL AND sp.payment_method = 'Cash' AND sp.seller_user_id = "
        ));
        qb.push_bind(filter.seller.0);
        Self::push_movement_scope(&mut qb, filter, "sp.created_by", "sp.payment_date");

        qb.push(") m WHERE m.amount > 0 ORDER BY m.occurred_at, m.source_order");
        qb
    }

    fn push_movement_scope(
        qb: &mut QueryBuilder<'_, Postgres>,
        filter: &CashflowFilter,
        cashier_column: &str,
        date_expr: &str,
    ) {
        if let Some(cashier) = filter.cashier {
            qb.push(" AND ")
                .push(cashier_column)
                .push(" = ")
                .push_bind(cashier.0);
        }
        push_date_range(qb, date_expr, &filter.range);
    }
}

#[async_trait]
impl ReportRepository for PostgresReportRepository {
    async fn sales_figures(&self, filter: &IncomeFilter) -> AppResult<SalesFigures> {
        let totals = Self::sales_query(
            "SELECT COALESCE(SUM(s.amount), 0) AS gross_sales, COUNT(*) AS transaction_count",
            filter,
        )
        .build_query_as::<SalesTotalsRow>()
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("统计销售额"))?;

        let cost_of_goods_sold = Self::items_query(
            "SELECT COALESCE(SUM(si.quantity * COALESCE(v.cost_price, 0)), 0)",
            "",
            filter,
        )
        .build_query_scalar::<Decimal>()
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("统计销货成本"))?;

        let approved_returns = Self::returns_query(filter)
            .build_query_scalar::<Decimal>()
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("统计已批准退货"))?;

        let admin_fees = Self::admin_fee_query(filter)
            .build_query_scalar::<Decimal>()
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("统计管理费"))?;

        Ok(SalesFigures {
            gross_sales: totals.gross_sales,
            transaction_count: totals.transaction_count,
            approved_returns,
            cost_of_goods_sold,
            admin_fees,
        })
    }

    async fn sales_by_cashier(&self, filter: &IncomeFilter) -> AppResult<Vec<CashierSales>> {
        let mut qb = Self::sales_query(
            &format!(
                "SELECT {CASHIER_NAME_COLUMNS}, COUNT(*) AS transaction_count, \
                 COALESCE(SUM(s.amount), 0) AS total_sales"
            ),
            filter,
        );
        qb.push(" GROUP BY u.id, u.name, u.fname, u.lname, u.email ORDER BY total_sales DESC, u.id");

        let rows = qb
            .build_query_as::<CashierSalesRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("按收银员统计销售"))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn sales_by_category(&self, filter: &IncomeFilter) -> AppResult<Vec<CategorySales>> {
        let mut qb = Self::items_query(
            r#"SELECT COALESCE(c.name, 'Uncategorized') AS category_name,
                      COALESCE(SUM(si.quantity), 0)::BIGINT AS quantity,
                      COALESCE(SUM(si.subtotal), 0) AS total_sales"#,
            r#"
            JOIN tbl_products pr ON pr.id = v.product_id
            LEFT JOIN tbl_categories c ON c.id = pr.category_id"#,
            filter,
        );
        qb.push(" GROUP BY 1 ORDER BY total_sales DESC, category_name");

        let rows = qb
            .build_query_as::<CategorySalesRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("按类别统计销售"))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn sales_by_payment_method(
        &self,
        filter: &IncomeFilter,
    ) -> AppResult<Vec<PaymentMethodSales>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {METHOD_EXPR} AS payment_method, COUNT(*) AS transaction_count, \
             COALESCE(SUM(CASE WHEN {METHOD_EXPR} = 'Cash' THEN {CASH_AMOUNT_EXPR} ELSE s.amount END), 0) \
             AS total_amount \
             FROM tbl_sales s JOIN tbl_users u ON u.id = s.user_id \
             LEFT JOIN tbl_payments p ON p.sale_id = s.id AND p.archived_at IS NULL \
             WHERE s.archived_at IS NULL AND s.status = 'Completed'"
        ));
        Self::push_sale_scope(&mut qb, filter);
        qb.push(" GROUP BY 1 ORDER BY total_amount DESC, payment_method");

        let rows = qb
            .build_query_as::<MethodSalesRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("按付款方式统计销售"))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn cash_movements(&self, filter: &CashflowFilter) -> AppResult<Vec<CashMovement>> {
        let rows = Self::movements_query(filter)
            .build_query_as::<MovementRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("查询现金流水"))?;
        rows.into_iter().map(CashMovement::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use softwear_common::DateRange;

    fn filter() -> IncomeFilter {
        IncomeFilter {
            seller: UserId(3),
            range: DateRange::between(
                NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
                NaiveDate::from_ymd_opt(2025, 9, 30).unwrap(),
            ),
            approved_days_only: true,
        }
    }

    #[test]
    fn test_sales_scope_with_approved_days() {
        let qb = PostgresReportRepository::sales_query("SELECT COUNT(*)", &filter());
        let sql = qb.sql();
        assert!(sql.contains("(u.id = $1 OR u.user_id = $2)"));
        assert!(sql.contains("(s.created_at AT TIME ZONE 'UTC')::date >= $3"));
        assert!(sql.contains("AND EXISTS (SELECT 1 FROM tbl_daily_sales_verifications dsv"));
    }

    #[test]
    fn test_admin_fees_include_reversals() {
        let qb = PostgresReportRepository::admin_fee_query(&filter());
        let sql = qb.sql();
        assert!(sql.contains("IN ('AdminFee', 'AdminFeeReversal')"));
        assert!(sql.contains("st.seller_user_id = $1"));
        assert!(sql.contains("(s.id IS NULL OR EXISTS"));
    }

    #[test]
    fn test_movements_cover_four_sources() {
        let qb = PostgresReportRepository::movements_query(&CashflowFilter {
            seller: UserId(3),
            cashier: Some(UserId(6)),
            range: DateRange::default(),
        });
        let sql = qb.sql();
        assert_eq!(sql.matches("UNION ALL").count(), 3);
        assert!(sql.contains("s.user_id = $3"));
        assert!(sql.contains("r.user_id = $6"));
        assert!(sql.contains("e.seller_user_id = $7 AND e.created_by = $8"));
        assert!(sql.contains("sp.seller_user_id = $9 AND sp.created_by = $10"));
        assert!(sql.ends_with("ORDER BY m.occurred_at, m.source_order"));
    }
}
