//! 应付与供应商付款的 PostgreSQL 实现

use async_trait::async_trait;
use rust_decimal::Decimal;
use softwear_adapter_postgres::{TransactionManager, db_error, push_date_range, push_search, utc_date};
use softwear_common::{DateRange, ReceiptImage, UserId};
use softwear_errors::AppResult;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use tracing::debug;

use crate::domain::{
    NewSupplierPayment, Payable, PayableFilter, PayableRepository, PaymentTarget, StockGroupKey,
    SupplierPayment, check_amount,
};

use super::rows::{BalanceRow, GroupPayableRow, InvoiceBalanceRow, OrderPayableRow, PaymentRow};

const ORDER_SEARCH_COLUMNS: [&str; 3] = ["po.po_number", "sup.company_name", "po.notes"];
const GROUP_SEARCH_COLUMNS: [&str; 1] = ["sup.company_name"];

/// 同一分组的付款串行校验余额
const GROUP_LOCK_CLASS: i32 = 0x4150_5347;

const ORDER_PAYABLE_COLUMNS: &str = r#"
    SELECT po.id AS po_id, po.po_number, po.supplier_id, sup.company_name AS supplier_name,
           (po.created_at AT TIME ZONE 'UTC')::date AS invoice_date,
           po.total_amount, po.notes AS description, po.created_at,
           u.name AS creator_name, u.fname AS creator_fname, u.lname AS creator_lname,
           u.email AS creator_email,
           COALESCE((SELECT SUM(sp.amount_paid) FROM tbl_supplier_payments sp
                     WHERE sp.po_id = po.id AND sp.archived_at IS NULL), 0) AS total_paid
    FROM tbl_purchase_orders po
    JOIN tbl_suppliers sup ON sup.id = po.supplier_id
    JOIN tbl_users u ON u.id = po.created_by
    WHERE po.archived_at IS NULL AND po.status = 'Completed' AND sup.user_id = "#;

/// 不经采购订单的入库；表别名 si、sup、v
const FROM_STOCK_GROUPS: &str = r#"
    FROM tbl_stock_in si
    JOIN tbl_suppliers sup ON sup.id = si.supplier_id
    JOIN tbl_variants v ON v.id = si.variant_id
    WHERE si.archived_at IS NULL AND si.po_id IS NULL AND v.user_id = "#;

const GROUP_KEY_EXPR: &str = "'STOCK-' || to_char(g.invoice_date, 'YYYYMMDD') || '-' || g.supplier_id";

const PAYMENT_COLUMNS: &str = r#"
    SELECT sp.id, sp.invoice_id, sp.po_id, sp.stock_in_group_key,
           COALESCE(po.po_number, sp.stock_in_group_key, inv.invoice_number, '') AS invoice_number,
           sp.amount_paid, sp.payment_method, sp.payment_date, sp.reference_number, sp.notes,
           sp.receipt_image_base64, sp.receipt_image_content_type, sp.created_at, sp.created_by,
           u.name AS creator_name, u.fname AS creator_fname, u.lname AS creator_lname,
           u.email AS creator_email
    FROM tbl_supplier_payments sp
    JOIN tbl_users u ON u.id = sp.created_by
    LEFT JOIN tbl_purchase_orders po ON po.id = sp.po_id
    LEFT JOIN tbl_supplier_invoices inv ON inv.id = sp.invoice_id
    WHERE sp.archived_at IS NULL AND sp.seller_user_id = "#;

pub struct PostgresPayableRepository {
    pool: PgPool,
    tx_manager: TransactionManager,
}

impl PostgresPayableRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            tx_manager: TransactionManager::new(pool.clone()),
            pool,
        }
    }

    fn order_query(filter: &PayableFilter, po_id: Option<i32>) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::<Postgres>::new(ORDER_PAYABLE_COLUMNS);
        qb.push_bind(filter.seller.0);
        if let Some(po_id) = po_id {
            qb.push(" AND po.id = ").push_bind(po_id);
        }
        if let Some(supplier_id) = filter.supplier_id {
            qb.push(" AND po.supplier_id = ").push_bind(supplier_id);
        }
        push_search(&mut qb, &ORDER_SEARCH_COLUMNS, filter.search.as_deref());
        push_date_range(&mut qb, &utc_date("po.created_at"), &filter.range);
        qb
    }

    fn group_query(filter: &PayableFilter) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::<Postgres>::new("WITH groups AS (SELECT ");
        qb.push(utc_date("si.created_at")).push(
            r#" AS invoice_date, si.supplier_id, sup.company_name AS supplier_name,
                   SUM(si.quantity_added * si.cost_price) AS total_amount,
                   COUNT(*) AS line_count, MIN(si.created_at) AS created_at"#,
        );
        qb.push(FROM_STOCK_GROUPS).push_bind(filter.seller.0);
        if let Some(supplier_id) = filter.supplier_id {
            qb.push(" AND si.supplier_id = ").push_bind(supplier_id);
        }
        push_search(&mut qb, &GROUP_SEARCH_COLUMNS, filter.search.as_deref());
        push_date_range(&mut qb, &utc_date("si.created_at"), &filter.range);
        qb.push(
            r#" GROUP BY 1, 2, 3)
            SELECT g.invoice_date, g.supplier_id, g.supplier_name, g.total_amount, g.line_count,
                   g.created_at,
                   COALESCE((SELECT SUM(sp.amount_paid) FROM tbl_supplier_payments sp
                             WHERE sp.archived_at IS NULL AND sp.seller_user_id = "#,
        );
        qb.push_bind(filter.seller.0)
            .push(" AND sp.stock_in_group_key = ")
            .push(GROUP_KEY_EXPR)
            .push("), 0) AS total_paid FROM groups g");
        qb
    }

    async fn paid(conn: &mut PgConnection, column: &str, target: PaidBy) -> AppResult<Decimal> {
        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT COALESCE(SUM(amount_paid), 0) FROM tbl_supplier_payments WHERE archived_at IS NULL AND ",
        );
        qb.push(column).push(" = ");
        match target {
            PaidBy::Id(id) => qb.push_bind(id),
            PaidBy::Key(key, seller) => qb
                .push_bind(key.to_string())
                .push(" AND seller_user_id = ")
                .push_bind(seller.0),
        };
        qb.build_query_scalar::<Decimal>()
            .fetch_one(conn)
            .await
            .map_err(db_error("统计已付金额"))
    }

    /// 锁定付款对象并返回 (余额, 发票, 分组键)；对象不可用时为 None
    async fn lock_target(
        conn: &mut PgConnection,
        payment: &NewSupplierPayment,
    ) -> AppResult<Option<(BalanceRow, Option<i32>, Option<String>)>> {
        let seller = payment.seller;
        match payment.target {
            PaymentTarget::PurchaseOrder(po_id) => {
                let total: Option<Decimal> = sqlx::query_scalar(
                    r#"
                    SELECT po.total_amount
                    FROM tbl_purchase_orders po
                    JOIN tbl_suppliers sup ON sup.id = po.supplier_id
                    WHERE po.id = $1 AND po.status = 'Completed' AND po.archived_at IS NULL
                      AND sup.user_id = $2
                    FOR UPDATE OF po
                    "#,
                )
                .bind(po_id)
                .bind(seller.0)
                .fetch_optional(&mut *conn)
                .await
                .map_err(db_error("锁定采购订单"))?;
                let Some(total_amount) = total else {
                    return Ok(None);
                };
                let total_paid = Self::paid(conn, "po_id", PaidBy::Id(po_id)).await?;
                Ok(Some((BalanceRow { total_amount, total_paid }, None, None)))
            }
            PaymentTarget::StockGroup(key) => {
                sqlx::query("SELECT pg_advisory_xact_lock($1, hashtext($2))")
                    .bind(GROUP_LOCK_CLASS)
                    .bind(key.to_string())
                    .execute(&mut *conn)
                    .await
                    .map_err(db_error("锁定入库分组"))?;

                let (total_amount, lines) = Self::group_total(&mut *conn, key, seller).await?;
                if lines == 0 {
                    return Ok(None);
                }
                let total_paid =
                    Self::paid(&mut *conn, "stock_in_group_key", PaidBy::Key(key, seller)).await?;
                let invoice_id = Self::group_invoice(conn, payment, key, total_amount, lines).await?;
                Ok(Some((
                    BalanceRow { total_amount, total_paid },
                    Some(invoice_id),
                    Some(key.to_string()),
                )))
            }
            PaymentTarget::Invoice(invoice_id) => {
                let invoice: Option<InvoiceBalanceRow> = sqlx::query_as(
                    r#"
                    SELECT inv.invoice_number, inv.source_type, inv.total_amount,
                           COALESCE((SELECT SUM(sp.amount_paid) FROM tbl_supplier_payments sp
                                     WHERE sp.invoice_id = inv.id AND sp.archived_at IS NULL), 0)
                               AS total_paid
                    FROM tbl_supplier_invoices inv
                    WHERE inv.id = $1 AND inv.seller_user_id = $2 AND inv.archived_at IS NULL
                    FOR UPDATE
                    "#,
                )
                .bind(invoice_id)
                .bind(seller.0)
                .fetch_optional(&mut *conn)
                .await
                .map_err(db_error("锁定供应商发票"))?;
                Ok(invoice.map(|inv| {
                    // 散装入库发票的付款同时计入分组
                    let group_key = (inv.source_type == "StockIn").then_some(inv.invoice_number);
                    (inv.balance, Some(invoice_id), group_key)
                }))
            }
        }
    }

    async fn group_total(
        conn: &mut PgConnection,
        key: StockGroupKey,
        seller: UserId,
    ) -> AppResult<(Decimal, i64)> {
        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT COALESCE(SUM(si.quantity_added * si.cost_price), 0), COUNT(*)",
        );
        qb.push(FROM_STOCK_GROUPS)
            .push_bind(seller.0)
            .push(" AND si.supplier_id = ")
            .push_bind(key.supplier_id);
        push_date_range(
            &mut qb,
            &utc_date("si.created_at"),
            &DateRange::between(key.date, key.date),
        );
        qb.build_query_as::<(Decimal, i64)>()
            .fetch_one(conn)
            .await
            .map_err(db_error("汇总入库分组"))
    }

    /// 分组的 StockIn 发票，没有时新建
    async fn group_invoice(
        conn: &mut PgConnection,
        payment: &NewSupplierPayment,
        key: StockGroupKey,
        total_amount: Decimal,
        lines: i64,
    ) -> AppResult<i32> {
        let number = key.to_string();
        let existing: Option<i32> = sqlx::query_scalar(
            r#"
            SELECT id FROM tbl_supplier_invoices
            WHERE invoice_number = $1 AND seller_user_id = $2 AND archived_at IS NULL
            "#,
        )
        .bind(&number)
        .bind(payment.seller.0)
        .fetch_optional(&mut *conn)
        .await
        .map_err(db_error("查询入库分组发票"))?;
        if let Some(id) = existing {
            return Ok(id);
        }

        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO tbl_supplier_invoices
                (invoice_number, supplier_id, invoice_date, total_amount, description, source_type,
                 created_by, seller_user_id, created_at)
            VALUES ($1, $2, $3, $4, $5, 'StockIn', $6, $7, NOW())
            RETURNING id
            "#,
        )
        .bind(&number)
        .bind(key.supplier_id)
        .bind(key.date)
        .bind(total_amount)
        .bind(format!("Stock-in from {} items", lines))
        .bind(payment.created_by.0)
        .bind(payment.seller.0)
        .fetch_one(conn)
        .await
        .map_err(db_error("新增入库分组发票"))?;
        debug!(invoice_id = id, invoice_number = %number, "Stock-in invoice created");
        Ok(id)
    }
}

enum PaidBy {
    Id(i32),
    Key(StockGroupKey, UserId),
}

#[async_trait]
impl PayableRepository for PostgresPayableRepository {
    async fn purchase_order_payables(&self, filter: &PayableFilter) -> AppResult<Vec<Payable>> {
        let rows = Self::order_query(filter, None)
            .build_query_as::<OrderPayableRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("查询采购订单应付"))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn stock_group_payables(&self, filter: &PayableFilter) -> AppResult<Vec<Payable>> {
        let rows = Self::group_query(filter)
            .build_query_as::<GroupPayableRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("查询入库分组应付"))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn purchase_order_payable(&self, po_id: i32, seller: UserId) -> AppResult<Option<Payable>> {
        let row = Self::order_query(&PayableFilter::new(seller), Some(po_id))
            .build_query_as::<OrderPayableRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("查询采购订单应付"))?;
        Ok(row.map(Into::into))
    }

    async fn stock_group_payable(
        &self,
        key: StockGroupKey,
        seller: UserId,
    ) -> AppResult<Option<Payable>> {
        let filter = PayableFilter {
            supplier_id: Some(key.supplier_id),
            range: DateRange::between(key.date, key.date),
            ..PayableFilter::new(seller)
        };
        let row = Self::group_query(&filter)
            .build_query_as::<GroupPayableRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("查询入库分组应付"))?;
        Ok(row.map(Into::into))
    }

    async fn payments(&self, target: PaymentTarget, seller: UserId) -> AppResult<Vec<SupplierPayment>> {
        let mut qb = QueryBuilder::<Postgres>::new(PAYMENT_COLUMNS);
        qb.push_bind(seller.0);
        match target {
            PaymentTarget::PurchaseOrder(po_id) => qb.push(" AND sp.po_id = ").push_bind(po_id),
            PaymentTarget::StockGroup(key) => qb
                .push(" AND sp.stock_in_group_key = ")
                .push_bind(key.to_string()),
            PaymentTarget::Invoice(invoice_id) => {
                qb.push(" AND sp.invoice_id = ").push_bind(invoice_id)
            }
        };
        qb.push(" ORDER BY sp.payment_date DESC, sp.created_at DESC");

        let rows = qb
            .build_query_as::<PaymentRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("查询供应商付款"))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn insert_payment(&self, payment: &NewSupplierPayment) -> AppResult<Option<i32>> {
        let mut tx = self.tx_manager.begin().await?;

        let Some((balance, invoice_id, group_key)) = Self::lock_target(&mut tx, payment).await?
        else {
            TransactionManager::rollback(tx).await?;
            return Ok(None);
        };
        if let Err(e) = check_amount(payment.amount, balance.total_amount, balance.total_paid) {
            TransactionManager::rollback(tx).await?;
            return Err(e);
        }

        let po_id = match payment.target {
            PaymentTarget::PurchaseOrder(po_id) => Some(po_id),
            _ => None,
        };
        let (receipt, receipt_type) = ReceiptImage::columns(payment.receipt.as_ref());

        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO tbl_supplier_payments
                (invoice_id, po_id, stock_in_group_key, amount_paid, payment_method, payment_date,
                 reference_number, notes, receipt_image_base64, receipt_image_content_type,
                 created_by, seller_user_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, NOW())
            RETURNING id
            "#,
        )
        .bind(invoice_id)
        .bind(po_id)
        .bind(group_key)
        .bind(payment.amount)
        .bind(&payment.method)
        .bind(payment.payment_date)
        .bind(&payment.reference_number)
        .bind(&payment.notes)
        .bind(receipt)
        .bind(receipt_type)
        .bind(payment.created_by.0)
        .bind(payment.seller.0)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("新增供应商付款"))?;

        TransactionManager::commit(tx).await?;
        Ok(Some(id))
    }

    async fn archive_payment(&self, payment_id: i32, seller: UserId) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE tbl_supplier_payments SET archived_at = NOW()
            WHERE id = $1 AND seller_user_id = $2 AND archived_at IS NULL
            "#,
        )
        .bind(payment_id)
        .bind(seller.0)
        .execute(&self.pool)
        .await
        .map_err(db_error("删除供应商付款"))?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_query_filters() {
        let mut filter = PayableFilter::new(UserId(4));
        filter.supplier_id = Some(9);
        filter.search = Some("PO-".to_string());
        let qb = PostgresPayableRepository::order_query(&filter, None);
        let sql = qb.sql();
        assert!(sql.contains("sup.user_id = $1"));
        assert!(sql.contains("po.supplier_id = $2"));
        assert!(sql.contains("po.po_number ILIKE $3 OR sup.company_name ILIKE $4 OR po.notes ILIKE $5"));
    }

    #[test]
    fn test_group_query_excludes_purchase_order_receipts() {
        let qb = PostgresPayableRepository::group_query(&PayableFilter::new(UserId(4)));
        let sql = qb.sql();
        assert!(sql.contains("si.po_id IS NULL AND v.user_id = $1"));
        assert!(sql.contains("sp.seller_user_id = $2"));
        assert!(sql.contains("GROUP BY 1, 2, 3"));
    }
}
