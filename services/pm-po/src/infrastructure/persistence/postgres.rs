//! 采购订单的 PostgreSQL 实现

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sc_im::domain::{NewStockIn, StockKey};
use sc_im::infrastructure::insert_stock_in;
use softwear_adapter_postgres::{
    NumberSeries, TransactionManager, db_error, push_date_range, push_page, push_search,
    to_count, utc_date,
};
use softwear_common::{Pagination, UserId};
use softwear_errors::AppResult;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use tracing::debug;

use crate::domain::{
    CreatedPurchaseOrder, NewPurchaseOrder, PoFilter, PoListKind, PoStatus, PurchaseOrder,
    PurchaseOrderDetails, PurchaseOrderRepository, StatusChange, StatusOutcome, po_number,
};

use super::rows::{PoItemRow, PurchaseOrderDetailsRow, PurchaseOrderRow, ReceiptRow};

const SEARCH_COLUMNS: [&str; 2] = ["po.po_number", "s.company_name"];

/// 订单号全局唯一，生成时串行
const PO_NUMBERS: NumberSeries =
    NumberSeries::new(0x504f_4e55_4d, "tbl_purchase_orders", "po_number");

const ORDER_COLUMNS: &str = r#"
    SELECT po.id, po.po_number, po.supplier_id, s.company_name AS supplier_name, po.status,
           po.total_amount, po.notes, po.expected_delivery_date,
           (SELECT COUNT(*) FROM tbl_po_items pi WHERE pi.po_id = po.id) AS item_count,
           cu.name AS creator_name, cu.fname AS creator_fname, cu.lname AS creator_lname,
           cu.email AS creator_email, po.created_at, po.updated_at, po.archived_at"#;

const FROM_ORDERS: &str = r#"
    FROM tbl_purchase_orders po
    JOIN tbl_suppliers s ON s.id = po.supplier_id
    JOIN tbl_users cu ON cu.id = po.created_by"#;

impl PoListKind {
    fn condition(&self) -> &'static str {
        match self {
            Self::Active => {
                " AND po.archived_at IS NULL AND po.status NOT IN ('Cancelled', 'Completed')"
            }
            Self::Cancelled => " AND po.archived_at IS NOT NULL AND po.status = 'Cancelled'",
            Self::Completed => " AND po.archived_at IS NULL AND po.status = 'Completed'",
            Self::PendingForAccounting => " AND po.archived_at IS NULL AND po.status = 'Pending'",
        }
    }

    fn date_column(&self) -> &'static str {
        match self {
            Self::Active | Self::PendingForAccounting => "po.created_at",
            Self::Cancelled => "po.archived_at",
            Self::Completed => "COALESCE(po.updated_at, po.created_at)",
        }
    }
}

pub struct PostgresPurchaseOrderRepository {
    pool: PgPool,
    tx_manager: TransactionManager,
}

impl PostgresPurchaseOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            tx_manager: TransactionManager::new(pool.clone()),
            pool,
        }
    }

    fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &PoFilter) {
        qb.push(" WHERE s.user_id = ").push_bind(filter.seller.0);
        qb.push(filter.kind.condition());
        push_search(qb, &SEARCH_COLUMNS, filter.search.as_deref());
        if filter.kind == PoListKind::Active
            && let Some(status) = filter.status
        {
            qb.push(" AND po.status = ").push_bind(status.as_str());
        }
        push_date_range(qb, &utc_date(filter.kind.date_column()), &filter.range);
    }

    /// 本年度未归档订单数 + 1，跳过已被占用的编号
    async fn next_po_number(conn: &mut PgConnection, seller: UserId) -> AppResult<String> {
        PO_NUMBERS.lock(conn).await?;

        let existing: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM tbl_purchase_orders po
            JOIN tbl_suppliers s ON s.id = po.supplier_id
            WHERE s.user_id = $1 AND po.archived_at IS NULL
              AND EXTRACT(YEAR FROM po.created_at AT TIME ZONE 'UTC')
                  = EXTRACT(YEAR FROM NOW() AT TIME ZONE 'UTC')
            "#,
        )
        .bind(seller.0)
        .fetch_one(&mut *conn)
        .await
        .map_err(db_error("统计本年度采购订单"))?;

        let today = Utc::now().date_naive();
        PO_NUMBERS
            .first_free(conn, existing + 1, |seq| po_number(today, seq))
            .await
    }

    /// 按明细生成入库记录并标记已收货
    async fn receive_items(conn: &mut PgConnection, po_id: i32, supplier_id: i32) -> AppResult<usize> {
        let items: Vec<ReceiptRow> = sqlx::query_as(
            r#"
            SELECT pi.id, pi.variant_id, pi.size_id, pi.color_id, pi.quantity, pi.unit_price,
                   COALESCE(v.user_id, po.created_by) AS owner_id
            FROM tbl_po_items pi
            JOIN tbl_purchase_orders po ON po.id = pi.po_id
            JOIN tbl_variants v ON v.id = pi.variant_id
            WHERE pi.po_id = $1
            ORDER BY pi.id
            "#,
        )
        .bind(po_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(db_error("查询采购明细"))?;

        for item in &items {
            let stock_in = NewStockIn {
                user_id: UserId(item.owner_id),
                key: StockKey::new(item.variant_id, item.size_id, item.color_id),
                quantity: item.quantity,
                cost_price: item.unit_price,
                supplier_id: Some(supplier_id),
                po_id: Some(po_id),
                return_id: None,
            };
            insert_stock_in(conn, &stock_in).await?;
            debug!(po_id, item_id = item.id, quantity = item.quantity, "PO item received");
        }

        sqlx::query("UPDATE tbl_po_items SET received_quantity = quantity WHERE po_id = $1")
            .bind(po_id)
            .execute(&mut *conn)
            .await
            .map_err(db_error("更新采购明细收货数量"))?;

        Ok(items.len())
    }
}

#[async_trait]
impl PurchaseOrderRepository for PostgresPurchaseOrderRepository {
    async fn list(&self, filter: &PoFilter, pagination: Pagination) -> AppResult<Vec<PurchaseOrder>> {
        let mut qb = QueryBuilder::<Postgres>::new(ORDER_COLUMNS);
        qb.push(FROM_ORDERS);
        Self::push_filter(&mut qb, filter);
        qb.push(" ORDER BY ")
            .push(filter.kind.date_column())
            .push(" DESC, po.id DESC");
        push_page(&mut qb, pagination);

        let rows = qb
            .build_query_as::<PurchaseOrderRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("查询采购订单列表"))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn count(&self, filter: &PoFilter) -> AppResult<u64> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
        qb.push(FROM_ORDERS);
        Self::push_filter(&mut qb, filter);

        let total = qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("统计采购订单数量"))?;
        Ok(to_count(total))
    }

    async fn details(&self, id: i32, seller: UserId) -> AppResult<Option<PurchaseOrderDetails>> {
        let mut qb = QueryBuilder::<Postgres>::new(ORDER_COLUMNS);
        qb.push(
            r#",
           s.email AS supplier_email, s.contact_person AS supplier_contact_person,
           s.contact_number AS supplier_contact_number,
           uu.name AS updater_name, uu.fname AS updater_fname, uu.lname AS updater_lname,
           uu.email AS updater_email"#,
        )
        .push(FROM_ORDERS)
        .push(" LEFT JOIN tbl_users uu ON uu.id = po.updated_by WHERE po.id = ")
        .push_bind(id);
        if !seller.is_any() {
            qb.push(" AND s.user_id = ").push_bind(seller.0);
        }

        let Some(row) = qb
            .build_query_as::<PurchaseOrderDetailsRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("查询采购订单详情"))?
        else {
            return Ok(None);
        };

        let items: Vec<PoItemRow> = sqlx::query_as(
            r#"
            SELECT pi.id, pi.variant_id, pi.size_id, pi.color_id,
                   v.name AS variant_name, p.name AS product_name,
                   sz.name AS size_name, c.name AS color_name,
                   pi.quantity, pi.unit_price, pi.total_price, pi.received_quantity
            FROM tbl_po_items pi
            JOIN tbl_variants v ON v.id = pi.variant_id
            JOIN tbl_products p ON p.id = v.product_id
            LEFT JOIN tbl_sizes sz ON sz.id = pi.size_id
            LEFT JOIN tbl_colors c ON c.id = pi.color_id
            WHERE pi.po_id = $1
            ORDER BY pi.id
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("查询采购订单明细"))?;

        Ok(Some(
            row.into_details(items.into_iter().map(Into::into).collect()),
        ))
    }

    async fn insert(&self, order: &NewPurchaseOrder) -> AppResult<Option<CreatedPurchaseOrder>> {
        let mut tx = self.tx_manager.begin().await?;

        let supplier: Option<i32> = sqlx::query_scalar(
            r#"
            SELECT id FROM tbl_suppliers
            WHERE id = $1 AND user_id = $2 AND status = 'Active' AND archived_at IS NULL
            "#,
        )
        .bind(order.supplier_id)
        .bind(order.seller.0)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("校验供应商"))?;

        if supplier.is_none() {
            TransactionManager::rollback(tx).await?;
            return Ok(None);
        }

        let number = Self::next_po_number(&mut tx, order.seller).await?;

        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO tbl_purchase_orders
                (po_number, supplier_id, status, total_amount, notes, expected_delivery_date, created_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())
            RETURNING id
            "#,
        )
        .bind(&number)
        .bind(order.supplier_id)
        .bind(PoStatus::Pending.as_str())
        .bind(order.total_amount())
        .bind(&order.notes)
        .bind(order.expected_delivery_date)
        .bind(order.created_by.0)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("新增采购订单"))?;

        let mut items = QueryBuilder::<Postgres>::new(
            "INSERT INTO tbl_po_items (po_id, variant_id, size_id, color_id, quantity, unit_price, total_price) ",
        );
        items.push_values(&order.items, |mut b, item| {
            b.push_bind(id)
                .push_bind(item.variant_id)
                .push_bind(item.size_id)
                .push_bind(item.color_id)
                .push_bind(item.quantity)
                .push_bind(item.unit_price)
                .push_bind(item.total_price());
        });
        items
            .build()
            .execute(&mut *tx)
            .await
            .map_err(db_error("新增采购明细"))?;

        TransactionManager::commit(tx).await?;
        Ok(Some(CreatedPurchaseOrder {
            id,
            po_number: number,
        }))
    }

    async fn update_status(&self, change: &StatusChange) -> AppResult<StatusOutcome> {
        let mut tx = self.tx_manager.begin().await?;

        let current: Option<(String, i32)> = sqlx::query_as(
            r#"
            SELECT po.status, po.supplier_id
            FROM tbl_purchase_orders po
            JOIN tbl_suppliers s ON s.id = po.supplier_id
            WHERE po.id = $1 AND s.user_id = $2 AND po.archived_at IS NULL
            FOR UPDATE OF po
            "#,
        )
        .bind(change.id)
        .bind(change.seller.0)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("查询采购订单状态"))?;

        let Some((previous, supplier_id)) = current else {
            TransactionManager::rollback(tx).await?;
            return Ok(StatusOutcome::NotFound);
        };

        sqlx::query(
            r#"
            UPDATE tbl_purchase_orders
            SET status = $2, updated_by = $3, updated_at = NOW(),
                archived_at = CASE WHEN $4 THEN NOW() ELSE archived_at END
            WHERE id = $1
            "#,
        )
        .bind(change.id)
        .bind(change.status.as_str())
        .bind(change.updated_by.0)
        .bind(change.status.archives())
        .execute(&mut *tx)
        .await
        .map_err(db_error("更新采购订单状态"))?;

        let mut received_items = 0;
        if change.status == PoStatus::Completed && previous != PoStatus::Completed.as_str() {
            let already_received: bool = sqlx::query_scalar(
                "SELECT EXISTS (SELECT 1 FROM tbl_stock_in WHERE po_id = $1 AND archived_at IS NULL)",
            )
            .bind(change.id)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_error("查询采购入库记录"))?;

            if !already_received {
                received_items = Self::receive_items(&mut tx, change.id, supplier_id).await?;
            }
        }

        TransactionManager::commit(tx).await?;
        Ok(StatusOutcome::Updated { received_items })
    }

    async fn update_expected_date(
        &self,
        id: i32,
        seller: UserId,
        updated_by: UserId,
        date: Option<NaiveDate>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE tbl_purchase_orders po
            SET expected_delivery_date = $4, updated_by = $3, updated_at = NOW()
            FROM tbl_suppliers s
            WHERE s.id = po.supplier_id AND po.id = $1 AND s.user_id = $2 AND po.archived_at IS NULL
            "#,
        )
        .bind(id)
        .bind(seller.0)
        .bind(updated_by.0)
        .bind(date)
        .execute(&self.pool)
        .await
        .map_err(db_error("更新预计到货日期"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn archive(&self, id: i32, seller: UserId, updated_by: UserId) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE tbl_purchase_orders po
            SET archived_at = NOW(), updated_by = $3, updated_at = NOW()
            FROM tbl_suppliers s
            WHERE s.id = po.supplier_id AND po.id = $1 AND s.user_id = $2 AND po.archived_at IS NULL
            "#,
        )
        .bind(id)
        .bind(seller.0)
        .bind(updated_by.0)
        .execute(&self.pool)
        .await
        .map_err(db_error("归档采购订单"))?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use softwear_common::DateRange;

    fn filter_sql(filter: &PoFilter) -> String {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
        qb.push(FROM_ORDERS);
        PostgresPurchaseOrderRepository::push_filter(&mut qb, filter);
        qb.sql().to_string()
    }

    #[test]
    fn test_status_filter_only_applies_to_active_list() {
        let mut filter = PoFilter::new(UserId(1), PoListKind::Completed);
        filter.status = Some(PoStatus::Pending);
        let sql = filter_sql(&filter);
        assert!(sql.contains("po.status = 'Completed'"));
        assert!(!sql.contains("po.status = $"));

        filter.kind = PoListKind::Active;
        assert!(filter_sql(&filter).contains("po.status = $2"));
    }

    #[test]
    fn test_cancelled_list_filters_on_archive_date() {
        let mut filter = PoFilter::new(UserId(1), PoListKind::Cancelled);
        let day = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        filter.range = DateRange::between(day, day);
        let sql = filter_sql(&filter);
        assert!(sql.contains("(po.archived_at AT TIME ZONE 'UTC')::date"));
    }
}
