//! 数据库行映射

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use softwear_common::display_name;
use sqlx::FromRow;

use crate::domain::{PoItem, PurchaseOrder, PurchaseOrderDetails};

#[derive(Debug, FromRow)]
pub(super) struct PurchaseOrderRow {
    pub id: i32,
    pub po_number: String,
    pub supplier_id: i32,
    pub supplier_name: String,
    pub status: String,
    pub total_amount: Decimal,
    pub notes: Option<String>,
    pub expected_delivery_date: Option<NaiveDate>,
    pub item_count: i64,
    pub creator_name: Option<String>,
    pub creator_fname: Option<String>,
    pub creator_lname: Option<String>,
    pub creator_email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub archived_at: Option<DateTime<Utc>>,
}

impl From<PurchaseOrderRow> for PurchaseOrder {
    fn from(row: PurchaseOrderRow) -> Self {
        let created_by_name = display_name(
            row.creator_name.as_deref(),
            row.creator_fname.as_deref(),
            row.creator_lname.as_deref(),
            &row.creator_email,
        );
        Self {
            id: row.id,
            po_number: row.po_number,
            supplier_id: row.supplier_id,
            supplier_name: row.supplier_name,
            status: row.status,
            total_amount: row.total_amount,
            notes: row.notes,
            expected_delivery_date: row.expected_delivery_date,
            item_count: row.item_count,
            created_by_name,
            created_at: row.created_at,
            updated_at: row.updated_at,
            archived_at: row.archived_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub(super) struct PurchaseOrderDetailsRow {
    #[sqlx(flatten)]
    pub order: PurchaseOrderRow,
    pub supplier_email: Option<String>,
    pub supplier_contact_person: Option<String>,
    pub supplier_contact_number: Option<String>,
    pub updater_name: Option<String>,
    pub updater_fname: Option<String>,
    pub updater_lname: Option<String>,
    pub updater_email: Option<String>,
}

impl PurchaseOrderDetailsRow {
    pub fn into_details(self, items: Vec<PoItem>) -> PurchaseOrderDetails {
        let updated_by_name = self.updater_email.as_deref().map(|email| {
            display_name(
                self.updater_name.as_deref(),
                self.updater_fname.as_deref(),
                self.updater_lname.as_deref(),
                email,
            )
        });
        PurchaseOrderDetails {
            order: self.order.into(),
            supplier_email: self.supplier_email,
            supplier_contact_person: self.supplier_contact_person,
            supplier_contact_number: self.supplier_contact_number,
            updated_by_name,
            items,
        }
    }
}

#[derive(Debug, FromRow)]
pub(super) struct PoItemRow {
    pub id: i32,
    pub variant_id: i32,
    pub size_id: Option<i32>,
    pub color_id: Option<i32>,
    pub variant_name: String,
    pub product_name: String,
    pub size_name: Option<String>,
    pub color_name: Option<String>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub received_quantity: i32,
}

impl From<PoItemRow> for PoItem {
    fn from(row: PoItemRow) -> Self {
        Self {
            id: row.id,
            variant_id: row.variant_id,
            size_id: row.size_id,
            color_id: row.color_id,
            variant_name: row.variant_name,
            product_name: row.product_name,
            size_name: row.size_name,
            color_name: row.color_name,
            quantity: row.quantity,
            unit_price: row.unit_price,
            total_price: row.total_price,
            received_quantity: row.received_quantity,
        }
    }
}

/// 完成收货时需要的明细字段
#[derive(Debug, FromRow)]
pub(super) struct ReceiptRow {
    pub id: i32,
    pub variant_id: i32,
    pub size_id: Option<i32>,
    pub color_id: Option<i32>,
    pub quantity: i32,
    pub unit_price: Decimal,
    /// 款式所属卖家
    pub owner_id: i32,
}
