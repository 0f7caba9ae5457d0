//! 数据库行映射

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use softwear_common::{ReceiptImage, UserId, display_name};
use sqlx::FromRow;

use crate::domain::{
    Payable, PayableSource, PaymentStatus, StockGroupKey, SupplierPayment,
};

#[derive(Debug, FromRow)]
pub(super) struct OrderPayableRow {
    pub po_id: i32,
    pub po_number: String,
    pub supplier_id: i32,
    pub supplier_name: String,
    pub invoice_date: NaiveDate,
    pub total_amount: Decimal,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub creator_name: Option<String>,
    pub creator_fname: Option<String>,
    pub creator_lname: Option<String>,
    pub creator_email: String,
    pub total_paid: Decimal,
}

impl From<OrderPayableRow> for Payable {
    fn from(row: OrderPayableRow) -> Self {
        let created_by_name = display_name(
            row.creator_name.as_deref(),
            row.creator_fname.as_deref(),
            row.creator_lname.as_deref(),
            &row.creator_email,
        );
        Self {
            source: PayableSource::PurchaseOrder,
            po_id: Some(row.po_id),
            invoice_number: row.po_number,
            supplier_id: row.supplier_id,
            supplier_name: row.supplier_name,
            invoice_date: row.invoice_date,
            total_amount: row.total_amount,
            description: row.description,
            created_at: row.created_at,
            created_by_name: Some(created_by_name),
            total_paid: Decimal::ZERO,
            remaining_balance: row.total_amount,
            payment_status: PaymentStatus::Unpaid,
        }
        .settle(row.total_paid)
    }
}

#[derive(Debug, FromRow)]
pub(super) struct GroupPayableRow {
    pub invoice_date: NaiveDate,
    pub supplier_id: i32,
    pub supplier_name: String,
    pub total_amount: Decimal,
    pub line_count: i64,
    pub created_at: DateTime<Utc>,
    pub total_paid: Decimal,
}

impl From<GroupPayableRow> for Payable {
    fn from(row: GroupPayableRow) -> Self {
        let key = StockGroupKey::new(row.invoice_date, row.supplier_id);
        Self {
            source: PayableSource::StockIn,
            po_id: None,
            invoice_number: key.to_string(),
            supplier_id: row.supplier_id,
            supplier_name: row.supplier_name,
            invoice_date: row.invoice_date,
            total_amount: row.total_amount,
            description: Some(format!("Stock-in from {} items", row.line_count)),
            created_at: row.created_at,
            created_by_name: None,
            total_paid: Decimal::ZERO,
            remaining_balance: row.total_amount,
            payment_status: PaymentStatus::Unpaid,
        }
        .settle(row.total_paid)
    }
}

#[derive(Debug, FromRow)]
pub(super) struct PaymentRow {
    pub id: i32,
    pub invoice_id: Option<i32>,
    pub po_id: Option<i32>,
    pub stock_in_group_key: Option<String>,
    pub invoice_number: String,
    pub amount_paid: Decimal,
    pub payment_method: String,
    pub payment_date: NaiveDate,
    pub reference_number: Option<String>,
    pub notes: Option<String>,
    pub receipt_image_base64: Option<String>,
    pub receipt_image_content_type: Option<String>,
    pub created_at: DateTime<Utc>,
    pub created_by: i32,
    pub creator_name: Option<String>,
    pub creator_fname: Option<String>,
    pub creator_lname: Option<String>,
    pub creator_email: String,
}

impl From<PaymentRow> for SupplierPayment {
    fn from(row: PaymentRow) -> Self {
        let created_by_name = display_name(
            row.creator_name.as_deref(),
            row.creator_fname.as_deref(),
            row.creator_lname.as_deref(),
            &row.creator_email,
        );
        let receipt =
            ReceiptImage::from_columns(row.receipt_image_base64, row.receipt_image_content_type);
        Self {
            id: row.id,
            invoice_id: row.invoice_id,
            po_id: row.po_id,
            stock_group_key: row.stock_in_group_key,
            invoice_number: row.invoice_number,
            amount_paid: row.amount_paid,
            payment_method: row.payment_method,
            payment_date: row.payment_date,
            reference_number: row.reference_number,
            notes: row.notes,
            receipt,
            created_at: row.created_at,
            created_by: UserId(row.created_by),
            created_by_name,
        }
    }
}

/// 付款对象的应付总额与已付
#[derive(Debug, FromRow)]
pub(super) struct BalanceRow {
    pub total_amount: Decimal,
    pub total_paid: Decimal,
}

/// 发票付款时需要的发票字段
#[derive(Debug, FromRow)]
pub(super) struct InvoiceBalanceRow {
    pub invoice_number: String,
    pub source_type: String,
    #[sqlx(flatten)]
    pub balance: BalanceRow,
}
