//! 数据库行映射

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use softwear_common::display_name;
use sqlx::FromRow;

use crate::domain::{
    DailyReturns, ReturnReport, ReturnReportItem, ReturnableLine, ReturnableSale,
    ReturnableSaleItem,
};

#[derive(Debug, FromRow)]
pub(super) struct ReturnReportRow {
    pub id: i32,
    pub return_number: String,
    pub sale_id: i32,
    pub sale_number: String,
    pub reason: Option<String>,
    pub status: String,
    pub refund_amount: Decimal,
    pub cashier_name: Option<String>,
    pub cashier_fname: Option<String>,
    pub cashier_lname: Option<String>,
    pub cashier_email: String,
    pub approver_name: Option<String>,
    pub approver_fname: Option<String>,
    pub approver_lname: Option<String>,
    pub approver_email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<ReturnReportRow> for ReturnReport {
    fn from(row: ReturnReportRow) -> Self {
        let cashier_name = display_name(
            row.cashier_name.as_deref(),
            row.cashier_fname.as_deref(),
            row.cashier_lname.as_deref(),
            &row.cashier_email,
        );
        let approved_by_name = row.approver_email.as_deref().map(|email| {
            display_name(
                row.approver_name.as_deref(),
                row.approver_fname.as_deref(),
                row.approver_lname.as_deref(),
                email,
            )
        });
        Self {
            id: row.id,
            return_number: row.return_number,
            sale_id: row.sale_id,
            sale_number: row.sale_number,
            reason: row.reason,
            status: row.status,
            cashier_name,
            refund_amount: row.refund_amount,
            approved_by_name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub(super) struct ReturnItemRow {
    pub id: i32,
    pub return_id: i32,
    pub sale_item_id: i32,
    pub variant_id: i32,
    pub size_id: Option<i32>,
    pub color_id: Option<i32>,
    pub product_name: String,
    pub variant_name: String,
    pub size_name: Option<String>,
    pub color_name: Option<String>,
    pub color_hex: Option<String>,
    pub quantity: i32,
    pub condition: String,
    pub price: Decimal,
}

impl From<ReturnItemRow> for ReturnReportItem {
    fn from(row: ReturnItemRow) -> Self {
        Self {
            id: row.id,
            return_id: row.return_id,
            sale_item_id: row.sale_item_id,
            variant_id: row.variant_id,
            size_id: row.size_id,
            color_id: row.color_id,
            product_name: row.product_name,
            variant_name: row.variant_name,
            size_name: row.size_name,
            color_name: row.color_name,
            color_hex: row.color_hex,
            quantity: row.quantity,
            condition: row.condition,
            price: row.price,
        }
    }
}

#[derive(Debug, FromRow)]
pub(super) struct ReturnableSaleRow {
    pub id: i32,
    pub sale_number: String,
    pub amount: Decimal,
    pub payment_type: String,
    pub cashier_name: Option<String>,
    pub cashier_fname: Option<String>,
    pub cashier_lname: Option<String>,
    pub cashier_email: String,
    pub created_at: DateTime<Utc>,
}

impl From<ReturnableSaleRow> for ReturnableSale {
    fn from(row: ReturnableSaleRow) -> Self {
        let cashier_name = display_name(
            row.cashier_name.as_deref(),
            row.cashier_fname.as_deref(),
            row.cashier_lname.as_deref(),
            &row.cashier_email,
        );
        Self {
            id: row.id,
            sale_number: row.sale_number,
            amount: row.amount,
            payment_method: row.payment_type,
            cashier_name,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub(super) struct ReturnableItemRow {
    pub id: i32,
    pub sale_id: i32,
    pub variant_id: i32,
    pub size_id: Option<i32>,
    pub color_id: Option<i32>,
    pub product_name: String,
    pub variant_name: String,
    pub size_name: Option<String>,
    pub color_name: Option<String>,
    pub color_hex: Option<String>,
    pub quantity: i32,
    pub price: Decimal,
    pub subtotal: Decimal,
    pub returned_quantity: i32,
}

impl From<ReturnableItemRow> for ReturnableSaleItem {
    fn from(row: ReturnableItemRow) -> Self {
        let line = ReturnableLine {
            sale_item_id: row.id,
            sold: row.quantity,
            returned: row.returned_quantity,
        };
        Self {
            id: row.id,
            sale_id: row.sale_id,
            variant_id: row.variant_id,
            size_id: row.size_id,
            color_id: row.color_id,
            product_name: row.product_name,
            variant_name: row.variant_name,
            size_name: row.size_name,
            color_name: row.color_name,
            color_hex: row.color_hex,
            quantity: row.quantity,
            price: row.price,
            subtotal: row.subtotal,
            returned_quantity: row.returned_quantity,
            returnable_quantity: line.remaining(),
        }
    }
}

#[derive(Debug, FromRow)]
pub(super) struct ReturnableLineRow {
    pub sale_item_id: i32,
    pub sold: i32,
    pub returned: i32,
}

impl From<ReturnableLineRow> for ReturnableLine {
    fn from(row: ReturnableLineRow) -> Self {
        Self {
            sale_item_id: row.sale_item_id,
            sold: row.sold,
            returned: row.returned,
        }
    }
}

/// 批准回库时需要的明细字段
#[derive(Debug, FromRow)]
pub(super) struct RestockRow {
    pub variant_id: i32,
    pub size_id: Option<i32>,
    pub color_id: Option<i32>,
    pub quantity: i32,
    pub owner_id: i32,
    pub cost_price: Decimal,
    pub price: Decimal,
}

#[derive(Debug, FromRow)]
pub(super) struct DailyReturnsRow {
    pub return_date: NaiveDate,
    pub count: i64,
}

impl From<DailyReturnsRow> for DailyReturns {
    fn from(row: DailyReturnsRow) -> Self {
        Self {
            date: row.return_date,
            count: row.count,
        }
    }
}
