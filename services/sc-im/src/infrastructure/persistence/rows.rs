//! 数据库行映射

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use softwear_common::{UserId, display_name};
use softwear_errors::AppResult;
use sqlx::FromRow;

use crate::domain::{
    DailyQuantity, InventoryItem, LowStockItem, StockAdjustment, StockIn, StockInDetails,
    StockKey, StockOut,
};

/// 经办人姓名列；左连接时邮箱为空表示没有经办人
#[derive(Debug, FromRow)]
pub(super) struct UserNameRow {
    pub user_name: Option<String>,
    pub user_fname: Option<String>,
    pub user_lname: Option<String>,
    pub user_email: Option<String>,
}

impl UserNameRow {
    fn display(&self) -> Option<String> {
        self.user_email.as_deref().map(|email| {
            display_name(
                self.user_name.as_deref(),
                self.user_fname.as_deref(),
                self.user_lname.as_deref(),
                email,
            )
        })
    }
}

/// 款式、尺码、颜色的名称列
#[derive(Debug, FromRow)]
pub(super) struct KeyNamesRow {
    pub variant_id: i32,
    pub size_id: Option<i32>,
    pub color_id: Option<i32>,
    pub variant_name: String,
    pub product_name: String,
    pub size_name: Option<String>,
    pub color_name: Option<String>,
    pub color_hex: Option<String>,
}

impl KeyNamesRow {
    fn key(&self) -> StockKey {
        StockKey::new(self.variant_id, self.size_id, self.color_id)
    }
}

#[derive(Debug, FromRow)]
pub(super) struct InventoryRow {
    #[sqlx(flatten)]
    pub names: KeyNamesRow,
    pub current_stock: i32,
    pub reorder_level: i32,
    pub last_updated: Option<DateTime<Utc>>,
    pub updated_by: Option<i32>,
    #[sqlx(flatten)]
    pub updater: UserNameRow,
    pub price: Decimal,
    pub cost_price: Option<Decimal>,
    pub image: Option<Vec<u8>>,
    pub image_content_type: Option<String>,
    pub category_id: Option<i32>,
    pub category_name: Option<String>,
}

impl From<InventoryRow> for InventoryItem {
    fn from(row: InventoryRow) -> Self {
        Self {
            key: row.names.key(),
            updated_by_name: row.updater.display(),
            variant_name: row.names.variant_name,
            product_name: row.names.product_name,
            size_name: row.names.size_name,
            color_name: row.names.color_name,
            color_hex: row.names.color_hex,
            current_stock: row.current_stock,
            reorder_level: row.reorder_level,
            last_updated: row.last_updated,
            updated_by: row.updated_by.map(UserId),
            price: row.price,
            cost_price: row.cost_price,
            product_image: row.image,
            image_content_type: row.image_content_type,
            category_id: row.category_id,
            category_name: row.category_name,
        }
    }
}

#[derive(Debug, FromRow)]
pub(super) struct LowStockRow {
    #[sqlx(flatten)]
    pub names: KeyNamesRow,
    pub current_stock: i32,
    pub reorder_level: i32,
}

impl From<LowStockRow> for LowStockItem {
    fn from(row: LowStockRow) -> Self {
        Self {
            key: row.names.key(),
            product_name: row.names.product_name,
            variant_name: row.names.variant_name,
            size_name: row.names.size_name,
            color_name: row.names.color_name,
            current_stock: row.current_stock,
            reorder_level: row.reorder_level,
        }
    }
}

#[derive(Debug, FromRow)]
pub(super) struct StockInRow {
    pub id: i32,
    #[sqlx(flatten)]
    pub names: KeyNamesRow,
    pub quantity_added: i32,
    pub cost_price: Decimal,
    pub supplier_id: Option<i32>,
    pub supplier_name: Option<String>,
    pub po_id: Option<i32>,
    #[sqlx(flatten)]
    pub user: UserNameRow,
    pub created_at: DateTime<Utc>,
}

impl From<StockInRow> for StockIn {
    fn from(row: StockInRow) -> Self {
        Self {
            id: row.id,
            key: row.names.key(),
            user_name: row.user.display().unwrap_or_default(),
            quantity_added: row.quantity_added,
            cost_price: row.cost_price,
            variant_name: row.names.variant_name,
            product_name: row.names.product_name,
            size_name: row.names.size_name,
            color_name: row.names.color_name,
            color_hex: row.names.color_hex,
            supplier_id: row.supplier_id,
            supplier_name: row.supplier_name,
            po_id: row.po_id,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub(super) struct StockInDetailsRow {
    #[sqlx(flatten)]
    pub stock_in: StockInRow,
    pub supplier_contact_person: Option<String>,
    pub supplier_email: Option<String>,
    pub supplier_contact_number: Option<String>,
}

impl From<StockInDetailsRow> for StockInDetails {
    fn from(row: StockInDetailsRow) -> Self {
        Self {
            stock_in: row.stock_in.into(),
            supplier_contact_person: row.supplier_contact_person,
            supplier_email: row.supplier_email,
            supplier_contact_number: row.supplier_contact_number,
        }
    }
}

#[derive(Debug, FromRow)]
pub(super) struct StockOutRow {
    pub id: i32,
    #[sqlx(flatten)]
    pub names: KeyNamesRow,
    pub quantity_removed: i32,
    pub reason: Option<String>,
    #[sqlx(flatten)]
    pub user: UserNameRow,
    pub created_at: DateTime<Utc>,
}

impl From<StockOutRow> for StockOut {
    fn from(row: StockOutRow) -> Self {
        Self {
            id: row.id,
            key: row.names.key(),
            user_name: row.user.display().unwrap_or_default(),
            quantity_removed: row.quantity_removed,
            reason: row.reason,
            variant_name: row.names.variant_name,
            product_name: row.names.product_name,
            size_name: row.names.size_name,
            color_name: row.names.color_name,
            color_hex: row.names.color_hex,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub(super) struct AdjustmentRow {
    pub id: i32,
    #[sqlx(flatten)]
    pub names: KeyNamesRow,
    pub adjustment_type: String,
    pub quantity_adjusted: i32,
    pub reason: Option<String>,
    pub user_id: i32,
    #[sqlx(flatten)]
    pub user: UserNameRow,
    pub created_at: DateTime<Utc>,
}

impl AdjustmentRow {
    pub fn into_adjustment(self) -> AppResult<StockAdjustment> {
        Ok(StockAdjustment {
            id: self.id,
            key: self.names.key(),
            adjustment_type: self.adjustment_type.parse()?,
            user_name: self.user.display().unwrap_or_default(),
            quantity_adjusted: self.quantity_adjusted,
            reason: self.reason,
            variant_name: self.names.variant_name,
            product_name: self.names.product_name,
            size_name: self.names.size_name,
            color_name: self.names.color_name,
            color_hex: self.names.color_hex,
            user_id: UserId(self.user_id),
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub(super) struct DailyRow {
    pub date: NaiveDate,
    pub count: i64,
    pub quantity: i64,
}

impl From<DailyRow> for DailyQuantity {
    fn from(row: DailyRow) -> Self {
        Self {
            date: row.date,
            count: row.count,
            quantity: row.quantity,
        }
    }
}
