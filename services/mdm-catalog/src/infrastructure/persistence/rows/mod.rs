//! 数据库行映射结构

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

/// 分类 / 颜色 / 尺码行；非颜色表以 NULL 填充 hex_value
#[derive(Debug, FromRow)]
pub struct AttributeRow {
    pub id: i32,
    pub name: String,
    pub hex_value: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub archived_at: Option<DateTime<Utc>>,
}

#[derive(Debug, FromRow)]
pub struct AttributeOptionRow {
    pub id: i32,
    pub name: String,
    pub hex_value: Option<String>,
}

/// 商品行（含分类名）
#[derive(Debug, FromRow)]
pub struct ProductRow {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub category_id: i32,
    pub category_name: String,
    pub status: String,
    pub image: Option<Vec<u8>>,
    pub image_content_type: Option<String>,
    pub created_at: DateTime<Utc>,
    pub archived_at: Option<DateTime<Utc>>,
}

#[derive(Debug, FromRow)]
pub struct ProductOptionRow {
    pub id: i32,
    pub name: String,
    pub image: Option<Vec<u8>>,
    pub image_content_type: Option<String>,
}

/// 款式行（含商品名与商品图）
#[derive(Debug, FromRow)]
pub struct VariantRow {
    pub id: i32,
    pub name: String,
    pub price: Decimal,
    pub cost_price: Option<Decimal>,
    pub product_id: i32,
    pub product_name: String,
    pub product_image: Option<Vec<u8>>,
    pub product_image_content_type: Option<String>,
    pub created_at: DateTime<Utc>,
    pub archived_at: Option<DateTime<Utc>>,
}

#[derive(Debug, FromRow)]
pub struct VariantSizeRow {
    pub variant_id: i32,
    pub id: i32,
    pub name: String,
}

#[derive(Debug, FromRow)]
pub struct VariantColorRow {
    pub variant_id: i32,
    pub id: i32,
    pub name: String,
    pub hex_value: String,
}
