//! 款式（价格维度的 SKU），关联若干尺码与颜色

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::enums::RecordScope;
use crate::domain::value_objects::ProductImage;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariantSize {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariantColor {
    pub id: i32,
    pub name: String,
    pub hex_value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Variant {
    pub id: i32,
    pub name: String,
    pub price: Decimal,
    pub cost_price: Option<Decimal>,
    pub product_id: i32,
    pub product_name: String,
    #[serde(skip)]
    pub product_image: Option<ProductImage>,
    pub created_at: DateTime<Utc>,
    pub archived_at: Option<DateTime<Utc>>,
    /// 按名称排序
    pub sizes: Vec<VariantSize>,
    pub colors: Vec<VariantColor>,
}

impl Variant {
    pub fn scope(&self) -> RecordScope {
        if self.archived_at.is_some() {
            RecordScope::Archived
        } else {
            RecordScope::Active
        }
    }

    pub fn status(&self) -> &'static str {
        self.scope().status_label()
    }

    pub fn size_ids(&self) -> Vec<i32> {
        self.sizes.iter().map(|s| s.id).collect()
    }

    pub fn color_ids(&self) -> Vec<i32> {
        self.colors.iter().map(|c| c.id).collect()
    }
}

/// 新建或修改款式的数据；尺码与颜色关联整体替换
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantDraft {
    pub name: String,
    pub price: Decimal,
    pub cost_price: Option<Decimal>,
    pub product_id: i32,
    pub size_ids: Vec<i32>,
    pub color_ids: Vec<i32>,
}
