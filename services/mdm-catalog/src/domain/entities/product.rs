//! 商品

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::enums::RecordScope;
use crate::domain::value_objects::ProductImage;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub category_id: i32,
    pub category_name: String,
    /// `Active` / `Archived`
    pub status: String,
    #[serde(skip)]
    pub image: Option<ProductImage>,
    pub created_at: DateTime<Utc>,
    pub archived_at: Option<DateTime<Utc>>,
}

impl Product {
    pub fn scope(&self) -> RecordScope {
        if self.archived_at.is_some() {
            RecordScope::Archived
        } else {
            RecordScope::Active
        }
    }

    pub fn image_base64(&self) -> Option<String> {
        self.image.as_ref().map(ProductImage::to_base64)
    }
}

/// 新建或修改商品的数据
///
/// 修改时 `image` 为 None 表示保留原图。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDraft {
    pub name: String,
    pub description: Option<String>,
    pub category_id: i32,
    pub image: Option<ProductImage>,
}

/// 款式录入时可选的商品
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductOption {
    pub id: i32,
    pub name: String,
    #[serde(skip)]
    pub image: Option<ProductImage>,
}
