//! 分类 / 颜色 / 尺码

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::enums::{AttributeKind, RecordScope};

/// 卖家维护的基础属性记录
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogAttribute {
    pub id: i32,
    pub kind: AttributeKind,
    pub name: String,
    /// 仅颜色有值
    pub hex_value: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub archived_at: Option<DateTime<Utc>>,
}

impl CatalogAttribute {
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
}

/// 下拉选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeOption {
    pub id: i32,
    pub name: String,
    pub hex_value: Option<String>,
}

/// 已校验、已规范化的写入数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDraft {
    pub name: String,
    pub hex_value: Option<String>,
    pub description: Option<String>,
}
