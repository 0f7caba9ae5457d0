//! 数据库行映射结构

use sqlx::FromRow;

use crate::domain::ColumnInfo;

/// information_schema.columns 行
#[derive(Debug, FromRow)]
pub struct ColumnRow {
    pub name: String,
    pub data_type: String,
    pub is_identity: Option<bool>,
}

impl From<ColumnRow> for ColumnInfo {
    fn from(row: ColumnRow) -> Self {
        Self {
            name: row.name,
            data_type: row.data_type,
            is_identity: row.is_identity.unwrap_or(false),
        }
    }
}
