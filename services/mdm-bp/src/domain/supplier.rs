//! 供应商实体

use std::str::FromStr;

use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use softwear_errors::AppError;

/// 供应商状态；`Archived` 只由归档操作写入
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum SupplierStatus {
    Active,
    Inactive,
    Archived,
}

impl SupplierStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Inactive => "Inactive",
            Self::Archived => "Archived",
        }
    }
}

impl FromStr for SupplierStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "archived" => Ok(Self::Archived),
            other => Err(AppError::validation(format!("未知的供应商状态: {}", other))),
        }
    }
}

/// 供应商地址（tbl_addresses.supplier_id）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierAddress {
    pub street: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub zip: Option<String>,
}

impl SupplierAddress {
    pub fn is_empty(&self) -> bool {
        [&self.street, &self.city, &self.province, &self.zip]
            .iter()
            .all(|part| part.as_deref().is_none_or(|v| v.trim().is_empty()))
    }

    /// 单行展示，跳过空白部分
    pub fn one_line(&self) -> String {
        [&self.street, &self.city, &self.province, &self.zip]
            .iter()
            .filter_map(|part| part.as_deref().map(str::trim))
            .filter(|v| !v.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Supplier {
    pub id: i32,
    pub company_name: String,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub contact_number: Option<String>,
    pub status: SupplierStatus,
    pub created_at: DateTime<Utc>,
    pub archived_at: Option<DateTime<Utc>>,
    /// 列表查询不带地址
    pub address: Option<SupplierAddress>,
}

/// 已校验的写入数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupplierDraft {
    pub company_name: String,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub contact_number: Option<String>,
    pub status: SupplierStatus,
    pub address: Option<SupplierAddress>,
}

/// 采购单、入库单选择供应商用
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SupplierOption {
    pub id: i32,
    pub company_name: String,
}
