//! 库存变动：入库、出库、调整

use std::str::FromStr;

use chrono::{DateTime, Utc};
use derive_more::Display;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use softwear_common::{DateRange, UserId};
use softwear_errors::AppError;

use super::StockKey;

/// 调整方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum AdjustmentType {
    Increase,
    Decrease,
}

impl AdjustmentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Increase => "Increase",
            Self::Decrease => "Decrease",
        }
    }

    /// 对库存的带符号影响
    pub fn signed(&self, quantity: i32) -> i32 {
        match self {
            Self::Increase => quantity,
            Self::Decrease => -quantity,
        }
    }
}

impl FromStr for AdjustmentType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Increase" => Ok(Self::Increase),
            "Decrease" => Ok(Self::Decrease),
            other => Err(AppError::validation(format!("未知的调整类型: {}", other))),
        }
    }
}

/// 入库/出库列表过滤
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovementFilter {
    /// 按款式归属的卖家
    pub seller: Option<UserId>,
    /// 按经办人
    pub created_by: Option<UserId>,
    pub search: Option<String>,
    /// 按 UTC 日期过滤 created_at
    pub range: DateRange,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdjustmentFilter {
    pub seller: UserId,
    pub search: Option<String>,
    pub adjustment_type: Option<AdjustmentType>,
}

/// 入库记录
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockIn {
    pub id: i32,
    pub key: StockKey,
    pub quantity_added: i32,
    pub cost_price: Decimal,
    pub variant_name: String,
    pub product_name: String,
    pub size_name: Option<String>,
    pub color_name: Option<String>,
    pub color_hex: Option<String>,
    pub supplier_id: Option<i32>,
    pub supplier_name: Option<String>,
    pub po_id: Option<i32>,
    pub user_name: String,
    pub created_at: DateTime<Utc>,
}

/// 入库详情，附带供应商联系方式
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockInDetails {
    pub stock_in: StockIn,
    pub supplier_contact_person: Option<String>,
    pub supplier_email: Option<String>,
    pub supplier_contact_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewStockIn {
    pub user_id: UserId,
    pub key: StockKey,
    pub quantity: i32,
    pub cost_price: Decimal,
    pub supplier_id: Option<i32>,
    /// 采购单收货时写入
    pub po_id: Option<i32>,
    /// 退货审核回库时写入
    pub return_id: Option<i32>,
}

/// 出库记录
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockOut {
    pub id: i32,
    pub key: StockKey,
    pub quantity_removed: i32,
    pub reason: Option<String>,
    pub variant_name: String,
    pub product_name: String,
    pub size_name: Option<String>,
    pub color_name: Option<String>,
    pub color_hex: Option<String>,
    pub user_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStockOut {
    pub user_id: UserId,
    pub key: StockKey,
    pub quantity: i32,
    pub reason: Option<String>,
}

/// 库存调整记录
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockAdjustment {
    pub id: i32,
    pub key: StockKey,
    pub adjustment_type: AdjustmentType,
    pub quantity_adjusted: i32,
    pub reason: Option<String>,
    pub variant_name: String,
    pub product_name: String,
    pub size_name: Option<String>,
    pub color_name: Option<String>,
    pub color_hex: Option<String>,
    pub user_id: UserId,
    pub user_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStockAdjustment {
    pub seller: UserId,
    pub created_by: UserId,
    pub key: StockKey,
    pub adjustment_type: AdjustmentType,
    pub quantity: i32,
    pub reason: Option<String>,
}

/// 写入调整的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjustmentOutcome {
    Created(i32),
    /// 款式不存在、已归档或不属于该卖家
    VariantNotFound,
    InsufficientStock { available: i32 },
}
