//! 管理费流水

use std::str::FromStr;

use chrono::{DateTime, Utc};
use derive_more::Display;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use softwear_common::{DateRange, UserId, money};
use softwear_errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum TransactionType {
    AdminFee,
    /// 退货批准后冲销，金额为负
    AdminFeeReversal,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AdminFee => "AdminFee",
            Self::AdminFeeReversal => "AdminFeeReversal",
        }
    }
}

impl FromStr for TransactionType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AdminFee" => Ok(Self::AdminFee),
            "AdminFeeReversal" => Ok(Self::AdminFeeReversal),
            other => Err(AppError::internal(format!("未知的流水类型: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum FeeStatus {
    Pending,
    Collected,
}

impl FeeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Collected => "Collected",
        }
    }
}

impl FromStr for FeeStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "collected" => Ok(Self::Collected),
            other => Err(AppError::validation(format!("未知的管理费状态: {}", other))),
        }
    }
}

/// 管理费 = round(金额 × 费率 / 100, 2)
pub fn calculate_admin_fee(amount: Decimal, percentage: Decimal) -> Decimal {
    money::percentage_of(amount, percentage)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubscriptionTransaction {
    pub id: i32,
    pub seller: UserId,
    pub subscription_id: i32,
    pub sale_id: Option<i32>,
    pub sale_number: Option<String>,
    pub return_id: Option<i32>,
    pub transaction_type: TransactionType,
    pub sale_amount: Option<Decimal>,
    pub admin_fee_percentage: Decimal,
    pub admin_fee_amount: Decimal,
    pub status: FeeStatus,
    pub collected_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// 待写入的管理费记录
#[derive(Debug, Clone, PartialEq)]
pub struct AdminFeeRecord {
    pub seller: UserId,
    pub subscription_id: i32,
    pub sale_id: i32,
    pub sale_amount: Decimal,
    pub admin_fee_percentage: Decimal,
    pub admin_fee_amount: Decimal,
}

/// 流水过滤条件
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    pub seller: Option<UserId>,
    pub range: DateRange,
    pub status: Option<FeeStatus>,
}

/// 卖家管理费汇总（仅 AdminFee）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminFeeSummary {
    pub seller: UserId,
    pub seller_name: String,
    pub plan_name: String,
    pub admin_fee_percentage: Decimal,
    pub total_sales_amount: Decimal,
    pub total_admin_fees: Decimal,
    pub pending_admin_fees: Decimal,
    pub collected_admin_fees: Decimal,
    pub total_transactions: i64,
}
