//! 每日销售核对：会计按收银员、按日核对现金

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use derive_more::Display;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use softwear_common::{DateRange, UserId};
use softwear_errors::AppError;

use super::SaleReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum VerificationStatus {
    Pending,
    Approved,
    Rejected,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
        }
    }
}

impl FromStr for VerificationStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Pending" => Ok(Self::Pending),
            "Approved" => Ok(Self::Approved),
            "Rejected" => Ok(Self::Rejected),
            other => Err(AppError::validation(format!("未知的核对状态: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerificationFilter {
    pub seller: UserId,
    /// 收银员姓名
    pub search: Option<String>,
    pub range: DateRange,
    /// 报表用；待核对列表固定为未核对或 Pending
    pub status: Option<VerificationStatus>,
}

impl VerificationFilter {
    pub fn new(seller: UserId) -> Self {
        Self {
            seller,
            ..Default::default()
        }
    }
}

/// 某收银员某天的汇总；退货按原销售日期归集
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySalesSummary {
    pub cashier_id: i32,
    pub cashier_name: String,
    pub sale_date: NaiveDate,
    pub transaction_count: i64,
    pub total_sales: Decimal,
    /// 现金实收减找零
    pub cash_amount: Decimal,
    pub gcash_amount: Decimal,
    pub return_count: i64,
    pub total_returns: Decimal,
    pub expected_cash: Decimal,
    pub status: String,
    pub verified_at: Option<DateTime<Utc>>,
    pub verified_by_name: Option<String>,
}

/// 当天已批准的退货
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayReturn {
    pub id: i32,
    pub return_number: String,
    pub sale_id: i32,
    pub sale_number: String,
    pub reason: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentBreakdown {
    pub payment_method: String,
    pub count: i64,
    pub total_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySalesDetails {
    pub summary: DailySalesSummary,
    pub sales: Vec<SaleReport>,
    pub returns: Vec<DayReturn>,
    pub payment_breakdown: Vec<PaymentBreakdown>,
}

/// 批准或驳回
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationDecision {
    pub seller: UserId,
    pub cashier: UserId,
    pub sale_date: NaiveDate,
    pub verified_by: UserId,
    pub status: VerificationStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip_names() {
        for status in [
            VerificationStatus::Pending,
            VerificationStatus::Approved,
            VerificationStatus::Rejected,
        ] {
            assert_eq!(status.as_str().parse::<VerificationStatus>().unwrap(), status);
            assert_eq!(status.to_string(), status.as_str());
        }
        assert!("approved".parse::<VerificationStatus>().is_err());
    }
}
