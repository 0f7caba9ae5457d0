//! 卖家订阅

use std::str::FromStr;

use chrono::{DateTime, Utc};
use derive_more::Display;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use softwear_common::UserId;
use softwear_errors::AppError;

use super::PlanAccess;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum SubscriptionStatus {
    Active,
    Cancelled,
    Expired,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Cancelled => "Cancelled",
            Self::Expired => "Expired",
        }
    }
}

impl FromStr for SubscriptionStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Active" => Ok(Self::Active),
            "Cancelled" => Ok(Self::Cancelled),
            "Expired" => Ok(Self::Expired),
            other => Err(AppError::internal(format!("未知的订阅状态: {}", other))),
        }
    }
}

/// 卖家订阅及其套餐快照
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SellerSubscription {
    pub id: i32,
    pub seller: UserId,
    pub plan_id: i32,
    pub plan_name: String,
    pub plan_code: String,
    pub admin_fee_percentage: Decimal,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: SubscriptionStatus,
    pub last_payment_date: Option<DateTime<Utc>>,
    pub next_billing_date: Option<DateTime<Utc>>,
    pub previous_plan_id: Option<i32>,
    pub previous_plan_name: Option<String>,
    pub plan_changed_at: Option<DateTime<Utc>>,
    pub access: PlanAccess,
}

impl SellerSubscription {
    pub fn is_active(&self) -> bool {
        self.status == SubscriptionStatus::Active
    }

    pub fn can_access(&self, module_name: &str) -> bool {
        self.is_active() && self.access.allows_named(module_name)
    }
}
