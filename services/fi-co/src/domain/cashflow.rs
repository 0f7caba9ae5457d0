//! 现金流水稽核
//!
//! 现金销售为流入；已批准退款、费用、现金供应商付款为流出。
//! 流水按发生时间排序，余额从 0 开始逐笔累计。

use std::str::FromStr;

use chrono::{DateTime, Utc};
use derive_more::Display;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use softwear_common::{DateRange, UserId};
use softwear_errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum MovementDirection {
    In,
    Out,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum MovementCategory {
    Sale,
    Refund,
    Expense,
    SupplierPayment,
}

impl MovementCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sale => "Sale",
            Self::Refund => "Refund",
            Self::Expense => "Expense",
            Self::SupplierPayment => "SupplierPayment",
        }
    }

    pub fn direction(&self) -> MovementDirection {
        match self {
            Self::Sale => MovementDirection::In,
            _ => MovementDirection::Out,
        }
    }
}

impl FromStr for MovementCategory {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Sale" => Ok(Self::Sale),
            "Refund" => Ok(Self::Refund),
            "Expense" => Ok(Self::Expense),
            "SupplierPayment" => Ok(Self::SupplierPayment),
            other => Err(AppError::internal(format!("未知的流水类别: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CashflowFilter {
    pub seller: UserId,
    /// 只看某个收银员经手的流水
    pub cashier: Option<UserId>,
    pub range: DateRange,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CashMovement {
    pub occurred_at: DateTime<Utc>,
    pub cashier_id: UserId,
    pub cashier_name: String,
    pub category: MovementCategory,
    pub direction: MovementDirection,
    /// 费用类型，或销售、退款、供应商付款的说明
    pub source: String,
    pub reference: Option<String>,
    pub amount: Decimal,
    pub running_balance: Decimal,
}

impl CashMovement {
    /// 流入为正，流出为负
    pub fn signed_amount(&self) -> Decimal {
        match self.direction {
            MovementDirection::In => self.amount,
            MovementDirection::Out => -self.amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CashflowAudit {
    pub movements: Vec<CashMovement>,
    pub total_in: Decimal,
    pub total_out: Decimal,
    pub net_cashflow: Decimal,
}

impl CashflowAudit {
    /// 丢弃非正金额，按时间稳定排序后计算累计余额
    pub fn from_movements(mut movements: Vec<CashMovement>) -> Self {
        movements.retain(|m| m.amount > Decimal::ZERO);
        movements.sort_by_key(|m| m.occurred_at);

        let mut balance = Decimal::ZERO;
        let mut total_in = Decimal::ZERO;
        let mut total_out = Decimal::ZERO;
        for movement in &mut movements {
            match movement.direction {
                MovementDirection::In => total_in += movement.amount,
                MovementDirection::Out => total_out += movement.amount,
            }
            balance += movement.signed_amount();
            movement.running_balance = balance;
        }

        Self {
            movements,
            total_in,
            total_out,
            net_cashflow: total_in - total_out,
        }
    }
}
