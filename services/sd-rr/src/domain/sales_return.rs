//! 退货单
//!
//! 申请时不动库存；首次批准时按明细回库，并按退款金额冲销管理费。

use std::collections::HashMap;
use std::str::FromStr;

use chrono::NaiveDate;
use derive_more::Display;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use softwear_common::UserId;
use softwear_errors::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum ReturnStatus {
    Pending,
    Approved,
    Rejected,
}

impl ReturnStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
        }
    }
}

impl FromStr for ReturnStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Pending" => Ok(Self::Pending),
            "Approved" => Ok(Self::Approved),
            "Rejected" => Ok(Self::Rejected),
            other => Err(AppError::validation(format!("未知的退货状态: {}", other))),
        }
    }
}

/// 退回商品的状况
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum ItemCondition {
    New,
    Used,
    Damaged,
}

impl ItemCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Used => "Used",
            Self::Damaged => "Damaged",
        }
    }
}

impl FromStr for ItemCondition {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "New" => Ok(Self::New),
            "Used" => Ok(Self::Used),
            "Damaged" => Ok(Self::Damaged),
            other => Err(AppError::validation(format!("未知的商品状况: {}", other))),
        }
    }
}

/// `RET-{yyyyMMdd}-{seq:04}`
pub fn return_number(date: NaiveDate, seq: i64) -> String {
    format!("RET-{}-{:04}", date.format("%Y%m%d"), seq)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewReturnItem {
    pub sale_item_id: i32,
    pub quantity: i32,
    pub condition: ItemCondition,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReturn {
    pub sale_id: i32,
    pub cashier: UserId,
    pub reason: Option<String>,
    pub items: Vec<NewReturnItem>,
}

/// 销售明细的可退数量
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReturnableLine {
    pub sale_item_id: i32,
    pub sold: i32,
    /// 未被驳回的退货中已占用的数量
    pub returned: i32,
}

impl ReturnableLine {
    pub fn remaining(&self) -> i32 {
        (self.sold - self.returned).max(0)
    }
}

/// 校验每个明细的退货数量不超过剩余可退数量；同一明细出现多次时合计
pub fn check_returnable(items: &[NewReturnItem], lines: &[ReturnableLine]) -> AppResult<()> {
    check_quantities(items.iter().map(|i| (i.sale_item_id, i.quantity)), lines)
}

/// 按 (销售明细, 数量) 校验，供已存在的退货单在批准时复核
pub fn check_quantities(
    items: impl IntoIterator<Item = (i32, i32)>,
    lines: &[ReturnableLine],
) -> AppResult<()> {
    let mut requested: HashMap<i32, i32> = HashMap::new();
    for (sale_item_id, quantity) in items {
        *requested.entry(sale_item_id).or_default() += quantity;
    }

    for (sale_item_id, quantity) in requested {
        let line = lines
            .iter()
            .find(|l| l.sale_item_id == sale_item_id)
            .ok_or_else(|| {
                AppError::validation(format!("销售明细 {} 不属于该销售单", sale_item_id))
            })?;
        if quantity > line.remaining() {
            return Err(AppError::validation(format!(
                "销售明细 {} 最多可退 {} 件，申请 {} 件",
                sale_item_id,
                line.remaining(),
                quantity
            )));
        }
    }
    Ok(())
}

/// 退款金额 = Σ 原售价 × 退货数量
pub fn refund_amount(lines: impl IntoIterator<Item = (Decimal, i32)>) -> Decimal {
    lines
        .into_iter()
        .map(|(price, quantity)| price * Decimal::from(quantity))
        .sum()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedReturn {
    pub id: i32,
    pub return_number: String,
}

/// 审批；`seller` 为 `UserId::ANY` 时不校验归属
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub return_id: i32,
    pub seller: UserId,
    pub approved_by: UserId,
    pub status: ReturnStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusOutcome {
    NotFound,
    /// 首次批准时带回库件数与退款金额
    Updated {
        restocked: Option<(usize, Decimal)>,
    },
}
