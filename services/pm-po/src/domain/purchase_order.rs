//! 采购订单实体

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use derive_more::Display;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use softwear_common::{DateRange, UserId};
use softwear_errors::AppError;

/// 采购订单状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum PoStatus {
    Pending,
    Approved,
    Completed,
    Cancelled,
}

impl PoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Approved => "Approved",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }

    /// 取消即归档
    pub fn archives(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl FromStr for PoStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Pending" => Ok(Self::Pending),
            "Approved" => Ok(Self::Approved),
            "Completed" => Ok(Self::Completed),
            "Cancelled" => Ok(Self::Cancelled),
            other => Err(AppError::validation(format!("未知的采购订单状态: {}", other))),
        }
    }
}

/// `PO-{yyyyMM}-{seq:04}`
pub fn po_number(date: NaiveDate, seq: i64) -> String {
    format!("PO-{}-{:04}", date.format("%Y%m"), seq)
}

/// 列表种类，决定状态条件与日期列
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PoListKind {
    /// 未归档且未完成、未取消
    #[default]
    Active,
    /// 已取消，按归档时间
    Cancelled,
    /// 已完成，按更新时间
    Completed,
    /// 待会计审批
    PendingForAccounting,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoFilter {
    pub seller: UserId,
    pub kind: PoListKind,
    pub search: Option<String>,
    /// 仅对 Active 列表生效
    pub status: Option<PoStatus>,
    pub range: DateRange,
}

impl PoFilter {
    pub fn new(seller: UserId, kind: PoListKind) -> Self {
        Self {
            seller,
            kind,
            ..Default::default()
        }
    }
}

/// 列表行
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurchaseOrder {
    pub id: i32,
    pub po_number: String,
    pub supplier_id: i32,
    pub supplier_name: String,
    pub status: String,
    pub total_amount: Decimal,
    pub notes: Option<String>,
    pub expected_delivery_date: Option<NaiveDate>,
    pub item_count: i64,
    pub created_by_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub archived_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoItem {
    pub id: i32,
    pub variant_id: i32,
    pub size_id: Option<i32>,
    pub color_id: Option<i32>,
    pub variant_name: String,
    pub product_name: String,
    pub size_name: Option<String>,
    pub color_name: Option<String>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub received_quantity: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurchaseOrderDetails {
    pub order: PurchaseOrder,
    pub supplier_email: Option<String>,
    pub supplier_contact_person: Option<String>,
    pub supplier_contact_number: Option<String>,
    pub updated_by_name: Option<String>,
    pub items: Vec<PoItem>,
}

impl PurchaseOrderDetails {
    pub fn received_all(&self) -> bool {
        self.items.iter().all(|i| i.received_quantity >= i.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPoItem {
    pub variant_id: i32,
    pub size_id: Option<i32>,
    pub color_id: Option<i32>,
    pub quantity: i32,
    pub unit_price: Decimal,
}

impl NewPoItem {
    pub fn total_price(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPurchaseOrder {
    pub seller: UserId,
    pub created_by: UserId,
    pub supplier_id: i32,
    pub notes: Option<String>,
    pub expected_delivery_date: Option<NaiveDate>,
    pub items: Vec<NewPoItem>,
}

impl NewPurchaseOrder {
    pub fn total_amount(&self) -> Decimal {
        self.items.iter().map(NewPoItem::total_price).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedPurchaseOrder {
    pub id: i32,
    pub po_number: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub id: i32,
    pub seller: UserId,
    pub updated_by: UserId,
    pub status: PoStatus,
}

/// 状态更新结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusOutcome {
    NotFound,
    Updated {
        /// 本次收货生成的入库记录数
        received_items: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_po_number_format() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        assert_eq!(po_number(date, 7), "PO-202503-0007");
        assert_eq!(po_number(date, 12345), "PO-202503-12345");
    }

    #[test]
    fn test_status_parsing_is_exact() {
        assert_eq!(" Completed ".parse::<PoStatus>().unwrap(), PoStatus::Completed);
        assert!("completed".parse::<PoStatus>().is_err());
        assert_eq!(PoStatus::Approved.to_string(), "Approved");
        assert!(PoStatus::Cancelled.archives());
        assert!(!PoStatus::Completed.archives());
    }

    #[test]
    fn test_total_amount_sums_items() {
        let order = NewPurchaseOrder {
            seller: UserId(1),
            created_by: UserId(1),
            supplier_id: 2,
            notes: None,
            expected_delivery_date: None,
            items: vec![
                NewPoItem {
                    variant_id: 1,
                    size_id: None,
                    color_id: None,
                    quantity: 3,
                    unit_price: Decimal::new(1250, 2),
                },
                NewPoItem {
                    variant_id: 2,
                    size_id: Some(1),
                    color_id: None,
                    quantity: 2,
                    unit_price: Decimal::new(500, 2),
                },
            ],
        };
        assert_eq!(order.total_amount(), Decimal::new(4750, 2));
    }
}
