//! 应付项
//!
//! 两个来源合并成一张应付清单：已完成的采购订单，以及不经采购订单、
//! 按（入库日期, 供应商）分组的散装入库。

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use derive_more::Display;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use softwear_common::{DateRange, UserId};
use softwear_errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum PayableSource {
    PurchaseOrder,
    StockIn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum PaymentStatus {
    Paid,
    #[display("Partially Paid")]
    #[serde(rename = "Partially Paid")]
    PartiallyPaid,
    Unpaid,
}

impl PaymentStatus {
    pub fn of(total: Decimal, paid: Decimal) -> Self {
        if paid >= total {
            Self::Paid
        } else if paid > Decimal::ZERO {
            Self::PartiallyPaid
        } else {
            Self::Unpaid
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Paid" => Ok(Self::Paid),
            "Partially Paid" => Ok(Self::PartiallyPaid),
            "Unpaid" => Ok(Self::Unpaid),
            other => Err(AppError::validation(format!("未知的付款状态: {}", other))),
        }
    }
}

/// 散装入库分组键 `STOCK-{yyyyMMdd}-{supplier_id}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StockGroupKey {
    pub date: NaiveDate,
    pub supplier_id: i32,
}

impl StockGroupKey {
    pub fn new(date: NaiveDate, supplier_id: i32) -> Self {
        Self { date, supplier_id }
    }

    /// 格式不符时返回 None
    pub fn parse(key: &str) -> Option<Self> {
        let mut parts = key.split('-');
        let (Some("STOCK"), Some(date), Some(supplier), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return None;
        };
        if date.len() != 8 || !date.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if supplier.is_empty() || !supplier.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let date = NaiveDate::parse_from_str(date, "%Y%m%d").ok()?;
        let supplier_id = supplier.parse().ok().filter(|id| *id > 0)?;
        Some(Self { date, supplier_id })
    }
}

impl fmt::Display for StockGroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "STOCK-{}-{}", self.date.format("%Y%m%d"), self.supplier_id)
    }
}

/// 应付清单中的一项
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Payable {
    pub source: PayableSource,
    pub po_id: Option<i32>,
    /// 采购订单号或分组键
    pub invoice_number: String,
    pub supplier_id: i32,
    pub supplier_name: String,
    pub invoice_date: NaiveDate,
    pub total_amount: Decimal,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub created_by_name: Option<String>,
    pub total_paid: Decimal,
    pub remaining_balance: Decimal,
    pub payment_status: PaymentStatus,
}

impl Payable {
    /// 按已付金额计算余额与状态；余额不为负
    pub fn settle(mut self, total_paid: Decimal) -> Self {
        self.total_paid = total_paid;
        self.remaining_balance = (self.total_amount - total_paid).max(Decimal::ZERO);
        self.payment_status = PaymentStatus::of(self.total_amount, total_paid);
        self
    }

    pub fn group_key(&self) -> Option<StockGroupKey> {
        match self.source {
            PayableSource::StockIn => Some(StockGroupKey::new(self.invoice_date, self.supplier_id)),
            PayableSource::PurchaseOrder => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PayableFilter {
    pub seller: UserId,
    /// 单号、供应商名称或备注
    pub search: Option<String>,
    pub supplier_id: Option<i32>,
    pub status: Option<PaymentStatus>,
    pub range: DateRange,
}

impl PayableFilter {
    pub fn new(seller: UserId) -> Self {
        Self {
            seller,
            ..Default::default()
        }
    }
}

/// 合并两个来源：按开票日期、创建时间倒序，再按付款状态过滤
pub fn merge_payables(
    orders: Vec<Payable>,
    stock_groups: Vec<Payable>,
    status: Option<PaymentStatus>,
) -> Vec<Payable> {
    let mut items: Vec<Payable> = orders
        .into_iter()
        .chain(stock_groups)
        .filter(|p| status.is_none_or(|s| p.payment_status == s))
        .collect();
    items.sort_by(|a, b| {
        b.invoice_date
            .cmp(&a.invoice_date)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
    items
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PayableSummary {
    pub total_payable: Decimal,
    pub total_paid: Decimal,
    pub outstanding: Decimal,
    pub paid_count: u64,
    pub partially_paid_count: u64,
    pub unpaid_count: u64,
}

impl PayableSummary {
    pub fn from_payables(items: &[Payable]) -> Self {
        let mut summary = Self::default();
        for item in items {
            summary.total_payable += item.total_amount;
            summary.total_paid += item.total_paid;
            summary.outstanding += item.remaining_balance;
            match item.payment_status {
                PaymentStatus::Paid => summary.paid_count += 1,
                PaymentStatus::PartiallyPaid => summary.partially_paid_count += 1,
                PaymentStatus::Unpaid => summary.unpaid_count += 1,
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn payable(source: PayableSource, day: u32, hour: u32, total: i64) -> Payable {
        Payable {
            source,
            po_id: None,
            invoice_number: format!("N-{}-{}", day, hour),
            supplier_id: 21,
            supplier_name: "Threadworks".to_string(),
            invoice_date: date(2025, 12, day),
            total_amount: Decimal::new(total, 2),
            description: None,
            created_at: Utc.with_ymd_and_hms(2025, 12, day, hour, 0, 0).unwrap(),
            created_by_name: None,
            total_paid: Decimal::ZERO,
            remaining_balance: Decimal::ZERO,
            payment_status: PaymentStatus::Unpaid,
        }
    }

    #[test]
    fn test_payment_status() {
        let total = Decimal::new(1000, 0);
        assert_eq!(PaymentStatus::of(total, Decimal::new(1000, 0)), PaymentStatus::Paid);
        assert_eq!(PaymentStatus::of(total, Decimal::new(1, 0)), PaymentStatus::PartiallyPaid);
        assert_eq!(PaymentStatus::of(total, Decimal::ZERO), PaymentStatus::Unpaid);
        assert_eq!(PaymentStatus::PartiallyPaid.to_string(), "Partially Paid");
        assert_eq!("Partially Paid".parse::<PaymentStatus>().unwrap(), PaymentStatus::PartiallyPaid);
    }

    #[test]
    fn test_overpaid_balance_floors_at_zero() {
        let settled = payable(PayableSource::PurchaseOrder, 1, 8, 50000).settle(Decimal::new(60000, 2));
        assert_eq!(settled.remaining_balance, Decimal::ZERO);
        assert_eq!(settled.payment_status, PaymentStatus::Paid);
    }

    #[test]
    fn test_group_key_round_trip() {
        let key = StockGroupKey::new(date(2025, 12, 8), 21);
        assert_eq!(key.to_string(), "STOCK-20251208-21");
        assert_eq!(StockGroupKey::parse("STOCK-20251208-21"), Some(key));
    }

    #[test]
    fn test_malformed_group_keys() {
        for key in [
            "STOCK-2025128-21",
            "STOCK-20251308-21",
            "STOCK-20251208",
            "STOCK-20251208-21-3",
            "STOCK-20251208-x",
            "STOCK-20251208-0",
            "stock-20251208-21",
            "PO-20251208-21",
        ] {
            assert!(StockGroupKey::parse(key).is_none(), "{}", key);
        }
    }

    #[test]
    fn test_merge_orders_newest_first() {
        let orders = vec![payable(PayableSource::PurchaseOrder, 3, 9, 100)];
        let groups = vec![
            payable(PayableSource::StockIn, 3, 14, 100),
            payable(PayableSource::StockIn, 5, 8, 100).settle(Decimal::new(100, 2)),
        ];
        let merged = merge_payables(orders.clone(), groups.clone(), None);
        let dates: Vec<_> = merged.iter().map(|p| (p.invoice_date.day0(), p.source)).collect();
        assert_eq!(
            dates,
            vec![
                (4, PayableSource::StockIn),
                (2, PayableSource::StockIn),
                (2, PayableSource::PurchaseOrder)
            ]
        );

        let unpaid = merge_payables(orders, groups, Some(PaymentStatus::Unpaid));
        assert_eq!(unpaid.len(), 2);
    }

    #[test]
    fn test_summary_counts() {
        let items = vec![
            payable(PayableSource::PurchaseOrder, 1, 8, 10000).settle(Decimal::new(10000, 2)),
            payable(PayableSource::StockIn, 2, 8, 10000).settle(Decimal::new(2500, 2)),
            payable(PayableSource::StockIn, 3, 8, 5000).settle(Decimal::ZERO),
        ];
        let summary = PayableSummary::from_payables(&items);
        assert_eq!(summary.total_payable, Decimal::new(25000, 2));
        assert_eq!(summary.total_paid, Decimal::new(12500, 2));
        assert_eq!(summary.outstanding, Decimal::new(12500, 2));
        assert_eq!(
            (summary.paid_count, summary.partially_paid_count, summary.unpaid_count),
            (1, 1, 1)
        );
    }
}
