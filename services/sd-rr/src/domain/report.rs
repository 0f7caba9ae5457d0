//! 退货报表与可退销售

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use softwear_common::{DateRange, UserId};

use super::ReturnStatus;

/// 查询范围
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReturnOwner {
    /// 不限
    #[default]
    Any,
    /// 收银员本人提交的退货
    Cashier(UserId),
    /// 卖家本人或其员工提交的退货
    Seller(UserId),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReturnFilter {
    pub owner: ReturnOwner,
    /// 退货单号或销售单号
    pub search: Option<String>,
    pub range: DateRange,
    pub status: Option<ReturnStatus>,
}

impl ReturnFilter {
    pub fn new(owner: ReturnOwner) -> Self {
        Self {
            owner,
            ..Default::default()
        }
    }

    /// 会计待审批列表
    pub fn pending_for(seller: UserId) -> Self {
        Self {
            owner: ReturnOwner::Seller(seller),
            status: Some(ReturnStatus::Pending),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnReport {
    pub id: i32,
    pub return_number: String,
    pub sale_id: i32,
    pub sale_number: String,
    pub reason: Option<String>,
    pub status: String,
    pub cashier_name: String,
    pub refund_amount: Decimal,
    pub approved_by_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnReportItem {
    pub id: i32,
    pub return_id: i32,
    pub sale_item_id: i32,
    pub variant_id: i32,
    pub size_id: Option<i32>,
    pub color_id: Option<i32>,
    pub product_name: String,
    pub variant_name: String,
    pub size_name: Option<String>,
    pub color_name: Option<String>,
    pub color_hex: Option<String>,
    pub quantity: i32,
    pub condition: String,
    pub price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnDetails {
    pub report: ReturnReport,
    pub items: Vec<ReturnReportItem>,
}

/// 可发起退货的销售单过滤；按收银员
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReturnableSaleFilter {
    pub cashier: UserId,
    pub search: Option<String>,
    pub range: DateRange,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnableSale {
    pub id: i32,
    pub sale_number: String,
    pub amount: Decimal,
    pub payment_method: String,
    pub cashier_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnableSaleItem {
    pub id: i32,
    pub sale_id: i32,
    pub variant_id: i32,
    pub size_id: Option<i32>,
    pub color_id: Option<i32>,
    pub product_name: String,
    pub variant_name: String,
    pub size_name: Option<String>,
    pub color_name: Option<String>,
    pub color_hex: Option<String>,
    pub quantity: i32,
    pub price: Decimal,
    pub subtotal: Decimal,
    pub returned_quantity: i32,
    pub returnable_quantity: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyReturns {
    pub date: NaiveDate,
    pub count: i64,
}

/// 区间内每天一行，缺失补 0
pub fn fill_daily_returns(range: &DateRange, data: &[DailyReturns]) -> Vec<DailyReturns> {
    range
        .days()
        .into_iter()
        .map(|date| {
            data.iter()
                .find(|d| d.date == date)
                .copied()
                .unwrap_or(DailyReturns { date, count: 0 })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_filter_scopes_seller() {
        let filter = ReturnFilter::pending_for(UserId(4));
        assert_eq!(filter.owner, ReturnOwner::Seller(UserId(4)));
        assert_eq!(filter.status, Some(ReturnStatus::Pending));
    }

    #[test]
    fn test_fill_daily_returns() {
        let day = |d| NaiveDate::from_ymd_opt(2025, 8, d).unwrap();
        let filled = fill_daily_returns(
            &DateRange::between(day(1), day(4)),
            &[DailyReturns {
                date: day(3),
                count: 2,
            }],
        );
        assert_eq!(filled.len(), 4);
        assert_eq!(filled[2].count, 2);
        assert_eq!(filled[3].count, 0);
    }
}
