//! 销售报表与看板

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use softwear_common::money::share_percent;
use softwear_common::{DateRange, UserId};

/// 销售报表过滤
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaleFilter {
    pub seller: UserId,
    /// `UserId::ANY` 表示卖家名下全部收银员
    pub cashier: UserId,
    pub search: Option<String>,
    pub range: DateRange,
    /// 仅统计已通过每日核对的日期
    pub only_approved_days: bool,
}

impl SaleFilter {
    pub fn new(seller: UserId) -> Self {
        Self {
            seller,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaleReport {
    pub id: i32,
    pub sale_number: String,
    pub amount: Decimal,
    pub payment_method: String,
    /// 无收款记录时等于 amount
    pub amount_paid: Decimal,
    pub change_given: Decimal,
    pub reference_number: Option<String>,
    pub cashier_id: i32,
    pub cashier_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaleReportItem {
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
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SalesDashboard {
    pub total_sales: i64,
    pub total_revenue: Decimal,
    pub total_returns: i64,
    pub today_sales: i64,
    pub today_revenue: Decimal,
    pub today_returns: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailySales {
    pub date: NaiveDate,
    pub count: i64,
    pub amount: Decimal,
}

impl DailySales {
    pub fn zero(date: NaiveDate) -> Self {
        Self {
            date,
            count: 0,
            amount: Decimal::ZERO,
        }
    }
}

/// 区间内每天一行，缺失补 0
pub fn fill_daily_sales(range: &DateRange, data: &[DailySales]) -> Vec<DailySales> {
    range
        .days()
        .into_iter()
        .map(|date| {
            data.iter()
                .find(|d| d.date == date)
                .copied()
                .unwrap_or_else(|| DailySales::zero(date))
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopSellingProduct {
    pub product_id: i32,
    pub variant_id: i32,
    pub product_name: String,
    pub variant_name: String,
    pub total_quantity: i64,
    pub total_revenue: Decimal,
    pub sale_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentMethodStat {
    pub payment_method: String,
    pub count: i64,
    pub total_amount: Decimal,
    pub percentage: Decimal,
}

/// 计算占比并按金额降序
pub fn rank_payment_methods(mut stats: Vec<PaymentMethodStat>) -> Vec<PaymentMethodStat> {
    let total: Decimal = stats.iter().map(|s| s.total_amount).sum();
    for stat in &mut stats {
        stat.percentage = share_percent(stat.total_amount, total);
    }
    stats.sort_by(|a, b| b.total_amount.cmp(&a.total_amount));
    stats
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentTransaction {
    pub id: i32,
    pub sale_number: String,
    pub amount: Decimal,
    pub payment_method: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HourlySales {
    pub hour: i32,
    pub count: i64,
    pub amount: Decimal,
}

/// 0 到 23 点各一行
pub fn fill_hours(data: &[HourlySales]) -> Vec<HourlySales> {
    (0..24)
        .map(|hour| {
            data.iter().find(|h| h.hour == hour).copied().unwrap_or(HourlySales {
                hour,
                count: 0,
                amount: Decimal::ZERO,
            })
        })
        .collect()
}
