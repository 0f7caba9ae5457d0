//! 数据库行映射

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use softwear_common::display_name;
use sqlx::FromRow;

use crate::domain::{
    DailySales, DailySalesSummary, DayReturn, HourlySales, PaymentBreakdown, PaymentMethodStat,
    RecentTransaction, SaleReport, SaleReportItem, SalesDashboard, TopSellingProduct,
};

#[derive(Debug, FromRow)]
pub(super) struct SaleReportRow {
    pub id: i32,
    pub sale_number: String,
    pub amount: Decimal,
    pub payment_type: String,
    pub amount_paid: Decimal,
    pub change_given: Decimal,
    pub reference_number: Option<String>,
    pub cashier_id: i32,
    pub cashier_name: Option<String>,
    pub cashier_fname: Option<String>,
    pub cashier_lname: Option<String>,
    pub cashier_email: String,
    pub created_at: DateTime<Utc>,
}

impl From<SaleReportRow> for SaleReport {
    fn from(row: SaleReportRow) -> Self {
        let cashier_name = display_name(
            row.cashier_name.as_deref(),
            row.cashier_fname.as_deref(),
            row.cashier_lname.as_deref(),
            &row.cashier_email,
        );
        Self {
            id: row.id,
            sale_number: row.sale_number,
            amount: row.amount,
            payment_method: row.payment_type,
            amount_paid: row.amount_paid,
            change_given: row.change_given,
            reference_number: row.reference_number,
            cashier_id: row.cashier_id,
            cashier_name,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub(super) struct SaleReportItemRow {
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

impl From<SaleReportItemRow> for SaleReportItem {
    fn from(row: SaleReportItemRow) -> Self {
        Self {
            id: row.id,
            sale_id: row.sale_id,
            variant_id: row.variant_id,
            size_id: row.size_id,
            color_id: row.color_id,
            product_name: row.product_name,
            variant_name: row.variant_name,
            size_name: row.size_name,
            color_name: row.color_name,
            color_hex: row.color_hex,
            quantity: row.quantity,
            price: row.price,
            subtotal: row.subtotal,
        }
    }
}

#[derive(Debug, FromRow)]
pub(super) struct DashboardRow {
    pub total_sales: i64,
    pub total_revenue: Decimal,
    pub today_sales: i64,
    pub today_revenue: Decimal,
    pub total_returns: i64,
    pub today_returns: i64,
}

impl From<DashboardRow> for SalesDashboard {
    fn from(row: DashboardRow) -> Self {
        Self {
            total_sales: row.total_sales,
            total_revenue: row.total_revenue,
            total_returns: row.total_returns,
            today_sales: row.today_sales,
            today_revenue: row.today_revenue,
            today_returns: row.today_returns,
        }
    }
}

#[derive(Debug, FromRow)]
pub(super) struct DailySalesRow {
    pub sale_date: NaiveDate,
    pub count: i64,
    pub amount: Decimal,
}

impl From<DailySalesRow> for DailySales {
    fn from(row: DailySalesRow) -> Self {
        Self {
            date: row.sale_date,
            count: row.count,
            amount: row.amount,
        }
    }
}

#[derive(Debug, FromRow)]
pub(super) struct TopSellingRow {
    pub product_id: i32,
    pub variant_id: i32,
    pub product_name: String,
    pub variant_name: String,
    pub total_quantity: i64,
    pub total_revenue: Decimal,
    pub sale_count: i64,
}

impl From<TopSellingRow> for TopSellingProduct {
    fn from(row: TopSellingRow) -> Self {
        Self {
            product_id: row.product_id,
            variant_id: row.variant_id,
            product_name: row.product_name,
            variant_name: row.variant_name,
            total_quantity: row.total_quantity,
            total_revenue: row.total_revenue,
            sale_count: row.sale_count,
        }
    }
}

/// 收款方式分组；看板统计与每日明细共用
#[derive(Debug, FromRow)]
pub(super) struct MethodTotalRow {
    pub payment_method: String,
    pub count: i64,
    pub total_amount: Decimal,
}

impl From<MethodTotalRow> for PaymentMethodStat {
    fn from(row: MethodTotalRow) -> Self {
        Self {
            payment_method: row.payment_method,
            count: row.count,
            total_amount: row.total_amount,
            percentage: Decimal::ZERO,
        }
    }
}

impl From<MethodTotalRow> for PaymentBreakdown {
    fn from(row: MethodTotalRow) -> Self {
        Self {
            payment_method: row.payment_method,
            count: row.count,
            total_amount: row.total_amount,
        }
    }
}

#[derive(Debug, FromRow)]
pub(super) struct RecentTransactionRow {
    pub id: i32,
    pub sale_number: String,
    pub amount: Decimal,
    pub payment_type: String,
    pub created_at: DateTime<Utc>,
}

impl From<RecentTransactionRow> for RecentTransaction {
    fn from(row: RecentTransactionRow) -> Self {
        Self {
            id: row.id,
            sale_number: row.sale_number,
            amount: row.amount,
            payment_method: row.payment_type,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub(super) struct HourlySalesRow {
    pub hour: i32,
    pub count: i64,
    pub amount: Decimal,
}

impl From<HourlySalesRow> for HourlySales {
    fn from(row: HourlySalesRow) -> Self {
        Self {
            hour: row.hour,
            count: row.count,
            amount: row.amount,
        }
    }
}

#[derive(Debug, FromRow)]
pub(super) struct SummaryRow {
    pub cashier_id: i32,
    pub cashier_name: Option<String>,
    pub cashier_fname: Option<String>,
    pub cashier_lname: Option<String>,
    pub cashier_email: String,
    pub sale_date: NaiveDate,
    pub transaction_count: i64,
    pub total_sales: Decimal,
    pub cash_amount: Decimal,
    pub gcash_amount: Decimal,
    pub return_count: i64,
    pub total_returns: Decimal,
    pub status: String,
    pub verified_at: Option<DateTime<Utc>>,
    pub verifier_name: Option<String>,
    pub verifier_fname: Option<String>,
    pub verifier_lname: Option<String>,
    pub verifier_email: Option<String>,
}

impl From<SummaryRow> for DailySalesSummary {
    fn from(row: SummaryRow) -> Self {
        let cashier_name = display_name(
            row.cashier_name.as_deref(),
            row.cashier_fname.as_deref(),
            row.cashier_lname.as_deref(),
            &row.cashier_email,
        );
        let verified_by_name = row.verifier_email.as_deref().map(|email| {
            display_name(
                row.verifier_name.as_deref(),
                row.verifier_fname.as_deref(),
                row.verifier_lname.as_deref(),
                email,
            )
        });
        Self {
            cashier_id: row.cashier_id,
            cashier_name,
            sale_date: row.sale_date,
            transaction_count: row.transaction_count,
            total_sales: row.total_sales,
            cash_amount: row.cash_amount,
            gcash_amount: row.gcash_amount,
            return_count: row.return_count,
            total_returns: row.total_returns,
            // 不清点实收现金，应收即现金收入
            expected_cash: row.cash_amount,
            status: row.status,
            verified_at: row.verified_at,
            verified_by_name,
        }
    }
}

#[derive(Debug, FromRow)]
pub(super) struct DayReturnRow {
    pub id: i32,
    pub return_number: String,
    pub sale_id: i32,
    pub sale_number: String,
    pub reason: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<DayReturnRow> for DayReturn {
    fn from(row: DayReturnRow) -> Self {
        Self {
            id: row.id,
            return_number: row.return_number,
            sale_id: row.sale_id,
            sale_number: row.sale_number,
            reason: row.reason,
            status: row.status,
            created_at: row.created_at,
        }
    }
}
