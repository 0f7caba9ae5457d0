//! 数据库行映射

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use softwear_common::UserId;
use softwear_errors::AppResult;
use sqlx::FromRow;

use crate::domain::{
    AdminFeeSummary, PlanAccess, SellerSubscription, SubscriptionPlan, SubscriptionTransaction,
};

#[derive(Debug, FromRow)]
pub(super) struct PlanRow {
    pub id: i32,
    pub name: String,
    pub code: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub admin_fee_percentage: Decimal,
    pub has_stock_clerk_access: bool,
    pub has_cashier_access: bool,
    pub has_accounting_access: bool,
    pub has_full_reports_access: bool,
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<PlanRow> for SubscriptionPlan {
    fn from(row: PlanRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            code: row.code,
            description: row.description,
            price: row.price,
            admin_fee_percentage: row.admin_fee_percentage,
            access: PlanAccess {
                stock_clerk: row.has_stock_clerk_access,
                cashier: row.has_cashier_access,
                accounting: row.has_accounting_access,
                full_reports: row.has_full_reports_access,
            },
            display_order: row.display_order,
            is_active: row.is_active,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub(super) struct SubscriptionRow {
    pub id: i32,
    pub seller_user_id: i32,
    pub plan_id: i32,
    pub plan_name: String,
    pub plan_code: String,
    pub admin_fee_percentage: Decimal,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: String,
    pub last_payment_date: Option<DateTime<Utc>>,
    pub next_billing_date: Option<DateTime<Utc>>,
    pub previous_plan_id: Option<i32>,
    pub previous_plan_name: Option<String>,
    pub plan_changed_at: Option<DateTime<Utc>>,
    pub has_stock_clerk_access: bool,
    pub has_cashier_access: bool,
    pub has_accounting_access: bool,
    pub has_full_reports_access: bool,
}

impl SubscriptionRow {
    pub fn into_subscription(self) -> AppResult<SellerSubscription> {
        Ok(SellerSubscription {
            id: self.id,
            seller: UserId(self.seller_user_id),
            plan_id: self.plan_id,
            plan_name: self.plan_name,
            plan_code: self.plan_code,
            admin_fee_percentage: self.admin_fee_percentage,
            start_date: self.start_date,
            end_date: self.end_date,
            status: self.status.parse()?,
            last_payment_date: self.last_payment_date,
            next_billing_date: self.next_billing_date,
            previous_plan_id: self.previous_plan_id,
            previous_plan_name: self.previous_plan_name,
            plan_changed_at: self.plan_changed_at,
            access: PlanAccess {
                stock_clerk: self.has_stock_clerk_access,
                cashier: self.has_cashier_access,
                accounting: self.has_accounting_access,
                full_reports: self.has_full_reports_access,
            },
        })
    }
}

#[derive(Debug, FromRow)]
pub(super) struct TransactionRow {
    pub id: i32,
    pub seller_user_id: i32,
    pub subscription_id: i32,
    pub sale_id: Option<i32>,
    pub sale_number: Option<String>,
    pub return_id: Option<i32>,
    pub transaction_type: String,
    pub sale_amount: Option<Decimal>,
    pub admin_fee_percentage: Decimal,
    pub admin_fee_amount: Decimal,
    pub status: String,
    pub collected_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl TransactionRow {
    pub fn into_transaction(self) -> AppResult<SubscriptionTransaction> {
        Ok(SubscriptionTransaction {
            id: self.id,
            seller: UserId(self.seller_user_id),
            subscription_id: self.subscription_id,
            sale_id: self.sale_id,
            sale_number: self.sale_number,
            return_id: self.return_id,
            transaction_type: self.transaction_type.parse()?,
            sale_amount: self.sale_amount,
            admin_fee_percentage: self.admin_fee_percentage,
            admin_fee_amount: self.admin_fee_amount,
            status: self.status.parse()?,
            collected_at: self.collected_at,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub(super) struct SummaryRow {
    pub seller_user_id: i32,
    pub name: Option<String>,
    pub fname: Option<String>,
    pub lname: Option<String>,
    pub email: String,
    pub plan_name: String,
    pub admin_fee_percentage: Decimal,
    pub total_sales_amount: Decimal,
    pub total_admin_fees: Decimal,
    pub pending_admin_fees: Decimal,
    pub collected_admin_fees: Decimal,
    pub total_transactions: i64,
}

impl From<SummaryRow> for AdminFeeSummary {
    fn from(row: SummaryRow) -> Self {
        Self {
            seller: UserId(row.seller_user_id),
            seller_name: softwear_common::display_name(
                row.name.as_deref(),
                row.fname.as_deref(),
                row.lname.as_deref(),
                &row.email,
            ),
            plan_name: row.plan_name,
            admin_fee_percentage: row.admin_fee_percentage,
            total_sales_amount: row.total_sales_amount,
            total_admin_fees: row.total_admin_fees,
            pending_admin_fees: row.pending_admin_fees,
            collected_admin_fees: row.collected_admin_fees,
            total_transactions: row.total_transactions,
        }
    }
}
