//! 数据库行映射

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use softwear_common::{ReceiptImage, UserId, display_name};
use softwear_errors::{AppError, AppResult};
use sqlx::FromRow;

use crate::domain::{
    CashMovement, CashierSales, CategorySales, Expense, ExpenseTypeTotal, MovementCategory,
    PaymentMethodSales,
};

#[derive(Debug, FromRow)]
pub(super) struct ExpenseRow {
    pub id: i32,
    pub expense_type: String,
    pub amount: Decimal,
    pub description: Option<String>,
    pub expense_date: NaiveDate,
    pub receipt_image: Option<String>,
    pub receipt_content_type: Option<String>,
    pub created_by: i32,
    pub creator_name: Option<String>,
    pub creator_fname: Option<String>,
    pub creator_lname: Option<String>,
    pub creator_email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub archived_at: Option<DateTime<Utc>>,
}

impl TryFrom<ExpenseRow> for Expense {
    type Error = AppError;

    fn try_from(row: ExpenseRow) -> AppResult<Self> {
        Ok(Self {
            id: row.id,
            expense_type: row.expense_type.parse()?,
            amount: row.amount,
            description: row.description,
            expense_date: row.expense_date,
            receipt: ReceiptImage::from_columns(row.receipt_image, row.receipt_content_type),
            created_by: UserId(row.created_by),
            created_by_name: display_name(
                row.creator_name.as_deref(),
                row.creator_fname.as_deref(),
                row.creator_lname.as_deref(),
                &row.creator_email,
            ),
            created_at: row.created_at,
            updated_at: row.updated_at,
            archived_at: row.archived_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub(super) struct ExpenseTypeTotalRow {
    pub expense_type: String,
    pub count: i64,
    pub total: Decimal,
}

impl From<ExpenseTypeTotalRow> for ExpenseTypeTotal {
    fn from(row: ExpenseTypeTotalRow) -> Self {
        Self {
            expense_type: row.expense_type,
            count: row.count,
            total: row.total,
        }
    }
}

#[derive(Debug, FromRow)]
pub(super) struct SalesTotalsRow {
    pub gross_sales: Decimal,
    pub transaction_count: i64,
}

#[derive(Debug, FromRow)]
pub(super) struct CashierSalesRow {
    pub cashier_id: i32,
    pub cashier_name: Option<String>,
    pub cashier_fname: Option<String>,
    pub cashier_lname: Option<String>,
    pub cashier_email: String,
    pub transaction_count: i64,
    pub total_sales: Decimal,
}

impl From<CashierSalesRow> for CashierSales {
    fn from(row: CashierSalesRow) -> Self {
        Self {
            cashier_id: UserId(row.cashier_id),
            cashier_name: display_name(
                row.cashier_name.as_deref(),
                row.cashier_fname.as_deref(),
                row.cashier_lname.as_deref(),
                &row.cashier_email,
            ),
            transaction_count: row.transaction_count,
            total_sales: row.total_sales,
        }
    }
}

#[derive(Debug, FromRow)]
pub(super) struct CategorySalesRow {
    pub category_name: String,
    pub quantity: i64,
    pub total_sales: Decimal,
}

impl From<CategorySalesRow> for CategorySales {
    fn from(row: CategorySalesRow) -> Self {
        Self {
            category_name: row.category_name,
            quantity: row.quantity,
            total_sales: row.total_sales,
        }
    }
}

#[derive(Debug, FromRow)]
pub(super) struct MethodSalesRow {
    pub payment_method: String,
    pub transaction_count: i64,
    pub total_amount: Decimal,
}

impl From<MethodSalesRow> for PaymentMethodSales {
    fn from(row: MethodSalesRow) -> Self {
        Self {
            payment_method: row.payment_method,
            transaction_count: row.transaction_count,
            total_amount: row.total_amount,
            percentage: Decimal::ZERO,
        }
    }
}

#[derive(Debug, FromRow)]
pub(super) struct MovementRow {
    pub occurred_at: DateTime<Utc>,
    pub cashier_id: i32,
    pub cashier_name: Option<String>,
    pub cashier_fname: Option<String>,
    pub cashier_lname: Option<String>,
    pub cashier_email: String,
    pub category: String,
    pub source: String,
    pub reference: Option<String>,
    pub amount: Decimal,
}

impl TryFrom<MovementRow> for CashMovement {
    type Error = AppError;

    fn try_from(row: MovementRow) -> AppResult<Self> {
        let category: MovementCategory = row.category.parse()?;
        Ok(Self {
            occurred_at: row.occurred_at,
            cashier_id: UserId(row.cashier_id),
            cashier_name: display_name(
                row.cashier_name.as_deref(),
                row.cashier_fname.as_deref(),
                row.cashier_lname.as_deref(),
                &row.cashier_email,
            ),
            category,
            direction: category.direction(),
            source: row.source,
            reference: row.reference,
            amount: row.amount,
            running_balance: Decimal::ZERO,
        })
    }
}
