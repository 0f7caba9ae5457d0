//! 费用与报表仓储接口

use async_trait::async_trait;
use rust_decimal::Decimal;
use softwear_common::{DateRange, Pagination, UserId};
use softwear_errors::AppResult;

use super::{
    CashMovement, CashflowFilter, CashierSales, CategorySales, Expense, ExpenseDraft,
    ExpenseFilter, ExpenseTypeTotal, IncomeFilter, PaymentMethodSales, SalesFigures,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExpenseRepository: Send + Sync {
    /// 在用列表按费用日期倒序，归档列表按归档时间倒序
    async fn list(
        &self,
        seller: UserId,
        filter: &ExpenseFilter,
        pagination: Pagination,
    ) -> AppResult<Vec<Expense>>;

    async fn count(&self, seller: UserId, filter: &ExpenseFilter) -> AppResult<u64>;

    async fn find(&self, seller: UserId, id: i32, archived: bool) -> AppResult<Option<Expense>>;

    async fn insert(&self, seller: UserId, created_by: UserId, draft: &ExpenseDraft)
    -> AppResult<i32>;

    /// 只能修改未归档的费用
    async fn update(&self, seller: UserId, id: i32, draft: &ExpenseDraft) -> AppResult<bool>;

    async fn set_archived(&self, seller: UserId, id: i32, archived: bool) -> AppResult<bool>;

    async fn total(&self, seller: UserId, range: &DateRange) -> AppResult<Decimal>;

    /// 按类型合计，金额大的在前
    async fn totals_by_type(
        &self,
        seller: UserId,
        range: &DateRange,
    ) -> AppResult<Vec<ExpenseTypeTotal>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReportRepository: Send + Sync {
    async fn sales_figures(&self, filter: &IncomeFilter) -> AppResult<SalesFigures>;

    async fn sales_by_cashier(&self, filter: &IncomeFilter) -> AppResult<Vec<CashierSales>>;

    async fn sales_by_category(&self, filter: &IncomeFilter) -> AppResult<Vec<CategorySales>>;

    /// percentage 由调用方填充
    async fn sales_by_payment_method(
        &self,
        filter: &IncomeFilter,
    ) -> AppResult<Vec<PaymentMethodSales>>;

    /// 未排序、未累计余额的原始流水
    async fn cash_movements(&self, filter: &CashflowFilter) -> AppResult<Vec<CashMovement>>;
}
