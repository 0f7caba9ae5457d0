//! 费用业务处理

use std::sync::Arc;

use rust_decimal::Decimal;
use softwear_common::{DateRange, PagedResult, Pagination, UserId};
use softwear_errors::{AppError, AppResult};
use tracing::info;

use crate::domain::{Expense, ExpenseFilter, ExpenseRepository, ExpenseType, expense_types};

use super::commands::{CreateExpenseCommand, UpdateExpenseCommand};

/// 费用列表查询
#[derive(Debug, Clone, Default)]
pub struct ListExpensesQuery {
    pub seller: UserId,
    pub search: Option<String>,
    pub expense_type: Option<ExpenseType>,
    pub range: DateRange,
    pub archived: bool,
    pub pagination: Pagination,
}

impl ListExpensesQuery {
    fn filter(&self) -> ExpenseFilter {
        ExpenseFilter {
            search: self.search.clone(),
            expense_type: self.expense_type,
            range: self.range,
            archived: self.archived,
        }
    }
}

pub struct ExpenseHandler {
    repo: Arc<dyn ExpenseRepository>,
}

impl ExpenseHandler {
    pub fn new(repo: Arc<dyn ExpenseRepository>) -> Self {
        Self { repo }
    }

    pub fn expense_types(&self) -> &'static [ExpenseType] {
        expense_types()
    }

    /// `archived` 决定查在用还是已归档的费用
    pub async fn list_expenses(&self, query: &ListExpensesQuery) -> AppResult<PagedResult<Expense>> {
        let filter = query.filter();
        let items = self.repo.list(query.seller, &filter, query.pagination).await?;
        let total = self.repo.count(query.seller, &filter).await?;
        Ok(PagedResult::new(items, total, &query.pagination))
    }

    pub async fn count_expenses(&self, query: &ListExpensesQuery) -> AppResult<u64> {
        self.repo.count(query.seller, &query.filter()).await
    }

    pub async fn expense_details(
        &self,
        seller: UserId,
        id: i32,
        archived: bool,
    ) -> AppResult<Option<Expense>> {
        self.repo.find(seller, id, archived).await
    }

    pub async fn create_expense(&self, cmd: CreateExpenseCommand) -> AppResult<i32> {
        let draft = cmd.input.to_draft()?;
        let id = self.repo.insert(cmd.seller, cmd.created_by, &draft).await?;
        info!(
            id,
            seller = cmd.seller.0,
            expense_type = %draft.expense_type,
            amount = %draft.amount,
            with_receipt = draft.receipt.is_some(),
            "Expense recorded"
        );
        Ok(id)
    }

    pub async fn update_expense(&self, cmd: UpdateExpenseCommand) -> AppResult<()> {
        let draft = cmd.input.to_draft()?;
        if !self.repo.update(cmd.seller, cmd.id, &draft).await? {
            return Err(AppError::not_found(format!("费用 {} 不存在或已归档", cmd.id)));
        }
        info!(id = cmd.id, amount = %draft.amount, "Expense updated");
        Ok(())
    }

    /// 删除即归档
    pub async fn delete_expense(&self, seller: UserId, id: i32) -> AppResult<()> {
        if !self.repo.set_archived(seller, id, true).await? {
            return Err(AppError::not_found(format!("费用 {} 不存在或已归档", id)));
        }
        info!(id, seller = seller.0, "Expense archived");
        Ok(())
    }

    pub async fn restore_expense(&self, seller: UserId, id: i32) -> AppResult<()> {
        if !self.repo.set_archived(seller, id, false).await? {
            return Err(AppError::not_found(format!("已归档的费用 {} 不存在", id)));
        }
        info!(id, seller = seller.0, "Expense restored");
        Ok(())
    }

    pub async fn total_expenses(&self, seller: UserId, range: &DateRange) -> AppResult<Decimal> {
        self.repo.total(seller, range).await
    }
}
