//! 损益明细与现金流水

use std::sync::Arc;

use softwear_errors::AppResult;
use tracing::info;

use crate::domain::{
    CashflowAudit, CashflowFilter, ExpenseRepository, IncomeBreakdown, IncomeFilter,
    ReportRepository, with_method_shares,
};

pub struct ReportHandler {
    reports: Arc<dyn ReportRepository>,
    expenses: Arc<dyn ExpenseRepository>,
}

impl ReportHandler {
    pub fn new(reports: Arc<dyn ReportRepository>, expenses: Arc<dyn ExpenseRepository>) -> Self {
        Self { reports, expenses }
    }

    /// 营业费用按费用日期统计，不受对账日期限制
    pub async fn income_breakdown(&self, filter: &IncomeFilter) -> AppResult<IncomeBreakdown> {
        let figures = self.reports.sales_figures(filter).await?;
        let operating = self
            .expenses
            .totals_by_type(filter.seller, &filter.range)
            .await?;

        let mut breakdown = IncomeBreakdown::compose(filter, figures, operating);
        breakdown.by_cashier = self.reports.sales_by_cashier(filter).await?;
        breakdown.by_category = self.reports.sales_by_category(filter).await?;
        breakdown.by_payment_method =
            with_method_shares(self.reports.sales_by_payment_method(filter).await?);

        info!(
            seller = filter.seller.0,
            approved_days_only = filter.approved_days_only,
            net_income = %breakdown.net_income,
            "Income breakdown computed"
        );
        Ok(breakdown)
    }

    pub async fn cashflow_audit(&self, filter: &CashflowFilter) -> AppResult<CashflowAudit> {
        let movements = self.reports.cash_movements(filter).await?;
        let audit = CashflowAudit::from_movements(movements);
        info!(
            seller = filter.seller.0,
            cashier = ?filter.cashier.map(|c| c.0),
            movements = audit.movements.len(),
            net = %audit.net_cashflow,
            "Cashflow audit computed"
        );
        Ok(audit)
    }
}
