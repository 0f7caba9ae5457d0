//! 损益明细
//!
//! 销售按收银员归属卖家；退货按原销售日期计入，只算已批准的退货。
//! 净利润 = 净销售额 - 销货成本 - 营业费用 - 管理费（已扣冲销）。

use rust_decimal::Decimal;
use serde::Serialize;
use softwear_common::money::share_percent;
use softwear_common::{DateRange, UserId};

use super::ExpenseTypeTotal;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncomeFilter {
    pub seller: UserId,
    pub range: DateRange,
    /// 只统计收银员当日对账已批准的日期
    pub approved_days_only: bool,
}

impl IncomeFilter {
    pub fn new(seller: UserId, range: DateRange) -> Self {
        Self {
            seller,
            range,
            approved_days_only: false,
        }
    }
}

/// 区间内的销售汇总
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SalesFigures {
    pub gross_sales: Decimal,
    pub transaction_count: i64,
    pub approved_returns: Decimal,
    pub cost_of_goods_sold: Decimal,
    pub admin_fees: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CashierSales {
    pub cashier_id: UserId,
    pub cashier_name: String,
    pub transaction_count: i64,
    pub total_sales: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySales {
    pub category_name: String,
    pub quantity: i64,
    pub total_sales: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentMethodSales {
    pub payment_method: String,
    pub transaction_count: i64,
    /// 现金按实收减找零
    pub total_amount: Decimal,
    pub percentage: Decimal,
}

/// 按金额占比填充 percentage
pub fn with_method_shares(mut methods: Vec<PaymentMethodSales>) -> Vec<PaymentMethodSales> {
    let total: Decimal = methods.iter().map(|m| m.total_amount).sum();
    for method in &mut methods {
        method.percentage = share_percent(method.total_amount, total);
    }
    methods
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncomeBreakdown {
    pub range: DateRange,
    pub approved_days_only: bool,
    pub gross_sales: Decimal,
    pub transaction_count: i64,
    pub approved_returns: Decimal,
    pub net_sales: Decimal,
    pub cost_of_goods_sold: Decimal,
    pub gross_profit: Decimal,
    pub operating_expenses: Vec<ExpenseTypeTotal>,
    pub total_expenses: Decimal,
    pub admin_fees: Decimal,
    pub net_income: Decimal,
    pub by_cashier: Vec<CashierSales>,
    pub by_category: Vec<CategorySales>,
    pub by_payment_method: Vec<PaymentMethodSales>,
}

impl IncomeBreakdown {
    pub fn compose(
        filter: &IncomeFilter,
        figures: SalesFigures,
        operating_expenses: Vec<ExpenseTypeTotal>,
    ) -> Self {
        let net_sales = figures.gross_sales - figures.approved_returns;
        let gross_profit = net_sales - figures.cost_of_goods_sold;
        let total_expenses: Decimal = operating_expenses.iter().map(|e| e.total).sum();
        Self {
            range: filter.range,
            approved_days_only: filter.approved_days_only,
            gross_sales: figures.gross_sales,
            transaction_count: figures.transaction_count,
            approved_returns: figures.approved_returns,
            net_sales,
            cost_of_goods_sold: figures.cost_of_goods_sold,
            gross_profit,
            operating_expenses,
            total_expenses,
            admin_fees: figures.admin_fees,
            net_income: gross_profit - total_expenses - figures.admin_fees,
            by_cashier: Vec::new(),
            by_category: Vec::new(),
            by_payment_method: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(units: i64) -> Decimal {
        Decimal::new(units, 2)
    }

    fn expense(kind: &str, total: i64) -> ExpenseTypeTotal {
        ExpenseTypeTotal {
            expense_type: kind.to_string(),
            count: 1,
            total: d(total),
        }
    }

    #[test]
    fn test_compose_profit_chain() {
        let figures = SalesFigures {
            gross_sales: d(1_000_000),
            transaction_count: 12,
            approved_returns: d(50_000),
            cost_of_goods_sold: d(400_000),
            admin_fees: d(9_500),
        };
        let breakdown = IncomeBreakdown::compose(
            &IncomeFilter::new(UserId(3), DateRange::default()),
            figures,
            vec![expense("Rent", 200_000), expense("Utilities", 35_050)],
        );
        assert_eq!(breakdown.net_sales, d(950_000));
        assert_eq!(breakdown.gross_profit, d(550_000));
        assert_eq!(breakdown.total_expenses, d(235_050));
        assert_eq!(breakdown.net_income, d(305_450));
    }

    #[test]
    fn test_loss_is_negative() {
        let breakdown = IncomeBreakdown::compose(
            &IncomeFilter::new(UserId(3), DateRange::default()),
            SalesFigures::default(),
            vec![expense("Salaries", 100_000)],
        );
        assert_eq!(breakdown.net_income, d(-100_000));
        assert_eq!(breakdown.gross_profit, Decimal::ZERO);
    }

    #[test]
    fn test_method_shares() {
        let method = |name: &str, amount| PaymentMethodSales {
            payment_method: name.to_string(),
            transaction_count: 1,
            total_amount: d(amount),
            percentage: Decimal::ZERO,
        };
        let shares = with_method_shares(vec![method("Cash", 30_000), method("GCash", 60_000)]);
        assert_eq!(shares[0].percentage, d(3_333));
        assert_eq!(shares[1].percentage, d(6_667));

        let empty = with_method_shares(vec![method("Cash", 0)]);
        assert_eq!(empty[0].percentage, Decimal::ZERO);
    }
}
