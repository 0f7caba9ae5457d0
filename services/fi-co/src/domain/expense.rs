//! 营业费用

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use derive_more::Display;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use softwear_common::{DateRange, ReceiptImage, UserId};
use softwear_errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum ExpenseType {
    Utilities,
    Rent,
    Salaries,
    Supplies,
    Transportation,
    Maintenance,
    Marketing,
    Miscellaneous,
}

const EXPENSE_TYPES: [ExpenseType; 8] = [
    ExpenseType::Utilities,
    ExpenseType::Rent,
    ExpenseType::Salaries,
    ExpenseType::Supplies,
    ExpenseType::Transportation,
    ExpenseType::Maintenance,
    ExpenseType::Marketing,
    ExpenseType::Miscellaneous,
];

/// 可选的费用类型，顺序固定
pub fn expense_types() -> &'static [ExpenseType] {
    &EXPENSE_TYPES
}

impl ExpenseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Utilities => "Utilities",
            Self::Rent => "Rent",
            Self::Salaries => "Salaries",
            Self::Supplies => "Supplies",
            Self::Transportation => "Transportation",
            Self::Maintenance => "Maintenance",
            Self::Marketing => "Marketing",
            Self::Miscellaneous => "Miscellaneous",
        }
    }
}

impl FromStr for ExpenseType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        EXPENSE_TYPES
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| AppError::validation(format!("未知的费用类型: {}", s)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expense {
    pub id: i32,
    pub expense_type: ExpenseType,
    pub amount: Decimal,
    pub description: Option<String>,
    pub expense_date: NaiveDate,
    pub receipt: Option<ReceiptImage>,
    pub created_by: UserId,
    pub created_by_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub archived_at: Option<DateTime<Utc>>,
}

/// 新增或修改时写入的字段；修改会整体替换收据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpenseDraft {
    pub expense_type: ExpenseType,
    pub amount: Decimal,
    pub description: Option<String>,
    pub expense_date: NaiveDate,
    pub receipt: Option<ReceiptImage>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpenseFilter {
    /// 匹配类型和说明
    pub search: Option<String>,
    pub expense_type: Option<ExpenseType>,
    /// 按费用日期
    pub range: DateRange,
    pub archived: bool,
}

/// 某类费用在区间内的合计
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpenseTypeTotal {
    pub expense_type: String,
    pub count: i64,
    pub total: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_type_list() {
        let names: Vec<&str> = expense_types().iter().map(ExpenseType::as_str).collect();
        assert_eq!(
            names,
            [
                "Utilities",
                "Rent",
                "Salaries",
                "Supplies",
                "Transportation",
                "Maintenance",
                "Marketing",
                "Miscellaneous"
            ]
        );
    }

    #[test]
    fn test_parse_ignores_case() {
        assert_eq!(" rent ".parse::<ExpenseType>().unwrap(), ExpenseType::Rent);
        assert_eq!(ExpenseType::Marketing.to_string(), "Marketing");
        assert!("Taxes".parse::<ExpenseType>().is_err());
    }
}
