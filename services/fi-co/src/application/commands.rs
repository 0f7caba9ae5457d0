//! 费用命令

use chrono::NaiveDate;
use rust_decimal::Decimal;
use softwear_common::{ReceiptImage, UserId, non_blank};
use softwear_errors::{AppError, AppResult};

use crate::domain::{ExpenseDraft, ExpenseType};

const MAX_DESCRIPTION_LEN: usize = 500;

/// 创建或修改费用时的输入
#[derive(Debug, Clone)]
pub struct ExpenseInput {
    /// 固定类型之一
    pub expense_type: String,
    pub amount: Decimal,
    pub description: Option<String>,
    pub expense_date: NaiveDate,
    /// base64 或 `data:` URI
    pub receipt_image: Option<String>,
    pub receipt_content_type: Option<String>,
}

impl ExpenseInput {
    pub fn to_draft(&self) -> AppResult<ExpenseDraft> {
        let expense_type: ExpenseType = self.expense_type.parse()?;
        if self.amount <= Decimal::ZERO {
            return Err(AppError::validation("费用金额必须大于 0"));
        }
        let description = non_blank(self.description.as_deref());
        if let Some(text) = &description
            && text.chars().count() > MAX_DESCRIPTION_LEN
        {
            return Err(AppError::validation(format!(
                "费用说明长度不能超过{}个字符",
                MAX_DESCRIPTION_LEN
            )));
        }
        let receipt = non_blank(self.receipt_image.as_deref())
            .map(|data| ReceiptImage::parse(&data, self.receipt_content_type.as_deref()))
            .transpose()?;

        Ok(ExpenseDraft {
            expense_type,
            amount: self.amount,
            description,
            expense_date: self.expense_date,
            receipt,
        })
    }
}

#[derive(Debug, Clone)]
pub struct CreateExpenseCommand {
    pub seller: UserId,
    pub created_by: UserId,
    pub input: ExpenseInput,
}

#[derive(Debug, Clone)]
pub struct UpdateExpenseCommand {
    pub seller: UserId,
    pub id: i32,
    pub input: ExpenseInput,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> ExpenseInput {
        ExpenseInput {
            expense_type: "utilities".to_string(),
            amount: Decimal::new(185050, 2),
            description: Some("  Meralco bill, July ".to_string()),
            expense_date: NaiveDate::from_ymd_opt(2025, 7, 31).unwrap(),
            receipt_image: Some("data:image/png;base64,aGk=".to_string()),
            receipt_content_type: None,
        }
    }

    #[test]
    fn test_draft_normalizes_fields() {
        let draft = input().to_draft().unwrap();
        assert_eq!(draft.expense_type, ExpenseType::Utilities);
        assert_eq!(draft.description.as_deref(), Some("Meralco bill, July"));
        assert_eq!(draft.receipt.unwrap().content_type, "image/png");
    }

    #[test]
    fn test_unknown_type_rejected() {
        let mut other = input();
        other.expense_type = "Gifts".to_string();
        assert!(other.to_draft().is_err());
    }

    #[test]
    fn test_amount_must_be_positive() {
        let mut zero = input();
        zero.amount = Decimal::ZERO;
        assert!(zero.to_draft().is_err());
        zero.amount = Decimal::new(-1, 0);
        assert!(zero.to_draft().is_err());
    }

    #[test]
    fn test_blank_receipt_is_none() {
        let mut blank = input();
        blank.receipt_image = Some("   ".to_string());
        assert!(blank.to_draft().unwrap().receipt.is_none());
    }
}
