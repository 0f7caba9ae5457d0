//! 退货命令

use softwear_common::{UserId, non_blank};
use softwear_errors::{AppError, AppResult};

use crate::domain::{NewReturn, NewReturnItem, ReturnStatus, StatusChange};

#[derive(Debug, Clone)]
pub struct ReturnItemInput {
    pub sale_item_id: i32,
    pub quantity: i32,
    /// `New`、`Used` 或 `Damaged`
    pub condition: String,
}

#[derive(Debug, Clone)]
pub struct CreateReturnCommand {
    pub sale_id: i32,
    pub cashier: UserId,
    pub reason: Option<String>,
    pub items: Vec<ReturnItemInput>,
}

impl CreateReturnCommand {
    pub fn validate(&self) -> AppResult<NewReturn> {
        if self.items.is_empty() {
            return Err(AppError::validation("退货单至少需要一个商品"));
        }
        let items = self
            .items
            .iter()
            .map(|item| {
                if item.quantity <= 0 {
                    return Err(AppError::validation("退货数量必须大于 0"));
                }
                Ok(NewReturnItem {
                    sale_item_id: item.sale_item_id,
                    quantity: item.quantity,
                    condition: item.condition.parse()?,
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        Ok(NewReturn {
            sale_id: self.sale_id,
            cashier: self.cashier,
            reason: non_blank(self.reason.as_deref()),
            items,
        })
    }
}

#[derive(Debug, Clone)]
pub struct UpdateReturnStatusCommand {
    pub return_id: i32,
    /// `UserId::ANY` 时不校验归属
    pub seller: UserId,
    pub approved_by: UserId,
    pub status: String,
}

impl UpdateReturnStatusCommand {
    pub fn validate(&self) -> AppResult<StatusChange> {
        Ok(StatusChange {
            return_id: self.return_id,
            seller: self.seller,
            approved_by: self.approved_by,
            status: self.status.parse::<ReturnStatus>()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ItemCondition;

    fn command(items: Vec<ReturnItemInput>) -> CreateReturnCommand {
        CreateReturnCommand {
            sale_id: 3,
            cashier: UserId(8),
            reason: Some("  Wrong size ".to_string()),
            items,
        }
    }

    fn item(quantity: i32, condition: &str) -> ReturnItemInput {
        ReturnItemInput {
            sale_item_id: 12,
            quantity,
            condition: condition.to_string(),
        }
    }

    #[test]
    fn test_valid_return() {
        let sales_return = command(vec![item(1, "Used")]).validate().unwrap();
        assert_eq!(sales_return.items[0].condition, ItemCondition::Used);
        assert_eq!(sales_return.reason.as_deref(), Some("Wrong size"));
    }

    #[test]
    fn test_return_needs_positive_quantities() {
        assert!(command(vec![]).validate().is_err());
        assert!(command(vec![item(0, "New")]).validate().is_err());
        assert!(command(vec![item(1, "Torn")]).validate().is_err());
    }

    #[test]
    fn test_status_must_be_known() {
        let cmd = UpdateReturnStatusCommand {
            return_id: 1,
            seller: UserId(2),
            approved_by: UserId(3),
            status: "Refunded".to_string(),
        };
        assert!(cmd.validate().is_err());
    }
}
