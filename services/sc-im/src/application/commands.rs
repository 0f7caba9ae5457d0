//! 库存命令

use rust_decimal::Decimal;
use softwear_common::{UserId, non_blank};
use softwear_errors::{AppError, AppResult};

use crate::domain::{
    AdjustmentType, NewStockAdjustment, NewStockIn, NewStockOut, ReorderLevelUpdate, StockKey,
};

fn require_positive(quantity: i32) -> AppResult<()> {
    if quantity <= 0 {
        return Err(AppError::validation("数量必须大于 0"));
    }
    Ok(())
}

/// 入库
#[derive(Debug, Clone)]
pub struct CreateStockInCommand {
    pub user_id: UserId,
    pub key: StockKey,
    pub quantity: i32,
    pub cost_price: Decimal,
    pub supplier_id: Option<i32>,
}

impl CreateStockInCommand {
    pub fn validate(&self) -> AppResult<NewStockIn> {
        require_positive(self.quantity)?;
        if self.cost_price.is_sign_negative() {
            return Err(AppError::validation("成本价不能为负数"));
        }
        Ok(NewStockIn {
            user_id: self.user_id,
            key: self.key,
            quantity: self.quantity,
            cost_price: self.cost_price,
            supplier_id: self.supplier_id,
            po_id: None,
            return_id: None,
        })
    }
}

/// 出库
#[derive(Debug, Clone)]
pub struct CreateStockOutCommand {
    pub user_id: UserId,
    pub key: StockKey,
    pub quantity: i32,
    pub reason: Option<String>,
}

impl CreateStockOutCommand {
    pub fn validate(&self) -> AppResult<NewStockOut> {
        require_positive(self.quantity)?;
        Ok(NewStockOut {
            user_id: self.user_id,
            key: self.key,
            quantity: self.quantity,
            reason: non_blank(self.reason.as_deref()),
        })
    }
}

/// 库存调整
#[derive(Debug, Clone)]
pub struct CreateAdjustmentCommand {
    pub seller: UserId,
    pub created_by: UserId,
    pub key: StockKey,
    /// `Increase` 或 `Decrease`
    pub adjustment_type: String,
    pub quantity: i32,
    pub reason: Option<String>,
}

impl CreateAdjustmentCommand {
    pub fn validate(&self) -> AppResult<NewStockAdjustment> {
        let adjustment_type: AdjustmentType = self.adjustment_type.parse()?;
        require_positive(self.quantity)?;
        Ok(NewStockAdjustment {
            seller: self.seller,
            created_by: self.created_by,
            key: self.key,
            adjustment_type,
            quantity: self.quantity,
            reason: non_blank(self.reason.as_deref()),
        })
    }
}

/// 补货线
#[derive(Debug, Clone)]
pub struct UpdateReorderLevelCommand {
    pub seller: UserId,
    pub updated_by: UserId,
    pub key: StockKey,
    pub reorder_level: i32,
}

impl UpdateReorderLevelCommand {
    pub fn validate(&self) -> AppResult<ReorderLevelUpdate> {
        if self.reorder_level < 0 {
            return Err(AppError::validation("补货线不能为负数"));
        }
        Ok(ReorderLevelUpdate {
            key: self.key,
            reorder_level: self.reorder_level,
            seller: self.seller,
            updated_by: self.updated_by,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLERK: UserId = UserId(7);

    #[test]
    fn test_stock_in_rejects_negative_cost() {
        let cmd = CreateStockInCommand {
            user_id: CLERK,
            key: StockKey::new(3, Some(1), Some(2)),
            quantity: 10,
            cost_price: Decimal::new(-1, 2),
            supplier_id: None,
        };
        assert!(cmd.validate().is_err());

        let free = CreateStockInCommand {
            cost_price: Decimal::ZERO,
            ..cmd
        };
        assert_eq!(free.validate().unwrap().po_id, None);
    }

    #[test]
    fn test_stock_out_requires_quantity() {
        let cmd = CreateStockOutCommand {
            user_id: CLERK,
            key: StockKey::new(3, None, None),
            quantity: 0,
            reason: Some("  ".to_string()),
        };
        assert!(cmd.validate().is_err());
        let ok = CreateStockOutCommand { quantity: 2, ..cmd }.validate().unwrap();
        assert_eq!(ok.reason, None);
    }

    #[test]
    fn test_adjustment_type_validated() {
        let cmd = CreateAdjustmentCommand {
            seller: UserId(2),
            created_by: CLERK,
            key: StockKey::new(3, None, None),
            adjustment_type: "Shrink".to_string(),
            quantity: 1,
            reason: None,
        };
        assert!(cmd.validate().is_err());
    }

    #[test]
    fn test_reorder_level_not_negative() {
        let cmd = UpdateReorderLevelCommand {
            seller: UserId(2),
            updated_by: CLERK,
            key: StockKey::new(3, None, None),
            reorder_level: -1,
        };
        assert!(cmd.validate().is_err());
    }
}
