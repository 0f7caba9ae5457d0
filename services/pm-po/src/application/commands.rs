//! 采购订单命令

use chrono::NaiveDate;
use rust_decimal::Decimal;
use softwear_common::{UserId, non_blank};
use softwear_errors::{AppError, AppResult};

use crate::domain::{NewPoItem, NewPurchaseOrder, PoStatus, StatusChange};

#[derive(Debug, Clone)]
pub struct PoItemInput {
    pub variant_id: i32,
    pub size_id: Option<i32>,
    pub color_id: Option<i32>,
    pub quantity: i32,
    pub unit_price: Decimal,
}

#[derive(Debug, Clone)]
pub struct CreatePurchaseOrderCommand {
    pub seller: UserId,
    pub created_by: UserId,
    pub supplier_id: i32,
    pub notes: Option<String>,
    pub expected_delivery_date: Option<NaiveDate>,
    pub items: Vec<PoItemInput>,
}

impl CreatePurchaseOrderCommand {
    pub fn validate(&self) -> AppResult<NewPurchaseOrder> {
        if self.items.is_empty() {
            return Err(AppError::validation("采购订单至少需要一个明细"));
        }
        let items = self
            .items
            .iter()
            .map(|item| {
                if item.quantity <= 0 {
                    return Err(AppError::validation("采购数量必须大于 0"));
                }
                if item.unit_price.is_sign_negative() {
                    return Err(AppError::validation("采购单价不能为负数"));
                }
                Ok(NewPoItem {
                    variant_id: item.variant_id,
                    size_id: item.size_id,
                    color_id: item.color_id,
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        Ok(NewPurchaseOrder {
            seller: self.seller,
            created_by: self.created_by,
            supplier_id: self.supplier_id,
            notes: non_blank(self.notes.as_deref()),
            expected_delivery_date: self.expected_delivery_date,
            items,
        })
    }
}

#[derive(Debug, Clone)]
pub struct UpdatePoStatusCommand {
    pub id: i32,
    pub seller: UserId,
    pub updated_by: UserId,
    pub status: String,
}

impl UpdatePoStatusCommand {
    pub fn validate(&self) -> AppResult<StatusChange> {
        let status: PoStatus = self.status.parse()?;
        Ok(StatusChange {
            id: self.id,
            seller: self.seller,
            updated_by: self.updated_by,
            status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(quantity: i32, cents: i64) -> PoItemInput {
        PoItemInput {
            variant_id: 1,
            size_id: None,
            color_id: None,
            quantity,
            unit_price: Decimal::new(cents, 2),
        }
    }

    fn command(items: Vec<PoItemInput>) -> CreatePurchaseOrderCommand {
        CreatePurchaseOrderCommand {
            seller: UserId(1),
            created_by: UserId(2),
            supplier_id: 3,
            notes: Some("   ".to_string()),
            expected_delivery_date: None,
            items,
        }
    }

    #[test]
    fn test_create_requires_items() {
        assert!(command(vec![]).validate().is_err());
    }

    #[test]
    fn test_create_rejects_bad_items() {
        assert!(command(vec![item(0, 100)]).validate().is_err());
        assert!(command(vec![item(1, -1)]).validate().is_err());
    }

    #[test]
    fn test_create_allows_free_items_and_blanks_notes() {
        let order = command(vec![item(2, 0), item(1, 250)]).validate().unwrap();
        assert_eq!(order.notes, None);
        assert_eq!(order.total_amount(), Decimal::new(250, 2));
    }

    #[test]
    fn test_status_command_parses_status() {
        let cmd = UpdatePoStatusCommand {
            id: 1,
            seller: UserId(1),
            updated_by: UserId(1),
            status: "Shipped".to_string(),
        };
        assert!(cmd.validate().is_err());
    }
}
