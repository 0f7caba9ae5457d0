//! 销售命令

use rust_decimal::Decimal;
use sc_im::domain::StockKey;
use softwear_common::{UserId, non_blank};
use softwear_errors::{AppError, AppResult};

use crate::domain::{NewSale, PaymentMethod, SaleLine, settle_payment};

#[derive(Debug, Clone)]
pub struct SaleItemInput {
    pub variant_id: i32,
    pub size_id: Option<i32>,
    pub color_id: Option<i32>,
    pub quantity: i32,
    pub price: Decimal,
}

#[derive(Debug, Clone)]
pub struct CreateSaleCommand {
    pub cashier: UserId,
    pub items: Vec<SaleItemInput>,
    /// `Cash` 或 `GCash`
    pub payment_method: String,
    pub amount_paid: Decimal,
    pub reference_number: Option<String>,
}

impl CreateSaleCommand {
    pub fn validate(&self) -> AppResult<NewSale> {
        if self.items.is_empty() {
            return Err(AppError::validation("销售单至少需要一个商品"));
        }
        let payment_method: PaymentMethod = self.payment_method.parse()?;

        let lines = self
            .items
            .iter()
            .map(|item| {
                if item.quantity <= 0 {
                    return Err(AppError::validation("销售数量必须大于 0"));
                }
                if item.price.is_sign_negative() {
                    return Err(AppError::validation("销售单价不能为负数"));
                }
                Ok(SaleLine {
                    key: StockKey::new(item.variant_id, item.size_id, item.color_id),
                    quantity: item.quantity,
                    price: item.price,
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        let total: Decimal = lines.iter().map(SaleLine::subtotal).sum();
        let (amount_paid, change_given) = settle_payment(payment_method, total, self.amount_paid)?;

        Ok(NewSale {
            cashier: self.cashier,
            lines,
            payment_method,
            amount_paid,
            change_given,
            reference_number: non_blank(self.reference_number.as_deref()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(quantity: i32, cents: i64) -> SaleItemInput {
        SaleItemInput {
            variant_id: 7,
            size_id: Some(1),
            color_id: Some(2),
            quantity,
            price: Decimal::new(cents, 2),
        }
    }

    fn command(items: Vec<SaleItemInput>, method: &str, paid: i64) -> CreateSaleCommand {
        CreateSaleCommand {
            cashier: UserId(5),
            items,
            payment_method: method.to_string(),
            amount_paid: Decimal::new(paid, 2),
            reference_number: Some(" ".to_string()),
        }
    }

    #[test]
    fn test_sale_requires_items() {
        assert!(command(vec![], "Cash", 100).validate().is_err());
    }

    #[test]
    fn test_sale_rejects_zero_quantity() {
        assert!(command(vec![item(0, 100)], "Cash", 100).validate().is_err());
    }

    #[test]
    fn test_cash_sale_computes_change() {
        let sale = command(vec![item(2, 15000), item(1, 9950)], "Cash", 50000)
            .validate()
            .unwrap();
        assert_eq!(sale.total(), Decimal::new(39950, 2));
        assert_eq!(sale.change_given, Decimal::new(10050, 2));
        assert_eq!(sale.reference_number, None);
    }

    #[test]
    fn test_cash_sale_underpaid() {
        let err = command(vec![item(1, 15000)], "Cash", 10000)
            .validate()
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_unknown_payment_method() {
        assert!(command(vec![item(1, 100)], "Card", 100).validate().is_err());
    }
}
