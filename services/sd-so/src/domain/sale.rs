//! 收银开单

use std::str::FromStr;

use chrono::NaiveDate;
use derive_more::Display;
use rust_decimal::Decimal;
use sc_im::domain::StockKey;
use serde::{Deserialize, Serialize};
use softwear_common::UserId;
use softwear_errors::{AppError, AppResult};

/// 收款方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum PaymentMethod {
    Cash,
    GCash,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "Cash",
            Self::GCash => "GCash",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Cash" => Ok(Self::Cash),
            "GCash" => Ok(Self::GCash),
            other => Err(AppError::validation(format!("未知的收款方式: {}", other))),
        }
    }
}

/// `SALE-{yyyyMMdd}-{seq:04}`
pub fn sale_number(date: NaiveDate, seq: i64) -> String {
    format!("SALE-{}-{:04}", date.format("%Y%m%d"), seq)
}

/// 出库原因
pub fn sale_stock_out_reason(sale_number: &str) -> String {
    format!("Sale: {}", sale_number)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleLine {
    pub key: StockKey,
    pub quantity: i32,
    pub price: Decimal,
}

impl SaleLine {
    pub fn subtotal(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// 待写入的销售单，金额已校验
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSale {
    pub cashier: UserId,
    pub lines: Vec<SaleLine>,
    pub payment_method: PaymentMethod,
    pub amount_paid: Decimal,
    pub change_given: Decimal,
    pub reference_number: Option<String>,
}

impl NewSale {
    pub fn total(&self) -> Decimal {
        self.lines.iter().map(SaleLine::subtotal).sum()
    }
}

/// 计算找零；现金须足额，电子支付按应收入账
pub fn settle_payment(
    method: PaymentMethod,
    total: Decimal,
    amount_paid: Decimal,
) -> AppResult<(Decimal, Decimal)> {
    match method {
        PaymentMethod::Cash => {
            if amount_paid < total {
                return Err(AppError::validation(format!(
                    "实收金额 {} 少于应收 {}",
                    amount_paid, total
                )));
            }
            Ok((amount_paid, amount_paid - total))
        }
        PaymentMethod::GCash => Ok((total, Decimal::ZERO)),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedSale {
    pub id: i32,
    pub sale_number: String,
    /// 收银员所属卖家，管理费记在其名下
    pub seller: UserId,
    pub total: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sale_number_format() {
        let date = NaiveDate::from_ymd_opt(2025, 11, 3).unwrap();
        assert_eq!(sale_number(date, 42), "SALE-20251103-0042");
        assert_eq!(sale_stock_out_reason("SALE-20251103-0042"), "Sale: SALE-20251103-0042");
    }

    #[test]
    fn test_cash_requires_full_payment() {
        let total = Decimal::new(45050, 2);
        assert!(settle_payment(PaymentMethod::Cash, total, Decimal::new(45000, 2)).is_err());

        let (paid, change) =
            settle_payment(PaymentMethod::Cash, total, Decimal::new(50000, 2)).unwrap();
        assert_eq!(paid, Decimal::new(50000, 2));
        assert_eq!(change, Decimal::new(4950, 2));
    }

    #[test]
    fn test_gcash_is_exact() {
        let total = Decimal::new(19900, 2);
        let (paid, change) = settle_payment(PaymentMethod::GCash, total, Decimal::ZERO).unwrap();
        assert_eq!(paid, total);
        assert_eq!(change, Decimal::ZERO);
    }

    #[test]
    fn test_payment_method_parsing() {
        assert_eq!("GCash".parse::<PaymentMethod>().unwrap(), PaymentMethod::GCash);
        assert!("Card".parse::<PaymentMethod>().is_err());
    }
}
