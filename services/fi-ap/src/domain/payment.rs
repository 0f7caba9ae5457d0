//! 供应商付款

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use softwear_common::{ReceiptImage, UserId};
use softwear_errors::{AppError, AppResult};

use super::StockGroupKey;

/// 付款对象
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentTarget {
    PurchaseOrder(i32),
    StockGroup(StockGroupKey),
    /// 手工或散装入库生成的供应商发票
    Invoice(i32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSupplierPayment {
    pub seller: UserId,
    pub created_by: UserId,
    pub target: PaymentTarget,
    pub amount: Decimal,
    pub method: String,
    pub payment_date: NaiveDate,
    pub reference_number: Option<String>,
    pub notes: Option<String>,
    pub receipt: Option<ReceiptImage>,
}

/// 付款不能超过剩余应付
pub fn check_amount(amount: Decimal, total: Decimal, paid: Decimal) -> AppResult<()> {
    let remaining = (total - paid).max(Decimal::ZERO);
    if amount > remaining {
        return Err(AppError::validation(format!(
            "付款金额 {} 超过剩余应付 {}",
            amount, remaining
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SupplierPayment {
    pub id: i32,
    pub invoice_id: Option<i32>,
    pub po_id: Option<i32>,
    pub stock_group_key: Option<String>,
    /// 采购订单号、分组键或发票号
    pub invoice_number: String,
    pub amount_paid: Decimal,
    pub payment_method: String,
    pub payment_date: NaiveDate,
    pub reference_number: Option<String>,
    pub notes: Option<String>,
    pub receipt: Option<ReceiptImage>,
    pub created_at: DateTime<Utc>,
    pub created_by: UserId,
    pub created_by_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_within_balance() {
        let total = Decimal::new(100000, 2);
        let paid = Decimal::new(40000, 2);
        assert!(check_amount(Decimal::new(60000, 2), total, paid).is_ok());
        assert!(check_amount(Decimal::new(60001, 2), total, paid).is_err());
        assert!(check_amount(Decimal::new(1, 2), total, total).is_err());
    }
}
