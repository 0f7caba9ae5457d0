//! 付款命令

use chrono::NaiveDate;
use rust_decimal::Decimal;
use softwear_common::{ReceiptImage, UserId, non_blank};
use softwear_errors::{AppError, AppResult};

use crate::domain::{NewSupplierPayment, PaymentTarget, StockGroupKey};

/// 采购订单、散装入库分组、发票三者必须且只能给一个
#[derive(Debug, Clone)]
pub struct CreatePaymentCommand {
    pub seller: UserId,
    pub created_by: UserId,
    pub po_id: Option<i32>,
    pub stock_group_key: Option<String>,
    pub invoice_id: Option<i32>,
    pub amount_paid: Decimal,
    /// Cash、GCash、Bank 等
    pub payment_method: String,
    pub payment_date: NaiveDate,
    pub reference_number: Option<String>,
    pub notes: Option<String>,
    pub receipt_image: Option<String>,
    pub receipt_content_type: Option<String>,
}

impl CreatePaymentCommand {
    fn target(&self) -> AppResult<PaymentTarget> {
        let group_key = non_blank(self.stock_group_key.as_deref());
        match (self.po_id, group_key, self.invoice_id) {
            (Some(po_id), None, None) => Ok(PaymentTarget::PurchaseOrder(po_id)),
            (None, Some(key), None) => StockGroupKey::parse(&key)
                .map(PaymentTarget::StockGroup)
                .ok_or_else(|| AppError::validation(format!("入库分组键格式错误: {}", key))),
            (None, None, Some(invoice_id)) => Ok(PaymentTarget::Invoice(invoice_id)),
            _ => Err(AppError::validation("付款必须指定唯一的付款对象")),
        }
    }

    pub fn validate(&self) -> AppResult<NewSupplierPayment> {
        if self.amount_paid <= Decimal::ZERO {
            return Err(AppError::validation("付款金额必须大于 0"));
        }
        let method = non_blank(Some(self.payment_method.as_str()))
            .ok_or_else(|| AppError::validation("付款方式不能为空"))?;
        let receipt = non_blank(self.receipt_image.as_deref())
            .map(|data| ReceiptImage::parse(&data, self.receipt_content_type.as_deref()))
            .transpose()?;

        Ok(NewSupplierPayment {
            seller: self.seller,
            created_by: self.created_by,
            target: self.target()?,
            amount: self.amount_paid,
            method,
            payment_date: self.payment_date,
            reference_number: non_blank(self.reference_number.as_deref()),
            notes: non_blank(self.notes.as_deref()),
            receipt,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command() -> CreatePaymentCommand {
        CreatePaymentCommand {
            seller: UserId(4),
            created_by: UserId(9),
            po_id: None,
            stock_group_key: Some("STOCK-20251208-21".to_string()),
            invoice_id: None,
            amount_paid: Decimal::new(50000, 2),
            payment_method: " GCash ".to_string(),
            payment_date: NaiveDate::from_ymd_opt(2025, 12, 9).unwrap(),
            reference_number: Some("  ".to_string()),
            notes: None,
            receipt_image: Some("aGk=".to_string()),
            receipt_content_type: Some("image/png".to_string()),
        }
    }

    #[test]
    fn test_group_payment() {
        let payment = command().validate().unwrap();
        assert_eq!(
            payment.target,
            PaymentTarget::StockGroup(StockGroupKey::new(
                NaiveDate::from_ymd_opt(2025, 12, 8).unwrap(),
                21
            ))
        );
        assert_eq!(payment.method, "GCash");
        assert!(payment.reference_number.is_none());
        assert_eq!(payment.receipt.unwrap().content_type, "image/png");
    }

    #[test]
    fn test_exactly_one_target() {
        let mut both = command();
        both.po_id = Some(3);
        assert!(both.validate().is_err());

        let mut none = command();
        none.stock_group_key = None;
        assert!(none.validate().is_err());

        let mut malformed = command();
        malformed.stock_group_key = Some("STOCK-2025-21".to_string());
        assert!(malformed.validate().is_err());
    }

    #[test]
    fn test_amount_and_method_required() {
        let mut zero = command();
        zero.amount_paid = Decimal::ZERO;
        assert!(zero.validate().is_err());

        let mut blank = command();
        blank.payment_method = " ".to_string();
        assert!(blank.validate().is_err());
    }
}
