//! 通过计费服务记录管理费

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use softwear_common::UserId;
use softwear_errors::AppResult;
use sys_billing::application::ServiceHandler as BillingHandler;

use crate::domain::AdminFeeGateway;

pub struct BillingAdminFeeGateway {
    billing: Arc<BillingHandler>,
}

impl BillingAdminFeeGateway {
    pub fn new(billing: Arc<BillingHandler>) -> Self {
        Self { billing }
    }
}

#[async_trait]
impl AdminFeeGateway for BillingAdminFeeGateway {
    async fn record_admin_fee(
        &self,
        seller: UserId,
        sale_id: i32,
        sale_amount: Decimal,
    ) -> AppResult<Option<i32>> {
        self.billing.record_admin_fee(seller, sale_id, sale_amount).await
    }
}
