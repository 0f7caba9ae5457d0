//! 通过计费服务查询卖家订阅

use std::sync::Arc;

use async_trait::async_trait;
use softwear_common::UserId;
use softwear_errors::AppResult;
use sys_billing::application::ServiceHandler as BillingHandler;
use sys_billing::domain::SellerSubscription;

use crate::domain::SubscriptionGateway;

pub struct BillingSubscriptionGateway {
    billing: Arc<BillingHandler>,
}

impl BillingSubscriptionGateway {
    pub fn new(billing: Arc<BillingHandler>) -> Self {
        Self { billing }
    }
}

#[async_trait]
impl SubscriptionGateway for BillingSubscriptionGateway {
    async fn active_subscription(&self, seller: UserId) -> AppResult<Option<SellerSubscription>> {
        self.billing.seller_subscription(seller).await
    }
}
