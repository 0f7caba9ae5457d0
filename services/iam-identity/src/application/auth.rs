//! 登录与模块访问

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use softwear_errors::{AppError, AppResult};
use sys_billing::domain::SellerSubscription;
use tracing::{debug, info, warn};

use crate::domain::{AuthUser, Role, SubscriptionGateway, UserRepository, verify_password};

/// 登录后的会话，卖家附带登录时的订阅快照
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthSession {
    pub user: AuthUser,
    pub subscription: Option<SellerSubscription>,
}

impl AuthSession {
    /// 非卖家角色不受套餐限制
    pub fn can_access_module(&self, module_name: &str) -> bool {
        if self.user.role != Role::Seller {
            return true;
        }
        self.subscription
            .as_ref()
            .is_some_and(|s| s.can_access(module_name))
    }

    pub fn admin_fee_percentage(&self) -> Decimal {
        self.subscription
            .as_ref()
            .map(|s| s.admin_fee_percentage)
            .unwrap_or(Decimal::ZERO)
    }
}

pub struct AuthHandler {
    users: Arc<dyn UserRepository>,
    subscriptions: Arc<dyn SubscriptionGateway>,
}

impl AuthHandler {
    pub fn new(users: Arc<dyn UserRepository>, subscriptions: Arc<dyn SubscriptionGateway>) -> Self {
        Self {
            users,
            subscriptions,
        }
    }

    /// 邮箱不存在或密码错误返回 None；卖家没有有效订阅时返回 Forbidden
    pub async fn login(&self, email: &str, password: &str) -> AppResult<Option<AuthSession>> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Ok(None);
        }

        let Some(credentials) = self.users.find_credentials(email).await? else {
            debug!(email, "Login rejected: unknown email");
            return Ok(None);
        };
        if !verify_password(password, &credentials.password_hash) {
            warn!(user_id = credentials.id.0, "Login rejected: wrong password");
            return Ok(None);
        }

        let user = AuthUser::from(credentials);
        let subscription = if user.role == Role::Seller {
            let subscription = self.subscriptions.active_subscription(user.id).await?;
            if subscription.is_none() {
                warn!(user_id = user.id.0, "Seller login refused: no active subscription");
                return Err(AppError::forbidden(
                    "您的账号没有有效订阅，请联系管理员",
                ));
            }
            subscription
        } else {
            None
        };

        info!(user_id = user.id.0, role = %user.role, "User logged in");
        Ok(Some(AuthSession { user, subscription }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Credentials, MockSubscriptionGateway, MockUserRepository, hash_password};
    use chrono::Utc;
    use mockall::predicate::*;
    use softwear_common::UserId;
    use sys_billing::domain::{PlanAccess, SubscriptionStatus};

    fn credentials(role: Role) -> Credentials {
        Credentials {
            id: UserId(7),
            email: "owner@shop.ph".into(),
            password_hash: hash_password("secret"),
            full_name: "Shop Owner".into(),
            role,
            must_change_password: false,
        }
    }

    fn basic_subscription() -> SellerSubscription {
        SellerSubscription {
            id: 1,
            seller: UserId(7),
            plan_id: 1,
            plan_name: "Basic".into(),
            plan_code: "BASIC".into(),
            admin_fee_percentage: Decimal::new(500, 2),
            start_date: Utc::now(),
            end_date: None,
            status: SubscriptionStatus::Active,
            last_payment_date: None,
            next_billing_date: None,
            previous_plan_id: None,
            previous_plan_name: None,
            plan_changed_at: None,
            access: PlanAccess {
                stock_clerk: true,
                cashier: true,
                accounting: false,
                full_reports: false,
            },
        }
    }

    fn handler(users: MockUserRepository, subs: MockSubscriptionGateway) -> AuthHandler {
        AuthHandler::new(Arc::new(users), Arc::new(subs))
    }

    #[tokio::test]
    async fn test_login_trims_email_and_checks_password() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_credentials()
            .with(eq("owner@shop.ph"))
            .times(2)
            .returning(|_| Ok(Some(credentials(Role::Cashier))));
        let handler = handler(users, MockSubscriptionGateway::new());

        let session = handler.login("  owner@shop.ph ", "secret").await.unwrap();
        assert_eq!(session.unwrap().user.role.as_str(), "cashier");
        assert!(handler.login("owner@shop.ph", "wrong").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_seller_without_subscription_is_refused() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_credentials()
            .returning(|_| Ok(Some(credentials(Role::Seller))));
        let mut subs = MockSubscriptionGateway::new();
        subs.expect_active_subscription().returning(|_| Ok(None));

        let err = handler(users, subs)
            .login("owner@shop.ph", "secret")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_seller_session_follows_plan_access() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_credentials()
            .returning(|_| Ok(Some(credentials(Role::Seller))));
        let mut subs = MockSubscriptionGateway::new();
        subs.expect_active_subscription()
            .with(eq(UserId(7)))
            .returning(|_| Ok(Some(basic_subscription())));

        let session = handler(users, subs)
            .login("owner@shop.ph", "secret")
            .await
            .unwrap()
            .unwrap();
        assert!(session.can_access_module("POS"));
        assert!(!session.can_access_module("finance"));
        assert!(!session.can_access_module("unknown"));
        assert_eq!(session.admin_fee_percentage(), Decimal::new(500, 2));
    }

    #[test]
    fn test_non_seller_session_has_full_access() {
        let session = AuthSession {
            user: AuthUser::from(credentials(Role::Accounting)),
            subscription: None,
        };
        assert!(session.can_access_module("Reports"));
        assert_eq!(session.admin_fee_percentage(), Decimal::ZERO);
    }
}
