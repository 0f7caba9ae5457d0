//! 订阅套餐与模块权限

use chrono::{DateTime, Utc};
use derive_more::Display;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 受套餐控制的业务模块
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum AppModule {
    StockClerk,
    Cashier,
    Accounting,
    Reports,
}

impl AppModule {
    /// 按名称识别模块（忽略大小写），未知名称返回 None
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "stockclerk" | "stock_clerk" | "inventory" => Some(Self::StockClerk),
            "cashier" | "pos" | "sales" => Some(Self::Cashier),
            "accounting" | "finance" => Some(Self::Accounting),
            "reports" | "analytics" => Some(Self::Reports),
            _ => None,
        }
    }
}

/// 套餐包含的模块
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanAccess {
    pub stock_clerk: bool,
    pub cashier: bool,
    pub accounting: bool,
    pub full_reports: bool,
}

impl PlanAccess {
    pub fn allows(&self, module: AppModule) -> bool {
        match module {
            AppModule::StockClerk => self.stock_clerk,
            AppModule::Cashier => self.cashier,
            AppModule::Accounting => self.accounting,
            AppModule::Reports => self.full_reports,
        }
    }

    /// 未知模块一律拒绝
    pub fn allows_named(&self, module_name: &str) -> bool {
        AppModule::parse(module_name).is_some_and(|m| self.allows(m))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubscriptionPlan {
    pub id: i32,
    pub name: String,
    pub code: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub admin_fee_percentage: Decimal,
    pub access: PlanAccess,
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_aliases() {
        assert_eq!(AppModule::parse("Inventory"), Some(AppModule::StockClerk));
        assert_eq!(AppModule::parse("stock_clerk"), Some(AppModule::StockClerk));
        assert_eq!(AppModule::parse("POS"), Some(AppModule::Cashier));
        assert_eq!(AppModule::parse("finance"), Some(AppModule::Accounting));
        assert_eq!(AppModule::parse("analytics"), Some(AppModule::Reports));
        assert_eq!(AppModule::parse("payroll"), None);
    }

    #[test]
    fn test_plan_access() {
        let basic = PlanAccess {
            stock_clerk: true,
            cashier: true,
            ..Default::default()
        };
        assert!(basic.allows_named("sales"));
        assert!(!basic.allows_named("accounting"));
        assert!(!basic.allows_named("reports"));
        assert!(!basic.allows_named("unknown"));
    }
}
