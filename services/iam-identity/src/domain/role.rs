//! 角色

use std::str::FromStr;

use derive_more::Display;
use serde::{Deserialize, Serialize};
use softwear_errors::AppError;

/// 系统角色，名称与 `tbl_roles.name` 一致
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum Role {
    #[display("admin")]
    Admin,
    #[display("seller")]
    Seller,
    #[display("accounting")]
    Accounting,
    #[display("cashier")]
    Cashier,
    #[display("stockclerk")]
    StockClerk,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Admin,
        Role::Seller,
        Role::Accounting,
        Role::Cashier,
        Role::StockClerk,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Seller => "seller",
            Self::Accounting => "accounting",
            Self::Cashier => "cashier",
            Self::StockClerk => "stockclerk",
        }
    }

    /// 归属方的角色：管理员没有归属，卖家归属管理员，员工归属卖家
    pub fn owner_role(&self) -> Option<Role> {
        match self {
            Self::Admin => None,
            Self::Seller => Some(Self::Admin),
            Self::Accounting | Self::Cashier | Self::StockClerk => Some(Self::Seller),
        }
    }

    pub fn is_staff(&self) -> bool {
        matches!(self, Self::Accounting | Self::Cashier | Self::StockClerk)
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "seller" => Ok(Self::Seller),
            "accounting" => Ok(Self::Accounting),
            "cashier" => Ok(Self::Cashier),
            "stockclerk" | "stock_clerk" => Ok(Self::StockClerk),
            other => Err(AppError::validation(format!("未知的角色: {}", other))),
        }
    }
}
