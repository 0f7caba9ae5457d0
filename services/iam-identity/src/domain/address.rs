//! 用户地址

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use softwear_common::UserId;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub zip: Option<String>,
}

impl Address {
    pub fn is_empty(&self) -> bool {
        [&self.street, &self.city, &self.province, &self.zip]
            .iter()
            .all(|part| part.as_deref().is_none_or(|s| s.trim().is_empty()))
    }
}

/// 已保存的地址
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserAddress {
    pub id: i32,
    pub user_id: UserId,
    pub address: Address,
    pub created_at: DateTime<Utc>,
}
