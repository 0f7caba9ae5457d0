//! 用户实体

use chrono::{DateTime, NaiveDate, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use softwear_common::UserId;

use super::{Address, Email, Role};

/// 性别，数据库中 0 = Male，1 = Female
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn code(&self) -> i16 {
        match self {
            Self::Male => 0,
            Self::Female => 1,
        }
    }

    pub fn from_code(code: i16) -> Self {
        if code == 0 { Self::Male } else { Self::Female }
    }

    /// 无法识别的文本视为未填写
    pub fn parse(value: Option<&str>) -> Option<Self> {
        match value?.trim().to_ascii_lowercase().as_str() {
            "male" => Some(Self::Male),
            "female" => Some(Self::Female),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
pub enum UserStatus {
    #[display("ACTIVE")]
    Active,
    #[display("INACTIVE")]
    Inactive,
}

impl UserStatus {
    /// `is_active` 为空视为启用
    pub fn from_flag(is_active: Option<bool>) -> Self {
        if is_active.unwrap_or(true) {
            Self::Active
        } else {
            Self::Inactive
        }
    }
}

/// 个人信息
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalInfo {
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub contact: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub age: Option<i32>,
    pub sex: Option<Sex>,
}

impl PersonalInfo {
    pub fn full_name(&self) -> String {
        softwear_common::full_name(&self.first_name, self.middle_name.as_deref(), &self.last_name)
    }
}

/// 新建或修改用户时写入的资料
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub email: Email,
    pub info: PersonalInfo,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub role: Role,
    pub owner: Option<UserId>,
    pub password_hash: String,
    pub profile: UserProfile,
}

/// 用户列表查询条件
#[derive(Debug, Clone, PartialEq)]
pub struct UserFilter {
    pub role: Role,
    pub owner: Option<UserId>,
    pub search: Option<String>,
    pub archived: bool,
}

/// 用户列表行；归档列表带归档时间
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserSummary {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub archived_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserDetails {
    pub id: UserId,
    pub full_name: String,
    pub email: String,
    pub birthday: Option<NaiveDate>,
    pub age: Option<i32>,
    pub sex: Option<Sex>,
    pub contact: Option<String>,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub archived_at: Option<DateTime<Utc>>,
    pub address: Option<Address>,
}

/// 登录校验所需的账号信息
#[derive(Debug, Clone, PartialEq)]
pub struct Credentials {
    pub id: UserId,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub role: Role,
    pub must_change_password: bool,
}

/// 已登录用户
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthUser {
    pub id: UserId,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub must_change_password: bool,
}

impl From<Credentials> for AuthUser {
    fn from(c: Credentials) -> Self {
        Self {
            id: c.id,
            email: c.email,
            full_name: c.full_name,
            role: c.role,
            must_change_password: c.must_change_password,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sex_codes() {
        assert_eq!(Sex::parse(Some(" female ")), Some(Sex::Female));
        assert_eq!(Sex::parse(Some("other")), None);
        assert_eq!(Sex::parse(None), None);
        assert_eq!(Sex::from_code(Sex::Male.code()), Sex::Male);
        assert_eq!(Sex::from_code(1), Sex::Female);
    }

    #[test]
    fn test_status_defaults_to_active() {
        assert_eq!(UserStatus::from_flag(None), UserStatus::Active);
        assert_eq!(UserStatus::from_flag(Some(false)).to_string(), "INACTIVE");
    }

    #[test]
    fn test_full_name_skips_blank_middle() {
        let info = PersonalInfo {
            first_name: "Ana".into(),
            middle_name: Some(" ".into()),
            last_name: "Reyes".into(),
            ..Default::default()
        };
        assert_eq!(info.full_name(), "Ana Reyes");
    }
}
