//! 卖家资料修改申请
//!
//! 卖家不能直接修改个人信息和地址，需要向所属管理员提交申请。申请内容以 JSON
//! 存在 `tbl_users.permission_request_data`，字段名沿用 PascalCase。

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use softwear_common::{UserId, non_blank};
use softwear_errors::{AppError, AppResult};

use super::{Address, PersonalInfo, Sex};

pub const PENDING_STATUS: &str = "pending";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum PermissionRequestType {
    #[display("personal_info")]
    PersonalInfo,
    #[display("address")]
    Address,
    #[display("combined")]
    Combined,
}

impl PermissionRequestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PersonalInfo => "personal_info",
            Self::Address => "address",
            Self::Combined => "combined",
        }
    }
}

impl FromStr for PermissionRequestType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "personal_info" => Ok(Self::PersonalInfo),
            "address" => Ok(Self::Address),
            "combined" => Ok(Self::Combined),
            other => Err(AppError::validation(format!("未知的申请类型: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PersonalInfoRequest {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub middle_name: Option<String>,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub contact: String,
    #[serde(default)]
    pub birthday: Option<NaiveDate>,
    #[serde(default)]
    pub age: Option<i32>,
    #[serde(default)]
    pub sex: Option<String>,
}

impl PersonalInfoRequest {
    pub fn to_info(&self) -> PersonalInfo {
        PersonalInfo {
            first_name: self.first_name.trim().to_string(),
            middle_name: non_blank(self.middle_name.as_deref()),
            last_name: self.last_name.trim().to_string(),
            contact: non_blank(Some(&self.contact)),
            birthday: self.birthday,
            age: self.age,
            sex: Sex::parse(self.sex.as_deref()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AddressRequest {
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub province: String,
    #[serde(default)]
    pub zip: String,
}

impl AddressRequest {
    pub fn to_address(&self) -> Address {
        Address {
            street: non_blank(Some(&self.street)),
            city: non_blank(Some(&self.city)),
            province: non_blank(Some(&self.province)),
            zip: non_blank(Some(&self.zip)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CombinedRequest {
    #[serde(default)]
    pub personal_info: Option<PersonalInfoRequest>,
    #[serde(default)]
    pub address: Option<AddressRequest>,
}

/// 一条修改申请
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionRequest {
    PersonalInfo(PersonalInfoRequest),
    Address(AddressRequest),
    Combined(CombinedRequest),
}

impl PermissionRequest {
    pub fn request_type(&self) -> PermissionRequestType {
        match self {
            Self::PersonalInfo(_) => PermissionRequestType::PersonalInfo,
            Self::Address(_) => PermissionRequestType::Address,
            Self::Combined(_) => PermissionRequestType::Combined,
        }
    }

    pub fn parse(kind: PermissionRequestType, json: &str) -> AppResult<Self> {
        let parsed = match kind {
            PermissionRequestType::PersonalInfo => serde_json::from_str(json).map(Self::PersonalInfo),
            PermissionRequestType::Address => serde_json::from_str(json).map(Self::Address),
            PermissionRequestType::Combined => serde_json::from_str(json).map(Self::Combined),
        };
        parsed.map_err(|e| AppError::validation(format!("申请内容格式不正确: {}", e)))
    }

    pub fn to_json(&self) -> AppResult<String> {
        let json = match self {
            Self::PersonalInfo(data) => serde_json::to_string(data),
            Self::Address(data) => serde_json::to_string(data),
            Self::Combined(data) => serde_json::to_string(data),
        };
        json.map_err(|e| AppError::internal(format!("序列化申请内容失败: {}", e)))
    }

    pub fn into_parts(self) -> (Option<PersonalInfoRequest>, Option<AddressRequest>) {
        match self {
            Self::PersonalInfo(info) => (Some(info), None),
            Self::Address(address) => (None, Some(address)),
            Self::Combined(combined) => (combined.personal_info, combined.address),
        }
    }

    /// 与待审批的申请合并为 combined，同一部分以新申请为准
    pub fn merge(pending: Option<Self>, incoming: Self) -> Self {
        let Some(pending) = pending else {
            return incoming;
        };
        let (old_info, old_address) = pending.into_parts();
        let (new_info, new_address) = incoming.into_parts();
        Self::Combined(CombinedRequest {
            personal_info: new_info.or(old_info),
            address: new_address.or(old_address),
        })
    }
}

/// 数据库中待审批的原始申请
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRequest {
    pub request_type: String,
    pub data: String,
}

impl StoredRequest {
    pub fn parse(&self) -> AppResult<PermissionRequest> {
        PermissionRequest::parse(self.request_type.parse()?, &self.data)
    }
}

/// 管理员看到的申请列表行
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PermissionRequestSummary {
    pub user_id: UserId,
    pub user_name: String,
    pub user_email: String,
    pub request_type: String,
    pub requested_at: Option<DateTime<Utc>>,
}

/// 申请详情：当前资料和申请内容
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PermissionRequestDetails {
    pub user_id: UserId,
    pub user_name: String,
    pub user_email: String,
    pub current: PersonalInfo,
    pub request_type: String,
    pub request_data: String,
    pub requested_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(first: &str) -> PersonalInfoRequest {
        PersonalInfoRequest {
            first_name: first.into(),
            last_name: "Cruz".into(),
            contact: "0917".into(),
            sex: Some("Female".into()),
            ..Default::default()
        }
    }

    fn address(city: &str) -> AddressRequest {
        AddressRequest {
            street: "1 Rizal St".into(),
            city: city.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_json_uses_pascal_case() {
        let json = PermissionRequest::PersonalInfo(info("Lea")).to_json().unwrap();
        assert!(json.contains("\"FirstName\":\"Lea\""));

        let parsed = PermissionRequest::parse(
            PermissionRequestType::Address,
            r#"{"Street":"Main","City":"Cebu","Province":"Cebu","Zip":"6000"}"#,
        )
        .unwrap();
        assert_eq!(parsed.request_type(), PermissionRequestType::Address);
    }

    #[test]
    fn test_merge_without_pending_keeps_type() {
        let merged = PermissionRequest::merge(None, PermissionRequest::Address(address("Cebu")));
        assert_eq!(merged.request_type(), PermissionRequestType::Address);
    }

    #[test]
    fn test_merge_combines_and_newer_part_wins() {
        let pending = PermissionRequest::Combined(CombinedRequest {
            personal_info: Some(info("Old")),
            address: Some(address("Cebu")),
        });
        let merged = PermissionRequest::merge(Some(pending), PermissionRequest::PersonalInfo(info("New")));

        let (personal, addr) = merged.clone().into_parts();
        assert_eq!(merged.request_type(), PermissionRequestType::Combined);
        assert_eq!(personal.unwrap().first_name, "New");
        assert_eq!(addr.unwrap().city, "Cebu");
    }

    #[test]
    fn test_request_converts_to_domain_values() {
        let personal = info(" Lea ").to_info();
        assert_eq!(personal.first_name, "Lea");
        assert_eq!(personal.sex, Some(Sex::Female));
        assert_eq!(address("").to_address().city, None);
    }

    #[test]
    fn test_invalid_json_is_validation_error() {
        let err = PermissionRequest::parse(PermissionRequestType::Combined, "not json").unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
