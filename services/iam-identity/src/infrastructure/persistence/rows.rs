//! 数据库行映射

use chrono::{DateTime, NaiveDate, Utc};
use softwear_common::{UserId, display_name, non_blank};
use softwear_errors::AppResult;
use sqlx::FromRow;

use crate::domain::{
    Address, Credentials, HistoryEntry, PermissionRequestDetails, PermissionRequestSummary,
    PersonalInfo, Sex, UserAddress, UserDetails, UserStatus, UserSummary,
};

#[derive(Debug, FromRow)]
pub(super) struct CredentialsRow {
    pub id: i32,
    pub email: String,
    pub pwd_hash: String,
    pub name: Option<String>,
    pub fname: Option<String>,
    pub lname: Option<String>,
    pub role_name: String,
    pub must_change_pw: bool,
}

impl CredentialsRow {
    pub fn into_credentials(self) -> AppResult<Credentials> {
        Ok(Credentials {
            id: UserId(self.id),
            full_name: display_name(
                self.name.as_deref(),
                self.fname.as_deref(),
                self.lname.as_deref(),
                &self.email,
            ),
            email: self.email,
            password_hash: self.pwd_hash,
            role: self.role_name.parse()?,
            must_change_password: self.must_change_pw,
        })
    }
}

#[derive(Debug, FromRow)]
pub(super) struct PersonalInfoRow {
    pub fname: Option<String>,
    pub mname: Option<String>,
    pub lname: Option<String>,
    pub contact_no: Option<String>,
    pub bday: Option<NaiveDate>,
    pub age: Option<i32>,
    pub sex: Option<i16>,
}

impl From<PersonalInfoRow> for PersonalInfo {
    fn from(row: PersonalInfoRow) -> Self {
        Self {
            first_name: row.fname.unwrap_or_default(),
            middle_name: non_blank(row.mname.as_deref()),
            last_name: row.lname.unwrap_or_default(),
            contact: row.contact_no,
            birthday: row.bday,
            age: row.age,
            sex: row.sex.map(Sex::from_code),
        }
    }
}

#[derive(Debug, FromRow)]
pub(super) struct UserSummaryRow {
    pub id: i32,
    pub name: Option<String>,
    pub fname: Option<String>,
    pub lname: Option<String>,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub archived_at: Option<DateTime<Utc>>,
}

impl From<UserSummaryRow> for UserSummary {
    fn from(row: UserSummaryRow) -> Self {
        Self {
            id: UserId(row.id),
            name: display_name(
                row.name.as_deref(),
                row.fname.as_deref(),
                row.lname.as_deref(),
                &row.email,
            ),
            email: row.email,
            created_at: row.created_at,
            archived_at: row.archived_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub(super) struct UserDetailsRow {
    pub id: i32,
    pub name: Option<String>,
    pub fname: Option<String>,
    pub lname: Option<String>,
    pub email: String,
    pub bday: Option<NaiveDate>,
    pub age: Option<i32>,
    pub sex: Option<i16>,
    pub contact_no: Option<String>,
    pub is_active: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub archived_at: Option<DateTime<Utc>>,
}

impl UserDetailsRow {
    pub fn into_details(self, address: Option<Address>) -> UserDetails {
        UserDetails {
            id: UserId(self.id),
            full_name: display_name(
                self.name.as_deref(),
                self.fname.as_deref(),
                self.lname.as_deref(),
                &self.email,
            ),
            email: self.email,
            birthday: self.bday,
            age: self.age,
            sex: self.sex.map(Sex::from_code),
            contact: self.contact_no,
            status: UserStatus::from_flag(self.is_active),
            created_at: self.created_at,
            archived_at: self.archived_at,
            address,
        }
    }
}

#[derive(Debug, FromRow)]
pub(super) struct AddressRow {
    pub id: i32,
    pub user_id: i32,
    pub street: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub zip: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<AddressRow> for UserAddress {
    fn from(row: AddressRow) -> Self {
        Self {
            id: row.id,
            user_id: UserId(row.user_id),
            address: Address {
                street: row.street,
                city: row.city,
                province: row.province,
                zip: row.zip,
            },
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub(super) struct RequestSummaryRow {
    pub id: i32,
    pub name: Option<String>,
    pub fname: Option<String>,
    pub lname: Option<String>,
    pub email: String,
    pub permission_request_type: Option<String>,
    pub permission_request_date: Option<DateTime<Utc>>,
}

impl From<RequestSummaryRow> for PermissionRequestSummary {
    fn from(row: RequestSummaryRow) -> Self {
        Self {
            user_id: UserId(row.id),
            user_name: display_name(
                row.name.as_deref(),
                row.fname.as_deref(),
                row.lname.as_deref(),
                &row.email,
            ),
            user_email: row.email,
            request_type: row.permission_request_type.unwrap_or_default(),
            requested_at: row.permission_request_date,
        }
    }
}

#[derive(Debug, FromRow)]
pub(super) struct RequestDetailsRow {
    pub id: i32,
    pub name: Option<String>,
    pub email: String,
    #[sqlx(flatten)]
    pub info: PersonalInfoRow,
    pub permission_request_type: Option<String>,
    pub permission_request_data: Option<String>,
    pub permission_request_date: Option<DateTime<Utc>>,
}

impl From<RequestDetailsRow> for PermissionRequestDetails {
    fn from(row: RequestDetailsRow) -> Self {
        let user_name = display_name(
            row.name.as_deref(),
            row.info.fname.as_deref(),
            row.info.lname.as_deref(),
            &row.email,
        );
        Self {
            user_id: UserId(row.id),
            user_name,
            user_email: row.email,
            current: row.info.into(),
            request_type: row.permission_request_type.unwrap_or_default(),
            request_data: row.permission_request_data.unwrap_or_default(),
            requested_at: row.permission_request_date,
        }
    }
}

#[derive(Debug, FromRow)]
pub(super) struct HistoryRow {
    pub id: i32,
    pub user_id: i32,
    pub status: String,
    pub module: String,
    pub description: Option<String>,
    pub ts: DateTime<Utc>,
    pub name: Option<String>,
    pub fname: Option<String>,
    pub lname: Option<String>,
    pub email: String,
    pub role_name: String,
}

impl From<HistoryRow> for HistoryEntry {
    fn from(row: HistoryRow) -> Self {
        Self {
            id: row.id,
            user_id: UserId(row.user_id),
            user_name: display_name(
                row.name.as_deref(),
                row.fname.as_deref(),
                row.lname.as_deref(),
                &row.email,
            ),
            user_role: row.role_name,
            status: row.status,
            module: row.module,
            description: row.description.unwrap_or_default(),
            ts: row.ts,
        }
    }
}
