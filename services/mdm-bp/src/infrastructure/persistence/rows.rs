//! 数据库行映射

use chrono::{DateTime, Utc};
use softwear_errors::AppResult;
use sqlx::FromRow;

use crate::domain::{Supplier, SupplierAddress, SupplierOption};

#[derive(Debug, FromRow)]
pub(super) struct SupplierRow {
    pub id: i32,
    pub company_name: String,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub contact_number: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub archived_at: Option<DateTime<Utc>>,
}

impl SupplierRow {
    pub fn into_supplier(self, address: Option<SupplierAddress>) -> AppResult<Supplier> {
        Ok(Supplier {
            id: self.id,
            company_name: self.company_name,
            contact_person: self.contact_person,
            email: self.email,
            contact_number: self.contact_number,
            status: self.status.parse()?,
            created_at: self.created_at,
            archived_at: self.archived_at,
            address,
        })
    }
}

#[derive(Debug, FromRow)]
pub(super) struct AddressRow {
    pub street: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub zip: Option<String>,
}

impl From<AddressRow> for SupplierAddress {
    fn from(row: AddressRow) -> Self {
        Self {
            street: row.street,
            city: row.city,
            province: row.province,
            zip: row.zip,
        }
    }
}

#[derive(Debug, FromRow)]
pub(super) struct SupplierOptionRow {
    pub id: i32,
    pub company_name: String,
}

impl From<SupplierOptionRow> for SupplierOption {
    fn from(row: SupplierOptionRow) -> Self {
        Self {
            id: row.id,
            company_name: row.company_name,
        }
    }
}
