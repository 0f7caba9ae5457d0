//! 供应商命令

use softwear_common::{UserId, non_blank};
use softwear_errors::{AppError, AppResult};

use crate::domain::{SupplierAddress, SupplierDraft, SupplierStatus};

const MAX_COMPANY_NAME_LEN: usize = 200;

/// 创建或修改供应商时的输入
#[derive(Debug, Clone)]
pub struct SupplierInput {
    pub company_name: String,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub contact_number: Option<String>,
    /// `Active` 或 `Inactive`
    pub status: String,
    pub address: Option<SupplierAddress>,
}

impl SupplierInput {
    pub fn validate(&self) -> AppResult<()> {
        self.to_draft().map(|_| ())
    }

    pub fn to_draft(&self) -> AppResult<SupplierDraft> {
        let company_name = self.company_name.trim();
        if company_name.is_empty() {
            return Err(AppError::validation("公司名称不能为空"));
        }
        if company_name.chars().count() > MAX_COMPANY_NAME_LEN {
            return Err(AppError::validation(format!(
                "公司名称长度不能超过{}个字符",
                MAX_COMPANY_NAME_LEN
            )));
        }

        let email = non_blank(self.email.as_deref());
        if let Some(email) = &email
            && !looks_like_email(email)
        {
            return Err(AppError::validation(format!("邮箱格式不正确: {}", email)));
        }

        let status: SupplierStatus = self.status.parse()?;
        if status == SupplierStatus::Archived {
            return Err(AppError::validation("不能直接设置为归档状态"));
        }

        let address = self
            .address
            .as_ref()
            .filter(|a| !a.is_empty())
            .map(|a| SupplierAddress {
                street: non_blank(a.street.as_deref()),
                city: non_blank(a.city.as_deref()),
                province: non_blank(a.province.as_deref()),
                zip: non_blank(a.zip.as_deref()),
            });

        Ok(SupplierDraft {
            company_name: company_name.to_string(),
            contact_person: non_blank(self.contact_person.as_deref()),
            email,
            contact_number: non_blank(self.contact_number.as_deref()),
            status,
            address,
        })
    }
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    }
}

/// 创建供应商命令
#[derive(Debug, Clone)]
pub struct CreateSupplierCommand {
    pub owner: UserId,
    pub input: SupplierInput,
}

/// 修改供应商命令
#[derive(Debug, Clone)]
pub struct UpdateSupplierCommand {
    pub owner: UserId,
    pub id: i32,
    pub input: SupplierInput,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> SupplierInput {
        SupplierInput {
            company_name: "  Luzon Textiles ".to_string(),
            contact_person: Some("Maria Santos".to_string()),
            email: Some("orders@luzontex.ph".to_string()),
            contact_number: Some(" ".to_string()),
            status: "active".to_string(),
            address: Some(SupplierAddress::default()),
        }
    }

    #[test]
    fn test_draft_normalizes_fields() {
        let draft = input().to_draft().unwrap();
        assert_eq!(draft.company_name, "Luzon Textiles");
        assert_eq!(draft.contact_number, None);
        assert_eq!(draft.status, SupplierStatus::Active);
        assert_eq!(draft.address, None, "blank address is dropped");
    }

    #[test]
    fn test_invalid_email_rejected() {
        let mut bad = input();
        bad.email = Some("orders.luzontex.ph".to_string());
        assert!(bad.validate().is_err());
        bad.email = Some("orders@ph".to_string());
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_archived_status_not_settable() {
        let mut archived = input();
        archived.status = "Archived".to_string();
        assert!(archived.validate().is_err());
    }

    #[test]
    fn test_company_name_required() {
        let mut blank = input();
        blank.company_name = "   ".to_string();
        assert!(blank.validate().is_err());
    }
}
