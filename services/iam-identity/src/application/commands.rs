//! 用户命令

use chrono::NaiveDate;
use softwear_common::{Pagination, UserId, non_blank};
use softwear_errors::{AppError, AppResult};

use crate::domain::{Email, PersonalInfo, Role, Sex, UserFilter, UserProfile};

const MAX_AGE: i32 = 150;

/// 个人信息输入
#[derive(Debug, Clone, Default)]
pub struct PersonalInfoInput {
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub contact: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub age: Option<i32>,
    /// `Male` / `Female`，其他值按未填写处理
    pub sex: Option<String>,
}

impl PersonalInfoInput {
    pub fn to_info(&self) -> AppResult<PersonalInfo> {
        let first_name = self.first_name.trim();
        let last_name = self.last_name.trim();
        if first_name.is_empty() || last_name.is_empty() {
            return Err(AppError::validation("名和姓不能为空"));
        }
        if let Some(age) = self.age
            && !(0..=MAX_AGE).contains(&age)
        {
            return Err(AppError::validation(format!("年龄无效: {}", age)));
        }

        Ok(PersonalInfo {
            first_name: first_name.to_string(),
            middle_name: non_blank(self.middle_name.as_deref()),
            last_name: last_name.to_string(),
            contact: non_blank(self.contact.as_deref()),
            birthday: self.birthday,
            age: self.age,
            sex: Sex::parse(self.sex.as_deref()),
        })
    }
}

/// 新建或修改账号的输入
#[derive(Debug, Clone, Default)]
pub struct UserInput {
    pub email: String,
    pub info: PersonalInfoInput,
}

impl UserInput {
    pub fn to_profile(&self) -> AppResult<UserProfile> {
        Ok(UserProfile {
            email: Email::new(&self.email)?,
            info: self.info.to_info()?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct CreateUserCommand {
    pub role: Role,
    /// 管理员为空；卖家填管理员；员工填卖家
    pub owner: Option<UserId>,
    pub password: String,
    pub input: UserInput,
}

impl CreateUserCommand {
    pub fn validate(&self) -> AppResult<UserProfile> {
        match (self.role.owner_role(), self.owner) {
            (None, Some(_)) => {
                return Err(AppError::validation("管理员账号不能指定归属"));
            }
            (Some(owner_role), None) => {
                return Err(AppError::validation(format!(
                    "{} 账号必须归属于 {}",
                    self.role, owner_role
                )));
            }
            _ => {}
        }
        if self.password.is_empty() {
            return Err(AppError::validation("密码不能为空"));
        }
        self.input.to_profile()
    }
}

#[derive(Debug, Clone)]
pub struct UpdateUserCommand {
    pub role: Role,
    pub id: UserId,
    pub input: UserInput,
}

/// 按角色列出用户
#[derive(Debug, Clone)]
pub struct ListUsersQuery {
    pub role: Role,
    pub owner: Option<UserId>,
    pub search: Option<String>,
    pub archived: bool,
    pub pagination: Pagination,
}

impl ListUsersQuery {
    pub fn active(role: Role, owner: Option<UserId>) -> Self {
        Self {
            role,
            owner,
            search: None,
            archived: false,
            pagination: Pagination::default(),
        }
    }

    pub fn archived(role: Role, owner: Option<UserId>) -> Self {
        Self {
            archived: true,
            ..Self::active(role, owner)
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn filter(&self) -> UserFilter {
        UserFilter {
            role: self.role,
            owner: self.owner,
            search: non_blank(self.search.as_deref()),
            archived: self.archived,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> UserInput {
        UserInput {
            email: "Clerk@Shop.ph".into(),
            info: PersonalInfoInput {
                first_name: " Mara ".into(),
                middle_name: Some("".into()),
                last_name: "Santos".into(),
                sex: Some("male".into()),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_profile_is_normalized() {
        let profile = input().to_profile().unwrap();
        assert_eq!(profile.email.as_str(), "clerk@shop.ph");
        assert_eq!(profile.info.first_name, "Mara");
        assert_eq!(profile.info.middle_name, None);
        assert_eq!(profile.info.sex, Some(Sex::Male));
    }

    #[test]
    fn test_names_are_required() {
        let mut bad = input();
        bad.info.last_name = "  ".into();
        assert!(matches!(bad.to_profile(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_owner_must_match_role() {
        let staff_without_owner = CreateUserCommand {
            role: Role::Cashier,
            owner: None,
            password: "pw".into(),
            input: input(),
        };
        assert!(staff_without_owner.validate().is_err());

        let admin_with_owner = CreateUserCommand {
            role: Role::Admin,
            owner: Some(UserId(1)),
            password: "pw".into(),
            input: input(),
        };
        assert!(admin_with_owner.validate().is_err());

        let seller = CreateUserCommand {
            role: Role::Seller,
            owner: Some(UserId(1)),
            password: "pw".into(),
            input: input(),
        };
        assert!(seller.validate().is_ok());
    }

    #[test]
    fn test_age_bounds() {
        let mut bad = input();
        bad.info.age = Some(-1);
        assert!(bad.to_profile().is_err());
    }
}
