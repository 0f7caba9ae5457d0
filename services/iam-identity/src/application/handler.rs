//! 用户、权限申请与地址业务处理

use std::sync::Arc;

use softwear_common::{PagedResult, Pagination, UserId, non_blank};
use softwear_errors::{AppError, AppResult};
use tracing::{debug, info, warn};

use crate::domain::{
    Address, AddressRepository, Email, NewUser, PermissionRequest, PermissionRequestDetails,
    PermissionRequestSummary, PersonalInfo, Role, UserAddress, UserDetails, UserRepository,
    UserSummary, hash_password, verify_password,
};

use super::commands::{CreateUserCommand, ListUsersQuery, PersonalInfoInput, UpdateUserCommand};

pub struct ServiceHandler {
    users: Arc<dyn UserRepository>,
    addresses: Arc<dyn AddressRepository>,
}

impl ServiceHandler {
    pub fn new(users: Arc<dyn UserRepository>, addresses: Arc<dyn AddressRepository>) -> Self {
        Self { users, addresses }
    }

    // ====== 个人资料 ======

    pub async fn personal_info(&self, user: UserId) -> AppResult<Option<PersonalInfo>> {
        self.users.personal_info(user).await
    }

    pub async fn update_personal_info(&self, user: UserId, input: &PersonalInfoInput) -> AppResult<()> {
        let info = input.to_info()?;
        if !self.users.update_personal_info(user, &info).await? {
            return Err(AppError::not_found(format!("用户 {} 不存在", user)));
        }
        info!(user_id = user.0, "Personal info updated");
        Ok(())
    }

    /// 邮箱已被其他用户使用时返回 false
    pub async fn update_email(&self, user: UserId, email: &str) -> AppResult<bool> {
        let email = Email::new(email)?;
        if self.users.email_taken(&email, Some(user)).await? {
            debug!(user_id = user.0, "Email already in use");
            return Ok(false);
        }
        self.users.update_email(user, &email).await
    }

    /// 当前密码错误或用户不存在时返回 false
    pub async fn update_password(&self, user: UserId, current: &str, new_password: &str) -> AppResult<bool> {
        if new_password.is_empty() {
            return Err(AppError::validation("新密码不能为空"));
        }
        let Some(stored) = self.users.password_hash(user).await? else {
            return Ok(false);
        };
        if !verify_password(current, &stored) {
            warn!(user_id = user.0, "Password change rejected: wrong current password");
            return Ok(false);
        }

        let updated = self.users.set_password(user, &hash_password(new_password)).await?;
        if updated {
            info!(user_id = user.0, "Password changed");
        }
        Ok(updated)
    }

    pub async fn must_change_password(&self, user: UserId) -> AppResult<bool> {
        self.users.must_change_password(user).await
    }

    // ====== 按角色管理账号 ======

    pub async fn list_users(&self, query: &ListUsersQuery) -> AppResult<PagedResult<UserSummary>> {
        let filter = query.filter();
        let items = self.users.list_users(&filter, query.pagination).await?;
        let total = self.users.count_users(&filter).await?;
        Ok(PagedResult::new(items, total, &query.pagination))
    }

    pub async fn count_users(&self, query: &ListUsersQuery) -> AppResult<u64> {
        self.users.count_users(&query.filter()).await
    }

    pub async fn user_details(&self, role: Role, user: UserId) -> AppResult<Option<UserDetails>> {
        self.users.user_details(role, user, false).await
    }

    pub async fn archived_user_details(&self, role: Role, user: UserId) -> AppResult<Option<UserDetails>> {
        self.users.user_details(role, user, true).await
    }

    /// 新账号启用并要求首次登录修改密码
    pub async fn create_user(&self, cmd: CreateUserCommand) -> AppResult<UserId> {
        let profile = cmd.validate()?;
        if self.users.email_taken(&profile.email, None).await? {
            return Err(AppError::conflict(format!("邮箱 {} 已被使用", profile.email)));
        }

        let new_user = NewUser {
            role: cmd.role,
            owner: cmd.owner,
            password_hash: hash_password(&cmd.password),
            profile,
        };
        let id = self.users.insert_user(&new_user).await?;
        info!(
            user_id = id.0,
            role = %cmd.role,
            owner = ?cmd.owner.map(|o| o.0),
            "User created"
        );
        Ok(id)
    }

    pub async fn update_user(&self, cmd: UpdateUserCommand) -> AppResult<bool> {
        let profile = cmd.input.to_profile()?;
        if self.users.email_taken(&profile.email, Some(cmd.id)).await? {
            return Err(AppError::conflict(format!("邮箱 {} 已被使用", profile.email)));
        }
        let updated = self.users.update_user(cmd.role, cmd.id, &profile).await?;
        if updated {
            info!(user_id = cmd.id.0, role = %cmd.role, "User updated");
        }
        Ok(updated)
    }

    pub async fn archive_user(&self, role: Role, user: UserId) -> AppResult<bool> {
        let archived = self.users.set_archived(role, user, true).await?;
        if archived {
            info!(user_id = user.0, role = %role, "User archived");
        }
        Ok(archived)
    }

    pub async fn restore_user(&self, role: Role, user: UserId) -> AppResult<bool> {
        let restored = self.users.set_archived(role, user, false).await?;
        if restored {
            info!(user_id = user.0, role = %role, "User restored");
        }
        Ok(restored)
    }

    // ====== 资料修改申请 ======

    /// 已有待审批申请时合并为 combined
    pub async fn request_change(&self, user: UserId, request: PermissionRequest) -> AppResult<bool> {
        let pending = match self.users.pending_request(user).await? {
            Some(stored) => match stored.parse() {
                Ok(parsed) => Some(parsed),
                Err(e) => {
                    warn!(user_id = user.0, error = %e, "Ignoring unreadable pending request");
                    None
                }
            },
            None => None,
        };

        let merged = PermissionRequest::merge(pending, request);
        let saved = self
            .users
            .save_request(user, merged.request_type(), &merged.to_json()?)
            .await?;
        if saved {
            info!(user_id = user.0, request_type = %merged.request_type(), "Permission request submitted");
        }
        Ok(saved)
    }

    pub async fn list_permission_requests(
        &self,
        admin: UserId,
        search: Option<&str>,
        pagination: Pagination,
    ) -> AppResult<PagedResult<PermissionRequestSummary>> {
        let search = non_blank(search);
        let items = self.users.list_requests(admin, search.clone(), pagination).await?;
        let total = self.users.count_requests(admin, search).await?;
        Ok(PagedResult::new(items, total, &pagination))
    }

    pub async fn count_permission_requests(&self, admin: UserId, search: Option<&str>) -> AppResult<u64> {
        self.users.count_requests(admin, non_blank(search)).await
    }

    pub async fn permission_request_details(
        &self,
        user: UserId,
    ) -> AppResult<Option<PermissionRequestDetails>> {
        self.users.request_details(user).await
    }

    /// 没有待审批申请时返回 false
    pub async fn approve_request(&self, user: UserId) -> AppResult<bool> {
        let Some(stored) = self.users.pending_request(user).await? else {
            return Ok(false);
        };
        let (info, address) = stored.parse()?.into_parts();
        let info = info.map(|i| i.to_info());
        let address = address.map(|a| a.to_address());

        let approved = self.users.apply_request(user, info, address).await?;
        if approved {
            info!(user_id = user.0, request_type = %stored.request_type, "Permission request approved");
        }
        Ok(approved)
    }

    pub async fn reject_request(&self, user: UserId) -> AppResult<bool> {
        let rejected = self.users.clear_request(user).await?;
        if rejected {
            info!(user_id = user.0, "Permission request rejected");
        }
        Ok(rejected)
    }

    // ====== 地址 ======

    pub async fn address(&self, user: UserId) -> AppResult<Option<UserAddress>> {
        self.addresses.latest(user).await
    }

    pub async fn save_address(&self, user: UserId, address: &Address) -> AppResult<i32> {
        if address.is_empty() {
            return Err(AppError::validation("地址不能为空"));
        }
        let normalized = Address {
            street: non_blank(address.street.as_deref()),
            city: non_blank(address.city.as_deref()),
            province: non_blank(address.province.as_deref()),
            zip: non_blank(address.zip.as_deref()),
        };
        self.addresses.save(user, &normalized).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{PersonalInfoInput, UserInput};
    use crate::domain::{
        AddressRequest, MockAddressRepository, MockUserRepository, PermissionRequestType,
        PersonalInfoRequest, StoredRequest,
    };
    use mockall::predicate::*;

    fn handler(users: MockUserRepository) -> ServiceHandler {
        ServiceHandler::new(Arc::new(users), Arc::new(MockAddressRepository::new()))
    }

    fn user_input(email: &str) -> UserInput {
        UserInput {
            email: email.into(),
            info: PersonalInfoInput {
                first_name: "Jo".into(),
                last_name: "Lim".into(),
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn test_create_user_rejects_duplicate_email() {
        let mut users = MockUserRepository::new();
        users.expect_email_taken().returning(|_, _| Ok(true));
        users.expect_insert_user().never();

        let err = handler(users)
            .create_user(CreateUserCommand {
                role: Role::Cashier,
                owner: Some(UserId(2)),
                password: "temp123".into(),
                input: user_input("jo@shop.ph"),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_create_user_hashes_password() {
        let mut users = MockUserRepository::new();
        users
            .expect_email_taken()
            .withf(|email, exclude| email.as_str() == "jo@shop.ph" && exclude.is_none())
            .returning(|_, _| Ok(false));
        users
            .expect_insert_user()
            .withf(|u| {
                u.role == Role::Seller
                    && u.owner == Some(UserId(1))
                    && u.password_hash == hash_password("temp123")
            })
            .returning(|_| Ok(UserId(40)));

        let id = handler(users)
            .create_user(CreateUserCommand {
                role: Role::Seller,
                owner: Some(UserId(1)),
                password: "temp123".into(),
                input: user_input("Jo@Shop.ph"),
            })
            .await
            .unwrap();
        assert_eq!(id, UserId(40));
    }

    #[tokio::test]
    async fn test_update_password_requires_current() {
        let mut users = MockUserRepository::new();
        users
            .expect_password_hash()
            .with(eq(UserId(5)))
            .returning(|_| Ok(Some(hash_password("old"))));
        users
            .expect_set_password()
            .withf(|user, hash| *user == UserId(5) && hash == hash_password("new").as_str())
            .times(1)
            .returning(|_, _| Ok(true));
        let handler = handler(users);

        assert!(!handler.update_password(UserId(5), "wrong", "new").await.unwrap());
        assert!(handler.update_password(UserId(5), "old", "new").await.unwrap());
    }

    #[tokio::test]
    async fn test_update_email_returns_false_when_taken() {
        let mut users = MockUserRepository::new();
        users.expect_email_taken().returning(|_, _| Ok(true));
        users.expect_update_email().never();

        assert!(!handler(users).update_email(UserId(3), "x@shop.ph").await.unwrap());
    }

    #[tokio::test]
    async fn test_request_change_merges_with_pending() {
        let mut users = MockUserRepository::new();
        users.expect_pending_request().returning(|_| {
            Ok(Some(StoredRequest {
                request_type: "address".into(),
                data: r#"{"Street":"1 Rizal","City":"Iloilo","Province":"","Zip":""}"#.into(),
            }))
        });
        users
            .expect_save_request()
            .withf(|_, kind, data| {
                *kind == PermissionRequestType::Combined
                    && data.contains("\"Iloilo\"")
                    && data.contains("\"FirstName\":\"Jo\"")
            })
            .returning(|_, _, _| Ok(true));

        let request = PermissionRequest::PersonalInfo(PersonalInfoRequest {
            first_name: "Jo".into(),
            last_name: "Lim".into(),
            ..Default::default()
        });
        assert!(handler(users).request_change(UserId(9), request).await.unwrap());
    }

    #[tokio::test]
    async fn test_approve_applies_both_parts() {
        let mut users = MockUserRepository::new();
        let combined = PermissionRequest::Combined(crate::domain::CombinedRequest {
            personal_info: Some(PersonalInfoRequest {
                first_name: "Jo".into(),
                last_name: "Lim".into(),
                ..Default::default()
            }),
            address: Some(AddressRequest {
                city: "Cebu".into(),
                ..Default::default()
            }),
        });
        let data = combined.to_json().unwrap();
        users.expect_pending_request().returning(move |_| {
            Ok(Some(StoredRequest {
                request_type: "combined".into(),
                data: data.clone(),
            }))
        });
        users
            .expect_apply_request()
            .withf(|_, info, address| {
                info.as_ref().is_some_and(|i| i.full_name() == "Jo Lim")
                    && address.as_ref().is_some_and(|a| a.city.as_deref() == Some("Cebu"))
            })
            .returning(|_, _, _| Ok(true));

        assert!(handler(users).approve_request(UserId(9)).await.unwrap());
    }

    #[tokio::test]
    async fn test_approve_without_pending_is_false() {
        let mut users = MockUserRepository::new();
        users.expect_pending_request().returning(|_| Ok(None));
        users.expect_apply_request().never();
        assert!(!handler(users).approve_request(UserId(9)).await.unwrap());
    }

    #[tokio::test]
    async fn test_save_address_rejects_blank() {
        let handler = handler(MockUserRepository::new());
        let err = handler.save_address(UserId(1), &Address::default()).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
