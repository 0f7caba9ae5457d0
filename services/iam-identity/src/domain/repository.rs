//! 仓储与外部依赖接口

use async_trait::async_trait;
use softwear_common::{Pagination, UserId};
use softwear_errors::AppResult;
use sys_billing::domain::SellerSubscription;

use super::{
    Address, Credentials, Email, HistoryEntry, HistoryFilter, NewHistoryEntry, NewUser,
    PermissionRequestDetails, PermissionRequestSummary, PermissionRequestType, PersonalInfo, Role,
    StoredRequest, UserAddress, UserDetails, UserFilter, UserProfile, UserSummary,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// 按邮箱查找启用且未归档的账号，邮箱不区分大小写
    async fn find_credentials(&self, email: &str) -> AppResult<Option<Credentials>>;

    async fn password_hash(&self, user: UserId) -> AppResult<Option<String>>;

    /// 写入新密码并清除强制修改标记
    async fn set_password(&self, user: UserId, password_hash: &str) -> AppResult<bool>;

    async fn must_change_password(&self, user: UserId) -> AppResult<bool>;

    async fn personal_info(&self, user: UserId) -> AppResult<Option<PersonalInfo>>;

    /// 同时用全名覆盖 name
    async fn update_personal_info(&self, user: UserId, info: &PersonalInfo) -> AppResult<bool>;

    /// 其他未归档用户是否已使用该邮箱
    async fn email_taken(&self, email: &Email, exclude: Option<UserId>) -> AppResult<bool>;

    async fn update_email(&self, user: UserId, email: &Email) -> AppResult<bool>;

    async fn list_users(&self, filter: &UserFilter, pagination: Pagination)
    -> AppResult<Vec<UserSummary>>;

    async fn count_users(&self, filter: &UserFilter) -> AppResult<u64>;

    /// 附带最近一条地址
    async fn user_details(
        &self,
        role: Role,
        user: UserId,
        archived: bool,
    ) -> AppResult<Option<UserDetails>>;

    /// 角色行缺失时报错，邮箱重复返回 Conflict
    async fn insert_user(&self, user: &NewUser) -> AppResult<UserId>;

    async fn update_user(&self, role: Role, user: UserId, profile: &UserProfile) -> AppResult<bool>;

    async fn set_archived(&self, role: Role, user: UserId, archived: bool) -> AppResult<bool>;

    async fn pending_request(&self, user: UserId) -> AppResult<Option<StoredRequest>>;

    async fn save_request(
        &self,
        user: UserId,
        request_type: PermissionRequestType,
        data: &str,
    ) -> AppResult<bool>;

    /// 管理员名下卖家的待审批申请，按申请时间倒序
    async fn list_requests(
        &self,
        admin: UserId,
        search: Option<String>,
        pagination: Pagination,
    ) -> AppResult<Vec<PermissionRequestSummary>>;

    async fn count_requests(&self, admin: UserId, search: Option<String>) -> AppResult<u64>;

    async fn request_details(&self, user: UserId) -> AppResult<Option<PermissionRequestDetails>>;

    /// 在一个事务内应用申请内容并清除申请
    async fn apply_request(
        &self,
        user: UserId,
        info: Option<PersonalInfo>,
        address: Option<Address>,
    ) -> AppResult<bool>;

    async fn clear_request(&self, user: UserId) -> AppResult<bool>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AddressRepository: Send + Sync {
    /// 最近创建的未归档地址
    async fn latest(&self, user: UserId) -> AppResult<Option<UserAddress>>;

    /// 更新最近一条地址，没有则新增，返回地址 id
    async fn save(&self, user: UserId, address: &Address) -> AppResult<i32>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    async fn insert(&self, entry: &NewHistoryEntry) -> AppResult<i32>;

    async fn list(&self, filter: &HistoryFilter, pagination: Pagination)
    -> AppResult<Vec<HistoryEntry>>;

    async fn count(&self, filter: &HistoryFilter) -> AppResult<u64>;

    async fn distinct_statuses(&self, user: Option<UserId>) -> AppResult<Vec<String>>;

    async fn distinct_modules(&self, user: Option<UserId>) -> AppResult<Vec<String>>;
}

/// 卖家订阅查询
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubscriptionGateway: Send + Sync {
    async fn active_subscription(&self, seller: UserId) -> AppResult<Option<SellerSubscription>>;
}
