//! 用户仓储的 PostgreSQL 实现

use async_trait::async_trait;
use softwear_adapter_postgres::{
    TransactionManager, db_error, map_unique_violation, push_page, push_search, to_count,
};
use softwear_common::{Pagination, UserId};
use softwear_errors::{AppError, AppResult};
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use tracing::debug;

use crate::domain::{
    Address, Credentials, Email, NewUser, PENDING_STATUS, PermissionRequestDetails,
    PermissionRequestSummary, PermissionRequestType, PersonalInfo, Role, StoredRequest,
    UserDetails, UserFilter, UserProfile, UserRepository, UserSummary,
};

use super::address_repository::{latest_user_address, upsert_user_address};
use super::rows::{
    CredentialsRow, PersonalInfoRow, RequestDetailsRow, RequestSummaryRow, UserDetailsRow,
    UserSummaryRow,
};

const SEARCH_COLUMNS: [&str; 4] = ["u.email", "u.fname", "u.lname", "u.name"];
const EMAIL_CONFLICT: &str = "邮箱已被其他用户使用";

pub struct PostgresUserRepository {
    pool: PgPool,
    tx_manager: TransactionManager,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            tx_manager: TransactionManager::new(pool.clone()),
            pool,
        }
    }

    fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &UserFilter) {
        qb.push(" FROM tbl_users u JOIN tbl_roles r ON r.id = u.role_id WHERE r.name = ")
            .push_bind(filter.role.as_str());
        qb.push(if filter.archived {
            " AND u.archived_at IS NOT NULL"
        } else {
            " AND u.archived_at IS NULL"
        });
        if let Some(owner) = filter.owner {
            qb.push(" AND u.user_id = ").push_bind(owner.0);
        }
        push_search(qb, &SEARCH_COLUMNS, filter.search.as_deref());
    }

    fn push_request_filter(qb: &mut QueryBuilder<'_, Postgres>, admin: UserId, search: Option<&str>) {
        qb.push(" FROM tbl_users u JOIN tbl_roles r ON r.id = u.role_id WHERE r.name = ")
            .push_bind(Role::Seller.as_str());
        qb.push(" AND u.user_id = ").push_bind(admin.0);
        qb.push(" AND u.permission_request_status = ").push_bind(PENDING_STATUS);
        qb.push(" AND u.archived_at IS NULL");
        push_search(qb, &SEARCH_COLUMNS, search);
    }

    async fn write_personal_info(
        conn: &mut PgConnection,
        user: UserId,
        info: &PersonalInfo,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE tbl_users
            SET name = $1, fname = $2, mname = $3, lname = $4, contact_no = $5,
                bday = $6, age = $7, sex = $8, updated_at = NOW()
            WHERE id = $9 AND archived_at IS NULL
            "#,
        )
        .bind(info.full_name())
        .bind(&info.first_name)
        .bind(&info.middle_name)
        .bind(&info.last_name)
        .bind(&info.contact)
        .bind(info.birthday)
        .bind(info.age)
        .bind(info.sex.map(|s| s.code()))
        .bind(user.0)
        .execute(&mut *conn)
        .await
        .map_err(db_error("更新个人信息"))?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_credentials(&self, email: &str) -> AppResult<Option<Credentials>> {
        let row = sqlx::query_as::<_, CredentialsRow>(
            r#"
            SELECT u.id, u.email, u.pwd_hash, u.name, u.fname, u.lname,
                   r.name AS role_name, u.must_change_pw
            FROM tbl_users u
            JOIN tbl_roles r ON r.id = u.role_id
            WHERE LOWER(u.email) = LOWER($1)
              AND COALESCE(u.is_active, TRUE)
              AND u.archived_at IS NULL
            LIMIT 1
            "#,
        )
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("查询登录账号"))?;
        row.map(CredentialsRow::into_credentials).transpose()
    }

    async fn password_hash(&self, user: UserId) -> AppResult<Option<String>> {
        sqlx::query_scalar("SELECT pwd_hash FROM tbl_users WHERE id = $1 AND archived_at IS NULL")
            .bind(user.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("查询密码"))
    }

    async fn set_password(&self, user: UserId, password_hash: &str) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE tbl_users
            SET pwd_hash = $1, must_change_pw = FALSE, updated_at = NOW()
            WHERE id = $2 AND archived_at IS NULL
            "#,
        )
        .bind(password_hash)
        .bind(user.0)
        .execute(&self.pool)
        .await
        .map_err(db_error("修改密码"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn must_change_password(&self, user: UserId) -> AppResult<bool> {
        let flag: Option<bool> = sqlx::query_scalar(
            "SELECT must_change_pw FROM tbl_users WHERE id = $1 AND archived_at IS NULL",
        )
        .bind(user.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("查询密码修改标记"))?;
        Ok(flag.unwrap_or(false))
    }

    async fn personal_info(&self, user: UserId) -> AppResult<Option<PersonalInfo>> {
        let row = sqlx::query_as::<_, PersonalInfoRow>(
            r#"
            SELECT fname, mname, lname, contact_no, bday, age, sex
            FROM tbl_users
            WHERE id = $1 AND archived_at IS NULL
            "#,
        )
        .bind(user.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("查询个人信息"))?;
        Ok(row.map(PersonalInfo::from))
    }

    async fn update_personal_info(&self, user: UserId, info: &PersonalInfo) -> AppResult<bool> {
        let mut conn = self.pool.acquire().await.map_err(db_error("获取数据库连接"))?;
        Self::write_personal_info(&mut conn, user, info).await
    }

    async fn email_taken(&self, email: &Email, exclude: Option<UserId>) -> AppResult<bool> {
        sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM tbl_users
                WHERE LOWER(email) = LOWER($1) AND archived_at IS NULL
                  AND ($2::INTEGER IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(email.as_str())
        .bind(exclude.map(|u| u.0))
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("检查邮箱"))
    }

    async fn update_email(&self, user: UserId, email: &Email) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE tbl_users SET email = $1, updated_at = NOW() WHERE id = $2 AND archived_at IS NULL",
        )
        .bind(email.as_str())
        .bind(user.0)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, EMAIL_CONFLICT, "update email"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_users(&self, filter: &UserFilter, pagination: Pagination) -> AppResult<Vec<UserSummary>> {
        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT u.id, u.name, u.fname, u.lname, u.email, u.created_at, u.archived_at",
        );
        Self::push_filter(&mut qb, filter);
        qb.push(if filter.archived {
            " ORDER BY u.archived_at DESC, u.id DESC"
        } else {
            " ORDER BY u.created_at DESC, u.id DESC"
        });
        push_page(&mut qb, pagination);

        let rows = qb
            .build_query_as::<UserSummaryRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("查询用户列表"))?;
        Ok(rows.into_iter().map(UserSummary::from).collect())
    }

    async fn count_users(&self, filter: &UserFilter) -> AppResult<u64> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
        Self::push_filter(&mut qb, filter);

        let total = qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("统计用户数量"))?;
        Ok(to_count(total))
    }

    async fn user_details(&self, role: Role, user: UserId, archived: bool) -> AppResult<Option<UserDetails>> {
        let mut conn = self.pool.acquire().await.map_err(db_error("获取数据库连接"))?;
        let row = sqlx::query_as::<_, UserDetailsRow>(
            r#"
            SELECT u.id, u.name, u.fname, u.lname, u.email, u.bday, u.age, u.sex,
                   u.contact_no, u.is_active, u.created_at, u.archived_at
            FROM tbl_users u
            JOIN tbl_roles r ON r.id = u.role_id
            WHERE u.id = $1 AND r.name = $2 AND (u.archived_at IS NOT NULL) = $3
            "#,
        )
        .bind(user.0)
        .bind(role.as_str())
        .bind(archived)
        .fetch_optional(&mut *conn)
        .await
        .map_err(db_error("查询用户详情"))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let address = latest_user_address(&mut conn, user).await?;
        Ok(Some(row.into_details(address.map(|a| a.address))))
    }

    async fn insert_user(&self, user: &NewUser) -> AppResult<UserId> {
        let info = &user.profile.info;
        let id: Option<i32> = sqlx::query_scalar(
            r#"
            INSERT INTO tbl_users
                (email, pwd_hash, name, fname, mname, lname, contact_no, bday, age, sex,
                 is_active, must_change_pw, role_id, user_id, created_at)
            SELECT $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, TRUE, TRUE, r.id, $11, NOW()
            FROM tbl_roles r
            WHERE r.name = $12
            RETURNING id
            "#,
        )
        .bind(user.profile.email.as_str())
        .bind(&user.password_hash)
        .bind(info.full_name())
        .bind(&info.first_name)
        .bind(&info.middle_name)
        .bind(&info.last_name)
        .bind(&info.contact)
        .bind(info.birthday)
        .bind(info.age)
        .bind(info.sex.map(|s| s.code()))
        .bind(user.owner.map(|o| o.0))
        .bind(user.role.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, EMAIL_CONFLICT, "insert user"))?;

        id.map(UserId).ok_or_else(|| {
            AppError::failed_precondition(format!("角色 {} 不存在", user.role))
        })
    }

    async fn update_user(&self, role: Role, user: UserId, profile: &UserProfile) -> AppResult<bool> {
        let info = &profile.info;
        let result = sqlx::query(
            r#"
            UPDATE tbl_users u
            SET email = $1, name = $2, fname = $3, mname = $4, lname = $5, contact_no = $6,
                bday = $7, age = $8, sex = $9, updated_at = NOW()
            FROM tbl_roles r
            WHERE r.id = u.role_id AND r.name = $10 AND u.id = $11 AND u.archived_at IS NULL
            "#,
        )
        .bind(profile.email.as_str())
        .bind(info.full_name())
        .bind(&info.first_name)
        .bind(&info.middle_name)
        .bind(&info.last_name)
        .bind(&info.contact)
        .bind(info.birthday)
        .bind(info.age)
        .bind(info.sex.map(|s| s.code()))
        .bind(role.as_str())
        .bind(user.0)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, EMAIL_CONFLICT, "update user"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_archived(&self, role: Role, user: UserId, archived: bool) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE tbl_users u
            SET archived_at = CASE WHEN $3 THEN NOW() ELSE NULL END, updated_at = NOW()
            FROM tbl_roles r
            WHERE r.id = u.role_id AND r.name = $1 AND u.id = $2
              AND (u.archived_at IS NULL) = $3
            "#,
        )
        .bind(role.as_str())
        .bind(user.0)
        .bind(archived)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, EMAIL_CONFLICT, "change user archive state"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn pending_request(&self, user: UserId) -> AppResult<Option<StoredRequest>> {
        let row: Option<(Option<String>, Option<String>)> = sqlx::query_as(
            r#"
            SELECT permission_request_type, permission_request_data
            FROM tbl_users
            WHERE id = $1 AND permission_request_status = $2 AND archived_at IS NULL
            "#,
        )
        .bind(user.0)
        .bind(PENDING_STATUS)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("查询待审批申请"))?;

        Ok(row.and_then(|(kind, data)| match (kind, data) {
            (Some(request_type), Some(data)) if !request_type.is_empty() && !data.is_empty() => {
                Some(StoredRequest { request_type, data })
            }
            _ => None,
        }))
    }

    async fn save_request(
        &self,
        user: UserId,
        request_type: PermissionRequestType,
        data: &str,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE tbl_users
            SET permission_request_type = $1, permission_request_data = $2,
                permission_request_status = $3, permission_request_date = NOW()
            WHERE id = $4 AND archived_at IS NULL
            "#,
        )
        .bind(request_type.as_str())
        .bind(data)
        .bind(PENDING_STATUS)
        .bind(user.0)
        .execute(&self.pool)
        .await
        .map_err(db_error("提交修改申请"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_requests(
        &self,
        admin: UserId,
        search: Option<String>,
        pagination: Pagination,
    ) -> AppResult<Vec<PermissionRequestSummary>> {
        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT u.id, u.name, u.fname, u.lname, u.email, u.permission_request_type, u.permission_request_date",
        );
        Self::push_request_filter(&mut qb, admin, search.as_deref());
        qb.push(" ORDER BY u.permission_request_date DESC NULLS LAST, u.id DESC");
        push_page(&mut qb, pagination);

        let rows = qb
            .build_query_as::<RequestSummaryRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("查询修改申请"))?;
        Ok(rows.into_iter().map(PermissionRequestSummary::from).collect())
    }

    async fn count_requests(&self, admin: UserId, search: Option<String>) -> AppResult<u64> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
        Self::push_request_filter(&mut qb, admin, search.as_deref());

        let total = qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("统计修改申请"))?;
        Ok(to_count(total))
    }

    async fn request_details(&self, user: UserId) -> AppResult<Option<PermissionRequestDetails>> {
        let row = sqlx::query_as::<_, RequestDetailsRow>(
            r#"
            SELECT id, name, email, fname, mname, lname, contact_no, bday, age, sex,
                   permission_request_type, permission_request_data, permission_request_date
            FROM tbl_users
            WHERE id = $1 AND permission_request_status = $2 AND archived_at IS NULL
            "#,
        )
        .bind(user.0)
        .bind(PENDING_STATUS)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("查询申请详情"))?;
        Ok(row.map(PermissionRequestDetails::from))
    }

    async fn apply_request(
        &self,
        user: UserId,
        info: Option<PersonalInfo>,
        address: Option<Address>,
    ) -> AppResult<bool> {
        let mut tx = self.tx_manager.begin().await?;

        let pending: Option<i32> = sqlx::query_scalar(
            r#"
            SELECT id FROM tbl_users
            WHERE id = $1 AND permission_request_status = $2 AND archived_at IS NULL
            FOR UPDATE
            "#,
        )
        .bind(user.0)
        .bind(PENDING_STATUS)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("锁定修改申请"))?;
        if pending.is_none() {
            TransactionManager::rollback(tx).await?;
            return Ok(false);
        }

        if let Some(info) = &info {
            Self::write_personal_info(&mut tx, user, info).await?;
        }
        if let Some(address) = &address {
            upsert_user_address(&mut tx, user, address).await?;
        }

        sqlx::query(
            r#"
            UPDATE tbl_users
            SET permission_request_type = NULL, permission_request_data = NULL,
                permission_request_status = NULL, permission_request_date = NULL,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user.0)
        .execute(&mut *tx)
        .await
        .map_err(db_error("清除修改申请"))?;

        TransactionManager::commit(tx).await?;
        debug!(
            user_id = user.0,
            personal_info = info.is_some(),
            address = address.is_some(),
            "Permission request applied"
        );
        Ok(true)
    }

    async fn clear_request(&self, user: UserId) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE tbl_users
            SET permission_request_type = NULL, permission_request_data = NULL,
                permission_request_status = NULL, permission_request_date = NULL,
                updated_at = NOW()
            WHERE id = $1 AND permission_request_status = $2
            "#,
        )
        .bind(user.0)
        .bind(PENDING_STATUS)
        .execute(&self.pool)
        .await
        .map_err(db_error("清除修改申请"))?;
        Ok(result.rows_affected() > 0)
    }
}
