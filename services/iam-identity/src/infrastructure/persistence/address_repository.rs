//! 用户地址仓储
//!
//! 供应商地址也在 `tbl_addresses` 中，用户地址以 `supplier_id IS NULL` 区分。

use async_trait::async_trait;
use softwear_adapter_postgres::{TransactionManager, db_error};
use softwear_common::UserId;
use softwear_errors::AppResult;
use sqlx::{PgConnection, PgPool};

use crate::domain::{Address, AddressRepository, UserAddress};

use super::rows::AddressRow;

/// 更新用户最近一条地址，没有则新增
pub(super) async fn upsert_user_address(
    conn: &mut PgConnection,
    user: UserId,
    address: &Address,
) -> AppResult<i32> {
    let updated: Option<i32> = sqlx::query_scalar(
        r#"
        UPDATE tbl_addresses
        SET street = $1, city = $2, province = $3, zip = $4, updated_at = NOW()
        WHERE id = (
            SELECT id FROM tbl_addresses
            WHERE user_id = $5 AND supplier_id IS NULL AND archived_at IS NULL
            ORDER BY created_at DESC, id DESC
            LIMIT 1
        )
        RETURNING id
        "#,
    )
    .bind(&address.street)
    .bind(&address.city)
    .bind(&address.province)
    .bind(&address.zip)
    .bind(user.0)
    .fetch_optional(&mut *conn)
    .await
    .map_err(db_error("更新用户地址"))?;

    if let Some(id) = updated {
        return Ok(id);
    }

    sqlx::query_scalar(
        r#"
        INSERT INTO tbl_addresses (user_id, street, city, province, zip, created_at)
        VALUES ($1, $2, $3, $4, $5, NOW())
        RETURNING id
        "#,
    )
    .bind(user.0)
    .bind(&address.street)
    .bind(&address.city)
    .bind(&address.province)
    .bind(&address.zip)
    .fetch_one(&mut *conn)
    .await
    .map_err(db_error("新增用户地址"))
}

pub(super) async fn latest_user_address(
    conn: &mut PgConnection,
    user: UserId,
) -> AppResult<Option<UserAddress>> {
    let row = sqlx::query_as::<_, AddressRow>(
        r#"
        SELECT id, user_id, street, city, province, zip, created_at
        FROM tbl_addresses
        WHERE user_id = $1 AND supplier_id IS NULL AND archived_at IS NULL
        ORDER BY created_at DESC, id DESC
        LIMIT 1
        "#,
    )
    .bind(user.0)
    .fetch_optional(&mut *conn)
    .await
    .map_err(db_error("查询用户地址"))?;
    Ok(row.map(UserAddress::from))
}

pub struct PostgresAddressRepository {
    pool: PgPool,
    tx_manager: TransactionManager,
}

impl PostgresAddressRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            tx_manager: TransactionManager::new(pool.clone()),
            pool,
        }
    }
}

#[async_trait]
impl AddressRepository for PostgresAddressRepository {
    async fn latest(&self, user: UserId) -> AppResult<Option<UserAddress>> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(db_error("获取数据库连接"))?;
        latest_user_address(&mut conn, user).await
    }

    async fn save(&self, user: UserId, address: &Address) -> AppResult<i32> {
        let mut tx = self.tx_manager.begin().await?;
        let id = upsert_user_address(&mut tx, user, address).await?;
        TransactionManager::commit(tx).await?;
        Ok(id)
    }
}
