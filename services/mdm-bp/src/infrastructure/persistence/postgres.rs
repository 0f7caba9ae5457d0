//! 供应商仓储的 PostgreSQL 实现

use async_trait::async_trait;
use softwear_adapter_postgres::{
    TransactionManager, db_error, push_page, push_search, to_count,
};
use softwear_common::{Pagination, UserId};
use softwear_errors::AppResult;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use tracing::debug;

use crate::domain::{
    Supplier, SupplierAddress, SupplierDraft, SupplierFilter, SupplierOption, SupplierRepository,
};

use super::rows::{AddressRow, SupplierOptionRow, SupplierRow};

const SEARCH_COLUMNS: [&str; 4] = ["company_name", "contact_person", "email", "contact_number"];

pub struct PostgresSupplierRepository {
    pool: PgPool,
    tx_manager: TransactionManager,
}

impl PostgresSupplierRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            tx_manager: TransactionManager::new(pool.clone()),
            pool,
        }
    }

    fn push_conditions(qb: &mut QueryBuilder<'_, Postgres>, owner: UserId, filter: &SupplierFilter) {
        qb.push(" WHERE user_id = ").push_bind(owner.0);
        qb.push(if filter.archived {
            " AND archived_at IS NOT NULL"
        } else {
            " AND archived_at IS NULL"
        });
        if let Some(status) = filter.status {
            qb.push(" AND status = ").push_bind(status.as_str());
        }
        push_search(qb, &SEARCH_COLUMNS, filter.search.as_deref());
    }

    /// 地址存在则修改，否则新增
    async fn upsert_address(
        tx: &mut Transaction<'static, Postgres>,
        owner: UserId,
        supplier_id: i32,
        address: &SupplierAddress,
    ) -> AppResult<()> {
        let updated = sqlx::query(
            r#"
            UPDATE tbl_addresses
            SET street = $1, city = $2, province = $3, zip = $4, updated_at = NOW()
            WHERE supplier_id = $5 AND archived_at IS NULL
            "#,
        )
        .bind(&address.street)
        .bind(&address.city)
        .bind(&address.province)
        .bind(&address.zip)
        .bind(supplier_id)
        .execute(&mut **tx)
        .await
        .map_err(db_error("更新供应商地址"))?;

        if updated.rows_affected() == 0 {
            sqlx::query(
                r#"
                INSERT INTO tbl_addresses (user_id, supplier_id, street, city, province, zip, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, NOW())
                "#,
            )
            .bind(owner.0)
            .bind(supplier_id)
            .bind(&address.street)
            .bind(&address.city)
            .bind(&address.province)
            .bind(&address.zip)
            .execute(&mut **tx)
            .await
            .map_err(db_error("新增供应商地址"))?;
        }
        Ok(())
    }
}

#[async_trait]
impl SupplierRepository for PostgresSupplierRepository {
    async fn list(
        &self,
        owner: UserId,
        filter: &SupplierFilter,
        pagination: Pagination,
    ) -> AppResult<Vec<Supplier>> {
        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT id, company_name, contact_person, email, contact_number, status, created_at, archived_at FROM tbl_suppliers",
        );
        Self::push_conditions(&mut qb, owner, filter);
        qb.push(if filter.archived {
            " ORDER BY archived_at DESC, id DESC"
        } else {
            " ORDER BY created_at DESC, id DESC"
        });
        push_page(&mut qb, pagination);

        let rows = qb
            .build_query_as::<SupplierRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("查询供应商列表"))?;

        rows.into_iter().map(|row| row.into_supplier(None)).collect()
    }

    async fn count(&self, owner: UserId, filter: &SupplierFilter) -> AppResult<u64> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM tbl_suppliers");
        Self::push_conditions(&mut qb, owner, filter);

        let total = qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("统计供应商数量"))?;
        Ok(to_count(total))
    }

    async fn find(&self, owner: UserId, id: i32, archived: bool) -> AppResult<Option<Supplier>> {
        let row = sqlx::query_as::<_, SupplierRow>(
            r#"
            SELECT id, company_name, contact_person, email, contact_number, status, created_at, archived_at
            FROM tbl_suppliers
            WHERE id = $1 AND user_id = $2 AND (archived_at IS NOT NULL) = $3
            "#,
        )
        .bind(id)
        .bind(owner.0)
        .bind(archived)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("查询供应商详情"))?;

        let Some(row) = row else {
            return Ok(None);
        };

        // 归档供应商的地址也已归档
        let address = sqlx::query_as::<_, AddressRow>(
            r#"
            SELECT street, city, province, zip
            FROM tbl_addresses
            WHERE supplier_id = $1 AND (archived_at IS NOT NULL) = $2
            ORDER BY id DESC
            LIMIT 1
            "#,
        )
        .bind(id)
        .bind(archived)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("查询供应商地址"))?;

        row.into_supplier(address.map(SupplierAddress::from)).map(Some)
    }

    async fn insert(&self, owner: UserId, draft: &SupplierDraft) -> AppResult<i32> {
        let mut tx = self.tx_manager.begin().await?;

        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO tbl_suppliers (user_id, company_name, contact_person, email, contact_number, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW())
            RETURNING id
            "#,
        )
        .bind(owner.0)
        .bind(&draft.company_name)
        .bind(&draft.contact_person)
        .bind(&draft.email)
        .bind(&draft.contact_number)
        .bind(draft.status.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("新增供应商"))?;

        if let Some(address) = &draft.address {
            Self::upsert_address(&mut tx, owner, id, address).await?;
        }

        TransactionManager::commit(tx).await?;
        Ok(id)
    }

    async fn update(&self, owner: UserId, id: i32, draft: &SupplierDraft) -> AppResult<bool> {
        let mut tx = self.tx_manager.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE tbl_suppliers
            SET company_name = $1, contact_person = $2, email = $3, contact_number = $4,
                status = $5, updated_at = NOW()
            WHERE id = $6 AND user_id = $7 AND archived_at IS NULL
            "#,
        )
        .bind(&draft.company_name)
        .bind(&draft.contact_person)
        .bind(&draft.email)
        .bind(&draft.contact_number)
        .bind(draft.status.as_str())
        .bind(id)
        .bind(owner.0)
        .execute(&mut *tx)
        .await
        .map_err(db_error("更新供应商"))?;

        if updated.rows_affected() == 0 {
            TransactionManager::rollback(tx).await?;
            return Ok(false);
        }

        if let Some(address) = &draft.address {
            Self::upsert_address(&mut tx, owner, id, address).await?;
        }

        TransactionManager::commit(tx).await?;
        Ok(true)
    }

    async fn set_archived(&self, owner: UserId, id: i32, archived: bool) -> AppResult<bool> {
        let (supplier_sql, address_sql) = if archived {
            (
                r#"
                UPDATE tbl_suppliers
                SET status = 'Archived', archived_at = NOW(), updated_at = NOW()
                WHERE id = $1 AND user_id = $2 AND archived_at IS NULL
                "#,
                "UPDATE tbl_addresses SET archived_at = NOW(), updated_at = NOW() WHERE supplier_id = $1 AND archived_at IS NULL",
            )
        } else {
            (
                r#"
                UPDATE tbl_suppliers
                SET status = 'Active', archived_at = NULL, updated_at = NOW()
                WHERE id = $1 AND user_id = $2 AND archived_at IS NOT NULL
                "#,
                "UPDATE tbl_addresses SET archived_at = NULL, updated_at = NOW() WHERE supplier_id = $1 AND archived_at IS NOT NULL",
            )
        };

        let mut tx = self.tx_manager.begin().await?;
        let result = sqlx::query(supplier_sql)
            .bind(id)
            .bind(owner.0)
            .execute(&mut *tx)
            .await
            .map_err(db_error("更新供应商归档状态"))?;

        if result.rows_affected() == 0 {
            TransactionManager::rollback(tx).await?;
            return Ok(false);
        }

        let addresses = sqlx::query(address_sql)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_error("更新供应商地址归档状态"))?;
        TransactionManager::commit(tx).await?;

        debug!(id, archived, addresses = addresses.rows_affected(), "Supplier archive state changed");
        Ok(true)
    }

    async fn active_options(&self, owner: UserId) -> AppResult<Vec<SupplierOption>> {
        let rows = sqlx::query_as::<_, SupplierOptionRow>(
            r#"
            SELECT id, company_name
            FROM tbl_suppliers
            WHERE user_id = $1 AND status = 'Active' AND archived_at IS NULL
            ORDER BY company_name
            "#,
        )
        .bind(owner.0)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("查询可选供应商"))?;

        Ok(rows.into_iter().map(SupplierOption::from).collect())
    }
}
