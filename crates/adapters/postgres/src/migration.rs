//! PostgreSQL 迁移管理
//!
//! 迁移脚本随二进制一起编译（`include_str!`），按版本号顺序应用，
//! 已应用的迁移以 SHA-256 校验和防止被改写。

use sha2::{Digest, Sha256};
use softwear_errors::{AppError, AppResult};
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashSet;
use tracing::{info, warn};

const MIGRATION_LOCK_KEY: i64 = 0x534F_4654_5745_4152;

/// 迁移记录
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MigrationRecord {
    pub version: i64,
    pub name: String,
    pub applied_at: chrono::DateTime<chrono::Utc>,
    pub checksum: String,
}

/// 迁移定义
#[derive(Debug, Clone)]
pub struct Migration {
    pub version: i64,
    pub name: String,
    pub up_sql: String,
    pub checksum: String,
}

impl Migration {
    pub fn new(version: i64, name: impl Into<String>, up_sql: impl Into<String>) -> Self {
        let up_sql = up_sql.into();
        let checksum = Self::calculate_checksum(&up_sql);
        Self {
            version,
            name: name.into(),
            up_sql,
            checksum,
        }
    }

    fn calculate_checksum(sql: &str) -> String {
        hex::encode(Sha256::digest(sql.as_bytes()))
    }
}

/// SoftWear 数据库结构迁移
pub fn schema_migrations() -> Vec<Migration> {
    vec![
        Migration::new(
            1,
            "initial_schema",
            include_str!("../migrations/0001_initial_schema.sql"),
        ),
        Migration::new(
            2,
            "reference_data",
            include_str!("../migrations/0002_reference_data.sql"),
        ),
        Migration::new(
            3,
            "stock_in_return_link",
            include_str!("../migrations/0003_stock_in_return_link.sql"),
        ),
    ]
}

/// 迁移管理器
pub struct MigrationManager {
    pool: PgPool,
    table_name: String,
}

impl MigrationManager {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            table_name: "_migrations".to_string(),
        }
    }

    /// 设置迁移表名
    pub fn with_table_name(mut self, name: impl Into<String>) -> Self {
        self.table_name = name.into();
        self
    }

    /// 初始化迁移表
    pub async fn init(&self) -> AppResult<()> {
        let create_sql = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                version BIGINT PRIMARY KEY,
                name VARCHAR(255) NOT NULL,
                applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                checksum VARCHAR(64) NOT NULL
            )
            "#,
            self.table_name
        );

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {}", e)))?;
        lock_migrations(&mut tx).await?;
        sqlx::query(&create_sql)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to create migration table: {}", e)))?;
        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to create migration table: {}", e)))?;

        info!(table = %self.table_name, "Migration table initialized");
        Ok(())
    }

    /// 获取已应用的迁移
    pub async fn get_applied_migrations(&self) -> AppResult<Vec<MigrationRecord>> {
        let sql = format!(
            "SELECT version, name, applied_at, checksum FROM {} ORDER BY version ASC",
            self.table_name
        );

        sqlx::query_as::<_, MigrationRecord>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get migrations: {}", e)))
    }

    /// 获取当前版本
    pub async fn current_version(&self) -> AppResult<Option<i64>> {
        let sql = format!("SELECT MAX(version) FROM {}", self.table_name);

        let row: Option<(Option<i64>,)> = sqlx::query_as(&sql)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get current version: {}", e)))?;

        Ok(row.and_then(|(v,)| v))
    }

    /// 在单个事务中应用一个迁移
    pub async fn apply(&self, migration: &Migration) -> AppResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {}", e)))?;
        lock_migrations(&mut tx).await?;

        let check_sql = format!("SELECT version FROM {} WHERE version = $1", self.table_name);
        let existing: Option<(i64,)> = sqlx::query_as(&check_sql)
            .bind(migration.version)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to check migration: {}", e)))?;

        if existing.is_some() {
            warn!(
                version = migration.version,
                name = %migration.name,
                "Migration already applied, skipping"
            );
            return Ok(());
        }

        // 迁移脚本包含多条语句，需走简单查询协议
        sqlx::raw_sql(&migration.up_sql)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::database(format!(
                    "Failed to apply migration {}: {}",
                    migration.version, e
                ))
            })?;

        let insert_sql = format!(
            "INSERT INTO {} (version, name, checksum) VALUES ($1, $2, $3)",
            self.table_name
        );
        sqlx::query(&insert_sql)
            .bind(migration.version)
            .bind(&migration.name)
            .bind(&migration.checksum)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to record migration: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit migration: {}", e)))?;

        info!(
            version = migration.version,
            name = %migration.name,
            "Migration applied successfully"
        );

        Ok(())
    }

    /// 应用所有待处理的迁移
    pub async fn migrate(&self, migrations: &[Migration]) -> AppResult<MigrationResult> {
        self.init().await?;

        let applied = self.get_applied_migrations().await?;
        let applied_versions: HashSet<i64> = applied.iter().map(|m| m.version).collect();

        let mut result = MigrationResult::default();

        let mut sorted_migrations: Vec<_> = migrations.iter().collect();
        sorted_migrations.sort_by_key(|m| m.version);

        for migration in sorted_migrations {
            if applied_versions.contains(&migration.version) {
                if let Some(record) = applied.iter().find(|r| r.version == migration.version)
                    && record.checksum != migration.checksum
                {
                    result.errors.push(MigrationError {
                        version: migration.version,
                        name: migration.name.clone(),
                        error: "Checksum mismatch - migration has been modified".to_string(),
                    });
                    continue;
                }
                result.skipped.push(migration.version);
                continue;
            }

            match self.apply(migration).await {
                Ok(()) => result.applied.push(migration.version),
                Err(e) => {
                    result.errors.push(MigrationError {
                        version: migration.version,
                        name: migration.name.clone(),
                        error: e.to_string(),
                    });
                    // 后续迁移依赖前一个，出错即停止
                    break;
                }
            }
        }

        Ok(result)
    }
}

/// 多个进程同时迁移时串行化，锁随事务结束释放
async fn lock_migrations(tx: &mut Transaction<'static, Postgres>) -> AppResult<()> {
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(MIGRATION_LOCK_KEY)
        .execute(&mut **tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to acquire migration lock: {}", e)))?;
    Ok(())
}

/// 迁移结果
#[derive(Debug, Clone, Default)]
pub struct MigrationResult {
    pub applied: Vec<i64>,
    pub skipped: Vec<i64>,
    pub errors: Vec<MigrationError>,
}

impl MigrationResult {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn applied_count(&self) -> usize {
        self.applied.len()
    }
}

/// 迁移错误
#[derive(Debug, Clone)]
pub struct MigrationError {
    pub version: i64,
    pub name: String,
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_is_sha256_hex() {
        let m = Migration::new(1, "test", "CREATE TABLE test (id INT)");
        assert_eq!(m.checksum.len(), 64);
        assert!(m.checksum.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_checksum_difference() {
        let m1 = Migration::new(1, "test", "CREATE TABLE test1 (id INT)");
        let m2 = Migration::new(1, "test", "CREATE TABLE test2 (id INT)");
        assert_ne!(m1.checksum, m2.checksum);
    }

    #[test]
    fn test_schema_migrations_are_ordered() {
        let migrations = schema_migrations();
        let versions: Vec<i64> = migrations.iter().map(|m| m.version).collect();
        assert_eq!(versions, vec![1, 2, 3]);
        assert!(migrations[0].up_sql.contains("tbl_supplier_payments"));
        assert!(migrations[1].up_sql.contains("tbl_roles"));
        assert!(migrations[2].up_sql.contains("return_id"));
    }

    #[test]
    fn test_migration_result() {
        let result = MigrationResult {
            applied: vec![1, 2],
            ..Default::default()
        };
        assert!(result.is_success());
        assert_eq!(result.applied_count(), 2);
    }
}
