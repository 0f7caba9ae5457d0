//! PostgreSQL 表存储
//!
//! 行以 `to_jsonb(row)` 读出，写入时用 `jsonb_populate_record` 还原列类型，
//! 因此不需要为每张表声明行结构。

use async_trait::async_trait;
use softwear_adapter_postgres::{db_message, sqlstate};
use sqlx::PgPool;
use sqlx::types::Json;

use crate::domain::{
    ColumnInfo, Record, StoreError, StoreResult, TableName, TableStore, quote_ident,
};

use super::rows::ColumnRow;

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError {
            code: sqlstate(&err),
            message: db_message(&err),
        }
    }
}

fn column_list(columns: &[String], prefix: &str) -> String {
    columns
        .iter()
        .map(|c| format!("{}{}", prefix, quote_ident(c)))
        .collect::<Vec<_>>()
        .join(", ")
}

pub struct PostgresTableStore {
    pool: PgPool,
}

impl PostgresTableStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// ====== TableStore 实现 ======

#[async_trait]
impl TableStore for PostgresTableStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn table_exists(&self, table: &TableName) -> StoreResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = current_schema() AND table_name = $1
            )
            "#,
        )
        .bind(table.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn count_rows(&self, table: &TableName) -> StoreResult<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", table.quoted());
        let count = sqlx::query_scalar::<_, i64>(&sql)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn columns(&self, table: &TableName) -> StoreResult<Vec<ColumnInfo>> {
        let rows = sqlx::query_as::<_, ColumnRow>(
            r#"
            SELECT column_name::text AS name,
                   data_type::text AS data_type,
                   (is_identity = 'YES') AS is_identity
            FROM information_schema.columns
            WHERE table_schema = current_schema() AND table_name = $1
            ORDER BY ordinal_position
            "#,
        )
        .bind(table.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ColumnInfo::from).collect())
    }

    async fn primary_key(&self, table: &TableName) -> StoreResult<Option<String>> {
        let column = sqlx::query_scalar::<_, String>(
            r#"
            SELECT kcu.column_name::text
            FROM information_schema.table_constraints tc
            JOIN information_schema.key_column_usage kcu
              ON kcu.constraint_name = tc.constraint_name
             AND kcu.table_schema = tc.table_schema
             AND kcu.table_name = tc.table_name
            WHERE tc.constraint_type = 'PRIMARY KEY'
              AND tc.table_schema = current_schema()
              AND tc.table_name = $1
            ORDER BY kcu.ordinal_position
            LIMIT 1
            "#,
        )
        .bind(table.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(column)
    }

    async fn fetch_rows(&self, table: &TableName) -> StoreResult<Vec<Record>> {
        let sql = format!("SELECT to_jsonb(t) FROM {} AS t", table.quoted());
        let rows = sqlx::query_scalar::<_, Json<Record>>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|Json(row)| row).collect())
    }

    async fn key_values(&self, table: &TableName, column: &str) -> StoreResult<Vec<String>> {
        let column = quote_ident(column);
        let sql = format!(
            "SELECT {col}::text FROM {table} WHERE {col} IS NOT NULL",
            col = column,
            table = table.quoted()
        );
        let keys = sqlx::query_scalar::<_, String>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(keys)
    }

    async fn update_row(
        &self,
        table: &TableName,
        key_column: &str,
        columns: &[String],
        row: &Record,
    ) -> StoreResult<u64> {
        let assignments = columns
            .iter()
            .map(|c| format!("{col} = r.{col}", col = quote_ident(c)))
            .collect::<Vec<_>>()
            .join(", ");
        let key = quote_ident(key_column);
        let sql = format!(
            "UPDATE {table} AS d SET {assignments} \
             FROM jsonb_populate_record(NULL::{table}, $1) AS r \
             WHERE d.{key} = r.{key}",
            table = table.quoted(),
        );

        let result = sqlx::query(&sql).bind(Json(row)).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn row_exists(
        &self,
        table: &TableName,
        key_column: &str,
        row: &Record,
    ) -> StoreResult<bool> {
        let key = quote_ident(key_column);
        let sql = format!(
            "SELECT EXISTS (SELECT 1 FROM {table} AS d, \
             jsonb_populate_record(NULL::{table}, $1) AS r \
             WHERE d.{key} = r.{key})",
            table = table.quoted(),
        );

        let exists = sqlx::query_scalar::<_, bool>(&sql)
            .bind(Json(row))
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn insert_row(
        &self,
        table: &TableName,
        columns: &[String],
        row: &Record,
        override_identity: bool,
    ) -> StoreResult<()> {
        let overriding = if override_identity {
            " OVERRIDING SYSTEM VALUE"
        } else {
            ""
        };
        let sql = format!(
            "INSERT INTO {table} ({targets}){overriding} \
             SELECT {values} FROM jsonb_populate_record(NULL::{table}, $1) AS r",
            table = table.quoted(),
            targets = column_list(columns, ""),
            values = column_list(columns, "r."),
        );

        sqlx::query(&sql).bind(Json(row)).execute(&self.pool).await?;
        Ok(())
    }

    async fn realign_identity(&self, table: &TableName, column: &str) -> StoreResult<()> {
        let sql = format!(
            "SELECT setval(pg_get_serial_sequence($1, $2), \
             GREATEST(COALESCE((SELECT MAX({col}) FROM {table}), 0), 1), \
             (SELECT MAX({col}) FROM {table}) IS NOT NULL)",
            col = quote_ident(column),
            table = table.quoted(),
        );

        sqlx::query(&sql)
            .bind(table.quoted())
            .bind(column)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_list_quotes_and_prefixes() {
        let columns = vec!["id".to_string(), "hex_value".to_string()];
        assert_eq!(column_list(&columns, ""), "\"id\", \"hex_value\"");
        assert_eq!(column_list(&columns, "r."), "r.\"id\", r.\"hex_value\"");
    }
}
