//! 表存储接口
//!
//! 同步引擎只通过 [`TableStore`] 访问两侧数据库，测试时用内存实现替换。

use async_trait::async_trait;
use serde_json::Value;
use softwear_adapter_postgres::DbErrorKind;
use thiserror::Error;

use super::{ColumnInfo, Record, TableName};

/// 存储层错误，保留 SQLSTATE 以便按约束类型分类
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct StoreError {
    pub code: Option<String>,
    pub message: String,
}

impl StoreError {
    pub fn new(code: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            code: code.map(str::to_string),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> DbErrorKind {
        DbErrorKind::from_sqlstate(self.code.as_deref())
    }

    /// 错误码文本，未知时为 "unknown"
    pub fn code_text(&self) -> &str {
        self.code.as_deref().unwrap_or("unknown")
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// 按行写入的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Inserted,
    Updated,
    /// 行已存在且没有可更新的列
    Unchanged,
}

/// 一侧数据库的表级操作
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TableStore: Send + Sync {
    /// 连通性检查
    async fn ping(&self) -> StoreResult<()>;

    async fn table_exists(&self, table: &TableName) -> StoreResult<bool>;

    async fn count_rows(&self, table: &TableName) -> StoreResult<i64>;

    /// 列定义，按列序排列
    async fn columns(&self, table: &TableName) -> StoreResult<Vec<ColumnInfo>>;

    /// 主键的第一列
    async fn primary_key(&self, table: &TableName) -> StoreResult<Option<String>>;

    async fn fetch_rows(&self, table: &TableName) -> StoreResult<Vec<Record>>;

    /// 某列全部非空值的文本形式
    async fn key_values(&self, table: &TableName, column: &str) -> StoreResult<Vec<String>>;

    /// 按主键更新 `columns`，返回受影响行数
    async fn update_row(
        &self,
        table: &TableName,
        key_column: &str,
        columns: &[String],
        row: &Record,
    ) -> StoreResult<u64>;

    async fn row_exists(&self, table: &TableName, key_column: &str, row: &Record)
    -> StoreResult<bool>;

    /// 插入 `columns`；`override_identity` 为真时显式写入标识列
    async fn insert_row(
        &self,
        table: &TableName,
        columns: &[String],
        row: &Record,
        override_identity: bool,
    ) -> StoreResult<()>;

    /// 把标识列的序列推进到当前最大值之后
    async fn realign_identity(&self, table: &TableName, column: &str) -> StoreResult<()>;
}

/// 主键值的文本形式，用于与 `key_values` 的结果比较
pub fn key_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_text() {
        assert_eq!(key_text(&Value::from(42)), Some("42".to_string()));
        assert_eq!(key_text(&Value::from("SO-1")), Some("SO-1".to_string()));
        assert_eq!(key_text(&Value::Null), None);
    }

    #[test]
    fn test_store_error_kind() {
        let err = StoreError::new(Some("23503"), "violates foreign key");
        assert_eq!(err.kind(), DbErrorKind::ForeignKeyViolation);
        assert_eq!(StoreError::new(None, "io").code_text(), "unknown");
    }
}
