//! SQLSTATE 分类

use softwear_errors::AppError;

/// 唯一约束冲突
pub const UNIQUE_VIOLATION: &str = "23505";
/// 外键约束冲突
pub const FOREIGN_KEY_VIOLATION: &str = "23503";
/// 向 GENERATED ALWAYS 标识列写入值
pub const GENERATED_ALWAYS: &str = "428C9";

/// 数据库错误的类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbErrorKind {
    UniqueViolation,
    ForeignKeyViolation,
    IdentityConflict,
    Other,
}

impl DbErrorKind {
    pub fn from_sqlstate(code: Option<&str>) -> Self {
        match code {
            Some(UNIQUE_VIOLATION) => Self::UniqueViolation,
            Some(FOREIGN_KEY_VIOLATION) => Self::ForeignKeyViolation,
            Some(GENERATED_ALWAYS) => Self::IdentityConflict,
            _ => Self::Other,
        }
    }
}

/// 取出 sqlx 错误中的 SQLSTATE
pub fn sqlstate(err: &sqlx::Error) -> Option<String> {
    err.as_database_error()
        .and_then(|db| db.code())
        .map(|code| code.into_owned())
}

/// 分类 sqlx 错误
pub fn classify(err: &sqlx::Error) -> DbErrorKind {
    DbErrorKind::from_sqlstate(sqlstate(err).as_deref())
}

/// 数据库返回的原始消息（非数据库错误时为 Display 文本）
pub fn db_message(err: &sqlx::Error) -> String {
    match err.as_database_error() {
        Some(db) => db.message().to_string(),
        None => err.to_string(),
    }
}

/// 将唯一约束冲突映射为 Conflict，其余映射为 Database
pub fn map_unique_violation(err: sqlx::Error, conflict: &str, context: &str) -> AppError {
    match classify(&err) {
        DbErrorKind::UniqueViolation => AppError::conflict(conflict.to_string()),
        _ => AppError::database(format!("{} failed: {}", context, err)),
    }
}
