//! 表名与列名的校验和引用
//!
//! 表名来自配置或命令行，会被拼进 SQL，因此只接受普通标识符。

use std::fmt;

use softwear_errors::{AppError, AppResult};

/// 经过校验的表名（`[A-Za-z_][A-Za-z0-9_]*`）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName(String);

impl TableName {
    pub fn parse(name: &str) -> AppResult<Self> {
        let name = name.trim();
        let mut chars = name.chars();
        let valid_start = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
        if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(AppError::validation(format!("Invalid table name: '{}'", name)));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 带双引号的 SQL 标识符
    pub fn quoted(&self) -> String {
        quote_ident(&self.0)
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 双引号引用标识符，内部的 `"` 加倍
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
