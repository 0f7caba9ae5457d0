//! 操作审计日志

use chrono::{DateTime, Utc};
use serde::Serialize;
use softwear_common::{DateRange, UserId};

/// 待写入的日志
#[derive(Debug, Clone, PartialEq)]
pub struct NewHistoryEntry {
    pub user_id: UserId,
    pub status: String,
    pub module: String,
    pub description: String,
    /// 为空时使用当前时间
    pub ts: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub id: i32,
    pub user_id: UserId,
    pub user_name: String,
    pub user_role: String,
    pub status: String,
    pub module: String,
    pub description: String,
    pub ts: DateTime<Utc>,
}

/// 日志查询条件；status 与 module 为精确匹配，日期按 UTC 日历日
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryFilter {
    pub user_id: Option<UserId>,
    pub search: Option<String>,
    pub status: Option<String>,
    pub module: Option<String>,
    pub range: DateRange,
}
