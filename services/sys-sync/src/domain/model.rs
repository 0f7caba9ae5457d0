//! 同步结果与进度

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// 一行数据：列名 → JSON 值（来自 `to_jsonb(row)`）
pub type Record = serde_json::Map<String, serde_json::Value>;

/// 复制方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyncDirection {
    /// 本地 → 云端
    Push,
    /// 云端 → 本地
    Pull,
}

impl SyncDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncDirection::Push => "push",
            SyncDirection::Pull => "pull",
        }
    }
}

/// 数据库一侧
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatabaseSide {
    Local,
    Cloud,
}

/// 批量同步进度
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncProgress {
    pub current_table: usize,
    pub total_tables: usize,
    pub current_table_name: String,
    pub rows_synced: u64,
    pub rows_skipped: u64,
}

impl SyncProgress {
    /// 已处理表的百分比（整数除法）
    pub fn percentage(&self) -> usize {
        if self.total_tables > 0 {
            self.current_table * 100 / self.total_tables
        } else {
            0
        }
    }
}

/// 单表或批量同步结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncResult {
    pub success: bool,
    pub message: String,
    pub rows_synced: u64,
    pub rows_skipped: u64,
    pub errors: Vec<String>,
}

impl SyncResult {
    pub fn succeeded(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            ..Default::default()
        }
    }
}

/// 表行数
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableInfo {
    pub table_name: String,
    pub row_count: i64,
    pub last_sync: Option<DateTime<Utc>>,
}

/// 列定义
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub is_identity: bool,
}

/// 一次自动同步完成后广播的事件
#[derive(Debug, Clone)]
pub struct SyncCompleted {
    pub result: SyncResult,
    pub sync_time: Option<DateTime<Local>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_percentage() {
        let progress = SyncProgress {
            current_table: 9,
            total_tables: 27,
            ..Default::default()
        };
        assert_eq!(progress.percentage(), 33);
        assert_eq!(SyncProgress::default().percentage(), 0);
    }
}
