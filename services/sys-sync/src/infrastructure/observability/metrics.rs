//! 同步指标

use metrics::{counter, histogram};

use crate::domain::SyncDirection;

/// 记录一张表的复制结果
pub fn record_table_sync(
    table: &str,
    direction: SyncDirection,
    inserted: u64,
    updated: u64,
    skipped: u64,
) {
    let labels = [
        ("table", table.to_string()),
        ("direction", direction.as_str().to_string()),
    ];

    counter!("sync_rows_inserted_total", &labels).increment(inserted);
    counter!("sync_rows_updated_total", &labels).increment(updated);
    counter!("sync_rows_skipped_total", &labels).increment(skipped);
}

/// 记录一次批量同步耗时
pub fn record_batch_duration(direction: SyncDirection, seconds: f64) {
    let labels = [("direction", direction.as_str().to_string())];
    histogram!("sync_batch_duration_seconds", &labels).record(seconds);
}
