//! QueryBuilder 辅助：搜索、分页、日期区间
//!
//! "今天"与日期过滤统一按 UTC 日历日计算。

use softwear_common::{DateRange, Pagination, search_pattern};
use softwear_errors::AppError;
use sqlx::{Postgres, QueryBuilder};

/// TIMESTAMPTZ 列按 UTC 取日期
pub fn utc_date(column: &str) -> String {
    format!("({} AT TIME ZONE 'UTC')::date", column)
}

/// 当前 UTC 日期的 SQL 表达式
pub const UTC_TODAY: &str = "(NOW() AT TIME ZONE 'UTC')::date";

/// 生成 `map_err` 用的闭包，消息格式为 `{action} failed: {err}`
pub fn db_error(action: impl std::fmt::Display) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| AppError::database(format!("{} failed: {}", action, e))
}

/// 追加 `AND (a ILIKE $n OR b ILIKE $n ...)`，空搜索词不追加
pub fn push_search(qb: &mut QueryBuilder<'_, Postgres>, columns: &[&str], search: Option<&str>) {
    let Some(pattern) = search_pattern(search) else {
        return;
    };
    qb.push(" AND (");
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            qb.push(" OR ");
        }
        qb.push(*column).push(" ILIKE ").push_bind(pattern.clone());
    }
    qb.push(")");
}

/// 追加 `AND date_expr >= $a AND date_expr <= $b`，缺失的一端不追加
pub fn push_date_range(qb: &mut QueryBuilder<'_, Postgres>, date_expr: &str, range: &DateRange) {
    if let Some(start) = range.start {
        qb.push(" AND ").push(date_expr).push(" >= ").push_bind(start);
    }
    if let Some(end) = range.end {
        qb.push(" AND ").push(date_expr).push(" <= ").push_bind(end);
    }
}

pub fn push_page(qb: &mut QueryBuilder<'_, Postgres>, pagination: Pagination) {
    qb.push(" LIMIT ")
        .push_bind(pagination.limit())
        .push(" OFFSET ")
        .push_bind(pagination.offset());
}

/// COUNT(*) 结果转为 u64
pub fn to_count(total: i64) -> u64 {
    total.max(0) as u64
}
