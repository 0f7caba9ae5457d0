//! 通用类型定义

use chrono::{Duration, NaiveDate};
use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

/// 用户 ID（tbl_users.id）
///
/// 卖家、员工与管理员共用同一张表，归属关系通过 `tbl_users.user_id` 表达。
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    From,
)]
#[display("{_0}")]
pub struct UserId(pub i32);

impl UserId {
    /// 0 在若干查询中表示"不限定"
    pub const ANY: UserId = UserId(0);

    pub fn is_any(&self) -> bool {
        self.0 == 0
    }
}

/// 分页参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 10,
        }
    }
}

impl Pagination {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.max(1),
        }
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.page_size.max(1))
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size.max(1))
    }

    /// 对内存中的列表做分页切片
    pub fn slice<T: Clone>(&self, items: &[T]) -> Vec<T> {
        let start = usize::try_from(self.offset()).unwrap_or(usize::MAX);
        let len = usize::try_from(self.limit()).unwrap_or(usize::MAX);
        items.iter().skip(start).take(len).cloned().collect()
    }
}

/// 分页结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

impl<T> PagedResult<T> {
    pub fn new(items: Vec<T>, total: u64, pagination: &Pagination) -> Self {
        Self {
            items,
            total,
            page: pagination.page,
            page_size: pagination.page_size,
        }
    }

    pub fn total_pages(&self) -> u32 {
        if self.page_size == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(self.page_size)) as u32
    }
}

/// 日期区间（两端均包含）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// 截至 `today`（含）的最近 `days` 天
    pub fn last_days(today: NaiveDate, days: u32) -> Self {
        let span = i64::from(days.max(1)) - 1;
        Self::between(today - Duration::days(span), today)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.is_none_or(|s| date >= s) && self.end.is_none_or(|e| date <= e)
    }

    /// 区间内的每一天；任一端缺失时返回空
    pub fn days(&self) -> Vec<NaiveDate> {
        match (self.start, self.end) {
            (Some(start), Some(end)) if start <= end => {
                start.iter_days().take_while(|d| *d <= end).collect()
            }
            _ => Vec::new(),
        }
    }
}
