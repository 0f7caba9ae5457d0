//! 操作日志

use std::sync::Arc;

use softwear_common::{PagedResult, Pagination, UserId, non_blank};
use softwear_errors::{AppError, AppResult};
use tracing::debug;

use crate::domain::{HistoryEntry, HistoryFilter, HistoryRepository, NewHistoryEntry};

pub struct HistoryHandler {
    repo: Arc<dyn HistoryRepository>,
}

impl HistoryHandler {
    pub fn new(repo: Arc<dyn HistoryRepository>) -> Self {
        Self { repo }
    }

    pub async fn log(&self, entry: NewHistoryEntry) -> AppResult<i32> {
        if entry.status.trim().is_empty() || entry.module.trim().is_empty() {
            return Err(AppError::validation("日志状态和模块不能为空"));
        }
        let id = self.repo.insert(&entry).await?;
        debug!(
            user_id = entry.user_id.0,
            status = %entry.status,
            module = %entry.module,
            "History entry recorded"
        );
        Ok(id)
    }

    pub async fn logs(
        &self,
        filter: &HistoryFilter,
        pagination: Pagination,
    ) -> AppResult<PagedResult<HistoryEntry>> {
        let filter = normalize(filter);
        let items = self.repo.list(&filter, pagination).await?;
        let total = self.repo.count(&filter).await?;
        Ok(PagedResult::new(items, total, &pagination))
    }

    pub async fn count(&self, filter: &HistoryFilter) -> AppResult<u64> {
        self.repo.count(&normalize(filter)).await
    }

    pub async fn statuses(&self, user: Option<UserId>) -> AppResult<Vec<String>> {
        self.repo.distinct_statuses(user).await
    }

    pub async fn modules(&self, user: Option<UserId>) -> AppResult<Vec<String>> {
        self.repo.distinct_modules(user).await
    }
}

/// 空白条件视为未设置
fn normalize(filter: &HistoryFilter) -> HistoryFilter {
    HistoryFilter {
        user_id: filter.user_id,
        search: non_blank(filter.search.as_deref()),
        status: non_blank(filter.status.as_deref()),
        module: non_blank(filter.module.as_deref()),
        range: filter.range,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MockHistoryRepository;

    #[tokio::test]
    async fn test_blank_filters_are_dropped() {
        let mut repo = MockHistoryRepository::new();
        repo.expect_list()
            .withf(|f, p| f.status.is_none() && f.module.as_deref() == Some("Sales") && p.page == 2)
            .returning(|_, _| Ok(vec![]));
        repo.expect_count().returning(|_| Ok(11));

        let filter = HistoryFilter {
            status: Some("  ".into()),
            module: Some(" Sales ".into()),
            ..Default::default()
        };
        let page = HistoryHandler::new(Arc::new(repo))
            .logs(&filter, Pagination::new(2, 10))
            .await
            .unwrap();
        assert_eq!(page.total, 11);
        assert_eq!(page.total_pages(), 2);
    }

    #[tokio::test]
    async fn test_log_requires_status_and_module() {
        let mut repo = MockHistoryRepository::new();
        repo.expect_insert().never();
        let entry = NewHistoryEntry {
            user_id: UserId(1),
            status: "".into(),
            module: "Users".into(),
            description: "Created cashier".into(),
            ts: None,
        };
        assert!(HistoryHandler::new(Arc::new(repo)).log(entry).await.is_err());
    }
}
