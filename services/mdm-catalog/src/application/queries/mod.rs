//! 列表查询参数

use softwear_common::{Pagination, UserId};

use crate::domain::enums::RecordScope;
use crate::domain::repositories::ListFilter;

/// 分类、颜色、尺码、商品、款式共用的列表查询
#[derive(Debug, Clone, Default)]
pub struct CatalogListQuery {
    pub owner: UserId,
    pub search: Option<String>,
    pub scope: RecordScope,
    pub pagination: Pagination,
}

impl CatalogListQuery {
    pub fn active(owner: UserId) -> Self {
        Self {
            owner,
            ..Self::default()
        }
    }

    pub fn archived(owner: UserId) -> Self {
        Self {
            owner,
            scope: RecordScope::Archived,
            ..Self::default()
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_page(mut self, page: u32, page_size: u32) -> Self {
        self.pagination = Pagination::new(page, page_size);
        self
    }

    pub fn filter(&self) -> ListFilter {
        ListFilter::new(self.search.clone(), self.scope)
    }
}
