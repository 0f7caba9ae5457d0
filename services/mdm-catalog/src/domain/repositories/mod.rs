//! 仓储接口

mod attribute_repository;
mod product_repository;
mod variant_repository;

pub use attribute_repository::*;
pub use product_repository::*;
pub use variant_repository::*;

use crate::domain::enums::RecordScope;

/// 列表过滤条件
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    /// 原始搜索词，仓储负责转成 ILIKE 模式
    pub search: Option<String>,
    pub scope: RecordScope,
}

impl ListFilter {
    pub fn new(search: Option<String>, scope: RecordScope) -> Self {
        Self { search, scope }
    }
}
