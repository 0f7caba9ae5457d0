use serde::{Deserialize, Serialize};

/// 软删除视图：在用记录或已归档记录
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordScope {
    #[default]
    Active,
    Archived,
}

impl RecordScope {
    /// `archived_at` 谓词，`alias` 为空时不加表前缀
    pub fn predicate(&self, alias: &str) -> String {
        let column = if alias.is_empty() {
            "archived_at".to_string()
        } else {
            format!("{}.archived_at", alias)
        };
        match self {
            Self::Active => format!("{} IS NULL", column),
            Self::Archived => format!("{} IS NOT NULL", column),
        }
    }

    pub fn status_label(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Archived => "Archived",
        }
    }
}
