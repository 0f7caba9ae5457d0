use serde::{Deserialize, Serialize};

/// 卖家自维护的三类基础属性，表结构相同，颜色多一个色值列
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeKind {
    Category,
    Color,
    Size,
}

impl AttributeKind {
    pub fn table(&self) -> &'static str {
        match self {
            Self::Category => "tbl_categories",
            Self::Color => "tbl_colors",
            Self::Size => "tbl_sizes",
        }
    }

    /// 用于日志与错误消息
    pub fn label(&self) -> &'static str {
        match self {
            Self::Category => "分类",
            Self::Color => "颜色",
            Self::Size => "尺码",
        }
    }

    pub fn has_hex_value(&self) -> bool {
        matches!(self, Self::Color)
    }

    /// 名称列长度上限
    pub fn max_name_len(&self) -> usize {
        match self {
            Self::Category | Self::Color => 100,
            Self::Size => 50,
        }
    }

    /// 参与模糊搜索的列
    pub fn search_columns(&self) -> &'static [&'static str] {
        match self {
            Self::Color => &["name", "hex_value", "description"],
            Self::Category | Self::Size => &["name", "description"],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_colors_carry_hex() {
        assert!(AttributeKind::Color.has_hex_value());
        assert!(!AttributeKind::Size.has_hex_value());
        assert!(AttributeKind::Color.search_columns().contains(&"hex_value"));
        assert!(!AttributeKind::Category.search_columns().contains(&"hex_value"));
    }

    #[test]
    fn test_tables() {
        assert_eq!(AttributeKind::Category.table(), "tbl_categories");
        assert_eq!(AttributeKind::Size.max_name_len(), 50);
    }
}
