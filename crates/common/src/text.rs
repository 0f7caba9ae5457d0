//! 文本辅助函数：搜索模式与姓名拼接

/// 为 ILIKE 生成 `%term%` 模式，空白输入返回 None
pub fn search_pattern(term: Option<&str>) -> Option<String> {
    term.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| format!("%{}%", escape_like(t)))
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// 去除首尾空白，空串视为 None
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// 拼接全名，中间名为空时省略
pub fn full_name(first: &str, middle: Option<&str>, last: &str) -> String {
    [Some(first), middle, Some(last)]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// 显示名称：优先存储的 name，其次 名+姓，最后回退到邮箱
pub fn display_name(
    name: Option<&str>,
    first: Option<&str>,
    last: Option<&str>,
    email: &str,
) -> String {
    if let Some(name) = non_blank(name) {
        return name;
    }
    let joined = full_name(first.unwrap_or_default(), None, last.unwrap_or_default());
    if joined.is_empty() {
        email.trim().to_string()
    } else {
        joined
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_pattern() {
        assert_eq!(search_pattern(Some("  shirt ")), Some("%shirt%".to_string()));
        assert_eq!(search_pattern(Some("   ")), None);
        assert_eq!(search_pattern(None), None);
        assert_eq!(search_pattern(Some("50%")), Some("%50\\%%".to_string()));
    }

    #[test]
    fn test_full_name() {
        assert_eq!(full_name("Ana", None, "Cruz"), "Ana Cruz");
        assert_eq!(full_name("Ana", Some(" "), "Cruz"), "Ana Cruz");
        assert_eq!(full_name("Ana", Some("Reyes"), "Cruz"), "Ana Reyes Cruz");
    }

    #[test]
    fn test_display_name_fallbacks() {
        assert_eq!(display_name(Some("Store Owner"), None, None, "a@b.c"), "Store Owner");
        assert_eq!(display_name(Some(""), Some("Ana"), Some("Cruz"), "a@b.c"), "Ana Cruz");
        assert_eq!(display_name(None, None, Some(" "), " a@b.c "), "a@b.c");
    }
}
