use std::fmt;

use softwear_errors::{AppError, AppResult};

/// `#RRGGBB` 色值，统一存为大写
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HexColor(String);

impl HexColor {
    pub fn parse(value: &str) -> AppResult<Self> {
        let value = value.trim();
        let digits = value
            .strip_prefix('#')
            .filter(|d| d.len() == 6 && d.chars().all(|c| c.is_ascii_hexdigit()));
        match digits {
            Some(digits) => Ok(Self(format!("#{}", digits.to_ascii_uppercase()))),
            None => Err(AppError::validation(format!(
                "颜色值必须为 #RRGGBB 格式: '{}'",
                value
            ))),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes_case() {
        assert_eq!(HexColor::parse(" #1a2b3c ").unwrap().as_str(), "#1A2B3C");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["1A2B3C", "#1A2B3", "#1A2B3CD", "#GGGGGG", ""] {
            assert!(HexColor::parse(bad).is_err(), "{bad} should be rejected");
        }
    }
}
