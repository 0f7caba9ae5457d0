//! 收据图片

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use softwear_errors::{AppError, AppResult};

const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";

/// 收据图片，保存 base64 文本
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReceiptImage {
    pub base64: String,
    pub content_type: String,
}

impl ReceiptImage {
    /// 校验 base64 内容；接受 `data:` URI
    pub fn parse(data: &str, content_type: Option<&str>) -> AppResult<Self> {
        let (uri_type, payload) = match data.trim().strip_prefix("data:") {
            Some(uri) => {
                let (meta, payload) = uri
                    .split_once(',')
                    .ok_or_else(|| AppError::validation("收据图片格式错误"))?;
                (meta.strip_suffix(";base64").map(str::to_string), payload)
            }
            None => (None, data.trim()),
        };

        let bytes = STANDARD
            .decode(payload)
            .map_err(|_| AppError::validation("收据图片不是有效的 base64"))?;
        if bytes.is_empty() {
            return Err(AppError::validation("收据图片为空"));
        }

        let content_type = content_type
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .or(uri_type)
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());
        if !content_type.starts_with("image/") {
            return Err(AppError::validation(format!("不支持的收据类型: {}", content_type)));
        }

        Ok(Self {
            base64: payload.to_string(),
            content_type,
        })
    }

    /// 从数据库列还原，缺少类型时按 JPEG 处理
    pub fn from_columns(base64: Option<String>, content_type: Option<String>) -> Option<Self> {
        base64.map(|base64| Self {
            base64,
            content_type: content_type.unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
        })
    }

    /// 拆成 (base64, content_type) 两列
    pub fn columns(receipt: Option<&Self>) -> (Option<&str>, Option<&str>) {
        match receipt {
            Some(r) => (Some(r.base64.as_str()), Some(r.content_type.as_str())),
            None => (None, None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receipt_from_data_uri() {
        let receipt = ReceiptImage::parse("data:image/png;base64,aGk=", None).unwrap();
        assert_eq!(receipt.base64, "aGk=");
        assert_eq!(receipt.content_type, "image/png");

        let plain = ReceiptImage::parse("aGk=", None).unwrap();
        assert_eq!(plain.content_type, "image/jpeg");
    }

    #[test]
    fn test_receipt_rejects_bad_input() {
        assert!(ReceiptImage::parse("not base64!", None).is_err());
        assert!(ReceiptImage::parse("", None).is_err());
        assert!(ReceiptImage::parse("aGk=", Some("application/pdf")).is_err());
    }

    #[test]
    fn test_columns_default_content_type() {
        let receipt = ReceiptImage::from_columns(Some("aGk=".to_string()), None).unwrap();
        assert_eq!(receipt.content_type, "image/jpeg");
        assert_eq!(ReceiptImage::columns(None), (None, None));
    }
}
