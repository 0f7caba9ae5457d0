use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// 商品图片（原始字节 + MIME 类型）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductImage {
    pub data: Vec<u8>,
    pub content_type: Option<String>,
}

impl ProductImage {
    pub fn new(data: Vec<u8>, content_type: Option<String>) -> Self {
        Self { data, content_type }
    }

    /// 空字节视为没有图片
    pub fn from_parts(data: Option<Vec<u8>>, content_type: Option<String>) -> Option<Self> {
        data.filter(|d| !d.is_empty())
            .map(|data| Self::new(data, content_type))
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.data)
    }

    /// `data:` URI，缺少类型时按 image/jpeg 处理
    pub fn data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.content_type.as_deref().unwrap_or("image/jpeg"),
            self.to_base64()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_bytes_are_no_image() {
        assert!(ProductImage::from_parts(Some(Vec::new()), None).is_none());
        assert!(ProductImage::from_parts(None, Some("image/png".into())).is_none());
    }

    #[test]
    fn test_data_uri() {
        let image = ProductImage::new(b"hi".to_vec(), Some("image/png".into()));
        assert_eq!(image.to_base64(), "aGk=");
        assert_eq!(image.data_uri(), "data:image/png;base64,aGk=");
        let untyped = ProductImage::new(b"hi".to_vec(), None);
        assert!(untyped.data_uri().starts_with("data:image/jpeg;"));
    }
}
