//! 商品命令

use softwear_common::UserId;
use softwear_errors::{AppError, AppResult};

use super::{optional_text, required_name};
use crate::domain::entities::ProductDraft;
use crate::domain::value_objects::ProductImage;

const MAX_PRODUCT_NAME_LEN: usize = 200;

fn product_draft(
    name: &str,
    description: &Option<String>,
    category_id: i32,
    image: &Option<Vec<u8>>,
    image_content_type: &Option<String>,
) -> AppResult<ProductDraft> {
    let name = required_name("商品", name, MAX_PRODUCT_NAME_LEN)?;
    if category_id <= 0 {
        return Err(AppError::validation("请选择商品分类"));
    }

    Ok(ProductDraft {
        name,
        description: optional_text(description),
        category_id,
        image: ProductImage::from_parts(image.clone(), optional_text(image_content_type)),
    })
}

/// 创建商品
#[derive(Debug, Clone)]
pub struct CreateProductCommand {
    pub owner: UserId,
    pub name: String,
    pub description: Option<String>,
    pub category_id: i32,
    pub image: Option<Vec<u8>>,
    pub image_content_type: Option<String>,
}

impl CreateProductCommand {
    pub fn validate(&self) -> AppResult<()> {
        self.to_draft().map(|_| ())
    }

    pub fn to_draft(&self) -> AppResult<ProductDraft> {
        product_draft(
            &self.name,
            &self.description,
            self.category_id,
            &self.image,
            &self.image_content_type,
        )
    }
}

/// 修改商品，`image` 为空时保留原图
#[derive(Debug, Clone)]
pub struct UpdateProductCommand {
    pub owner: UserId,
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub category_id: i32,
    pub image: Option<Vec<u8>>,
    pub image_content_type: Option<String>,
}

impl UpdateProductCommand {
    pub fn validate(&self) -> AppResult<()> {
        self.to_draft().map(|_| ())
    }

    pub fn to_draft(&self) -> AppResult<ProductDraft> {
        product_draft(
            &self.name,
            &self.description,
            self.category_id,
            &self.image,
            &self.image_content_type,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(image: Option<Vec<u8>>) -> UpdateProductCommand {
        UpdateProductCommand {
            owner: UserId(3),
            id: 10,
            name: " Linen Shirt ".to_string(),
            description: None,
            category_id: 4,
            image,
            image_content_type: Some("image/png".to_string()),
        }
    }

    #[test]
    fn test_empty_image_keeps_existing() {
        let draft = update(Some(Vec::new())).to_draft().unwrap();
        assert_eq!(draft.name, "Linen Shirt");
        assert!(draft.image.is_none());
    }

    #[test]
    fn test_new_image_replaces() {
        let draft = update(Some(vec![1, 2, 3])).to_draft().unwrap();
        let image = draft.image.unwrap();
        assert_eq!(image.data, vec![1, 2, 3]);
        assert_eq!(image.content_type.as_deref(), Some("image/png"));
    }

    #[test]
    fn test_category_required() {
        let mut cmd = update(None);
        cmd.category_id = 0;
        assert!(cmd.validate().is_err());
    }
}
