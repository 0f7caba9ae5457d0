//! 商品主数据业务处理

use std::sync::Arc;

use softwear_common::{PagedResult, UserId};
use softwear_errors::{AppError, AppResult};
use tracing::{info, warn};

use crate::domain::entities::{
    AttributeOption, CatalogAttribute, Product, ProductOption, Variant, VariantDraft,
};
use crate::domain::enums::{AttributeKind, RecordScope};
use crate::domain::repositories::{AttributeRepository, ProductRepository, VariantRepository};

use super::commands::*;
use super::queries::CatalogListQuery;

pub struct ServiceHandler {
    attribute_repo: Arc<dyn AttributeRepository>,
    product_repo: Arc<dyn ProductRepository>,
    variant_repo: Arc<dyn VariantRepository>,
}

impl ServiceHandler {
    pub fn new(
        attribute_repo: Arc<dyn AttributeRepository>,
        product_repo: Arc<dyn ProductRepository>,
        variant_repo: Arc<dyn VariantRepository>,
    ) -> Self {
        Self {
            attribute_repo,
            product_repo,
            variant_repo,
        }
    }

    // ========== 分类 / 颜色 / 尺码 ==========

    pub async fn list_attributes(
        &self,
        kind: AttributeKind,
        query: &CatalogListQuery,
    ) -> AppResult<PagedResult<CatalogAttribute>> {
        let filter = query.filter();
        let items = self
            .attribute_repo
            .list(kind, query.owner, &filter, query.pagination)
            .await?;
        let total = self.attribute_repo.count(kind, query.owner, &filter).await?;
        Ok(PagedResult::new(items, total, &query.pagination))
    }

    pub async fn count_attributes(
        &self,
        kind: AttributeKind,
        query: &CatalogListQuery,
    ) -> AppResult<u64> {
        self.attribute_repo
            .count(kind, query.owner, &query.filter())
            .await
    }

    /// 详情；`scope` 区分在用与已归档
    pub async fn attribute_details(
        &self,
        kind: AttributeKind,
        owner: UserId,
        id: i32,
        scope: RecordScope,
    ) -> AppResult<Option<CatalogAttribute>> {
        self.attribute_repo.find(kind, owner, id, scope).await
    }

    pub async fn create_attribute(&self, cmd: CreateAttributeCommand) -> AppResult<i32> {
        let draft = cmd.to_draft()?;
        let id = self.attribute_repo.insert(cmd.kind, cmd.owner, &draft).await?;
        info!(kind = ?cmd.kind, id, owner = cmd.owner.0, "Catalog attribute created");
        Ok(id)
    }

    pub async fn update_attribute(&self, cmd: UpdateAttributeCommand) -> AppResult<()> {
        let draft = cmd.to_draft()?;
        let updated = self
            .attribute_repo
            .update(cmd.kind, cmd.owner, cmd.id, &draft)
            .await?;
        if !updated {
            return Err(not_found(cmd.kind.label(), cmd.id));
        }
        info!(kind = ?cmd.kind, id = cmd.id, "Catalog attribute updated");
        Ok(())
    }

    /// 归档；分类会连带归档其下商品与款式
    pub async fn archive_attribute(
        &self,
        kind: AttributeKind,
        owner: UserId,
        id: i32,
    ) -> AppResult<()> {
        if !self.attribute_repo.set_archived(kind, owner, id, true).await? {
            return Err(not_found(kind.label(), id));
        }
        info!(kind = ?kind, id, "Catalog attribute archived");
        Ok(())
    }

    pub async fn restore_attribute(
        &self,
        kind: AttributeKind,
        owner: UserId,
        id: i32,
    ) -> AppResult<()> {
        if !self.attribute_repo.set_archived(kind, owner, id, false).await? {
            return Err(AppError::not_found(format!(
                "已归档的{} {} 不存在",
                kind.label(),
                id
            )));
        }
        info!(kind = ?kind, id, "Catalog attribute restored");
        Ok(())
    }

    /// 下拉选项（在用记录，按名称排序）
    pub async fn attribute_options(
        &self,
        kind: AttributeKind,
        owner: UserId,
    ) -> AppResult<Vec<AttributeOption>> {
        self.attribute_repo.options(kind, owner).await
    }

    /// 商品录入可选的分类
    pub async fn active_categories(&self, owner: UserId) -> AppResult<Vec<AttributeOption>> {
        self.attribute_options(AttributeKind::Category, owner).await
    }

    // ========== 商品 ==========

    pub async fn list_products(&self, query: &CatalogListQuery) -> AppResult<PagedResult<Product>> {
        let filter = query.filter();
        let items = self
            .product_repo
            .list(query.owner, &filter, query.pagination)
            .await?;
        let total = self.product_repo.count(query.owner, &filter).await?;
        Ok(PagedResult::new(items, total, &query.pagination))
    }

    pub async fn count_products(&self, query: &CatalogListQuery) -> AppResult<u64> {
        self.product_repo.count(query.owner, &query.filter()).await
    }

    pub async fn product_details(
        &self,
        owner: UserId,
        id: i32,
        scope: RecordScope,
    ) -> AppResult<Option<Product>> {
        self.product_repo.find(owner, id, scope).await
    }

    pub async fn create_product(&self, cmd: CreateProductCommand) -> AppResult<i32> {
        let draft = cmd.to_draft()?;
        self.ensure_active_category(cmd.owner, draft.category_id)
            .await?;
        let id = self.product_repo.insert(cmd.owner, &draft).await?;
        info!(id, owner = cmd.owner.0, has_image = draft.image.is_some(), "Product created");
        Ok(id)
    }

    pub async fn update_product(&self, cmd: UpdateProductCommand) -> AppResult<()> {
        let draft = cmd.to_draft()?;
        self.ensure_active_category(cmd.owner, draft.category_id)
            .await?;
        if !self.product_repo.update(cmd.owner, cmd.id, &draft).await? {
            return Err(not_found("商品", cmd.id));
        }
        info!(id = cmd.id, image_replaced = draft.image.is_some(), "Product updated");
        Ok(())
    }

    /// 归档商品及其款式
    pub async fn archive_product(&self, owner: UserId, id: i32) -> AppResult<()> {
        if !self.product_repo.set_archived(owner, id, true).await? {
            return Err(not_found("商品", id));
        }
        info!(id, "Product archived");
        Ok(())
    }

    pub async fn restore_product(&self, owner: UserId, id: i32) -> AppResult<()> {
        if !self.product_repo.set_archived(owner, id, false).await? {
            return Err(AppError::not_found(format!("已归档的商品 {} 不存在", id)));
        }
        info!(id, "Product restored");
        Ok(())
    }

    // ========== 款式 ==========

    pub async fn list_variants(&self, query: &CatalogListQuery) -> AppResult<PagedResult<Variant>> {
        let filter = query.filter();
        let items = self
            .variant_repo
            .list(query.owner, &filter, query.pagination)
            .await?;
        let total = self.variant_repo.count(query.owner, &filter).await?;
        Ok(PagedResult::new(items, total, &query.pagination))
    }

    pub async fn count_variants(&self, query: &CatalogListQuery) -> AppResult<u64> {
        self.variant_repo.count(query.owner, &query.filter()).await
    }

    pub async fn variant_details(
        &self,
        owner: UserId,
        id: i32,
        scope: RecordScope,
    ) -> AppResult<Option<Variant>> {
        self.variant_repo.find(owner, id, scope).await
    }

    pub async fn create_variant(&self, cmd: CreateVariantCommand) -> AppResult<i32> {
        let draft = cmd.to_draft()?;
        self.ensure_variant_references(cmd.owner, &draft).await?;
        let id = self.variant_repo.insert(cmd.owner, &draft).await?;
        info!(
            id,
            product_id = draft.product_id,
            sizes = draft.size_ids.len(),
            colors = draft.color_ids.len(),
            "Variant created"
        );
        Ok(id)
    }

    pub async fn update_variant(&self, cmd: UpdateVariantCommand) -> AppResult<()> {
        let draft = cmd.to_draft()?;
        self.ensure_variant_references(cmd.owner, &draft).await?;
        if !self.variant_repo.update(cmd.owner, cmd.id, &draft).await? {
            return Err(not_found("款式", cmd.id));
        }
        info!(id = cmd.id, "Variant updated");
        Ok(())
    }

    pub async fn archive_variant(&self, owner: UserId, id: i32) -> AppResult<()> {
        if !self.variant_repo.set_archived(owner, id, true).await? {
            return Err(not_found("款式", id));
        }
        info!(id, "Variant archived");
        Ok(())
    }

    pub async fn restore_variant(&self, owner: UserId, id: i32) -> AppResult<()> {
        if !self.variant_repo.set_archived(owner, id, false).await? {
            return Err(AppError::not_found(format!("已归档的款式 {} 不存在", id)));
        }
        info!(id, "Variant restored");
        Ok(())
    }

    /// 款式录入可选的商品
    pub async fn active_products(&self, owner: UserId) -> AppResult<Vec<ProductOption>> {
        self.variant_repo.active_products(owner).await
    }

    // ========== 引用校验 ==========

    async fn ensure_active_category(&self, owner: UserId, category_id: i32) -> AppResult<()> {
        let category = self
            .attribute_repo
            .find(AttributeKind::Category, owner, category_id, RecordScope::Active)
            .await?;
        if category.is_none() {
            warn!(owner = owner.0, category_id, "Category not usable for product");
            return Err(AppError::validation(format!(
                "分类 {} 不存在或已归档",
                category_id
            )));
        }
        Ok(())
    }

    /// 商品须在用；尺码、颜色须属于同一卖家且在用
    async fn ensure_variant_references(&self, owner: UserId, draft: &VariantDraft) -> AppResult<()> {
        let product = self
            .product_repo
            .find(owner, draft.product_id, RecordScope::Active)
            .await?;
        if product.is_none() {
            return Err(AppError::validation(format!(
                "商品 {} 不存在或已归档",
                draft.product_id
            )));
        }

        for (kind, ids) in [
            (AttributeKind::Size, &draft.size_ids),
            (AttributeKind::Color, &draft.color_ids),
        ] {
            if ids.is_empty() {
                continue;
            }
            let options = self.attribute_repo.options(kind, owner).await?;
            if let Some(missing) = ids.iter().find(|id| !options.iter().any(|o| o.id == **id)) {
                return Err(AppError::validation(format!(
                    "{} {} 不存在或已归档",
                    kind.label(),
                    missing
                )));
            }
        }
        Ok(())
    }
}

fn not_found(label: &str, id: i32) -> AppError {
    AppError::not_found(format!("{} {} 不存在或已归档", label, id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mockall::predicate::*;
    use rust_decimal::Decimal;
    use softwear_common::Pagination;

    use crate::domain::repositories::{
        MockAttributeRepository, MockProductRepository, MockVariantRepository,
    };

    const OWNER: UserId = UserId(5);

    fn handler(
        attributes: MockAttributeRepository,
        products: MockProductRepository,
        variants: MockVariantRepository,
    ) -> ServiceHandler {
        ServiceHandler::new(Arc::new(attributes), Arc::new(products), Arc::new(variants))
    }

    fn category(id: i32) -> CatalogAttribute {
        CatalogAttribute {
            id,
            kind: AttributeKind::Category,
            name: "Tops".to_string(),
            hex_value: None,
            description: None,
            created_at: Utc::now(),
            updated_at: None,
            archived_at: None,
        }
    }

    fn product(id: i32) -> Product {
        Product {
            id,
            name: "Tee".to_string(),
            description: None,
            category_id: 1,
            category_name: "Tops".to_string(),
            status: "Active".to_string(),
            image: None,
            created_at: Utc::now(),
            archived_at: None,
        }
    }

    fn option(id: i32, name: &str) -> AttributeOption {
        AttributeOption {
            id,
            name: name.to_string(),
            hex_value: None,
        }
    }

    fn variant_cmd(size_ids: Vec<i32>, color_ids: Vec<i32>) -> CreateVariantCommand {
        CreateVariantCommand {
            owner: OWNER,
            name: "Regular".to_string(),
            price: Decimal::new(49900, 2),
            cost_price: Some(Decimal::new(25000, 2)),
            product_id: 9,
            size_ids,
            color_ids,
        }
    }

    #[tokio::test]
    async fn test_list_attributes_combines_page_and_total() {
        let mut attributes = MockAttributeRepository::new();
        attributes
            .expect_list()
            .withf(|kind, owner, filter, pagination| {
                *kind == AttributeKind::Color
                    && *owner == OWNER
                    && filter.search.as_deref() == Some("red")
                    && filter.scope == RecordScope::Archived
                    && *pagination == Pagination::new(2, 5)
            })
            .returning(|_, _, _, _| Ok(vec![]));
        attributes
            .expect_count()
            .returning(|_, _, _| Ok(11));

        let query = CatalogListQuery::archived(OWNER)
            .with_search("red")
            .with_page(2, 5);
        let page = handler(
            attributes,
            MockProductRepository::new(),
            MockVariantRepository::new(),
        )
        .list_attributes(AttributeKind::Color, &query)
        .await
        .unwrap();

        assert_eq!(page.total, 11);
        assert_eq!(page.total_pages(), 3);
    }

    #[tokio::test]
    async fn test_create_color_stores_normalized_hex() {
        let mut attributes = MockAttributeRepository::new();
        attributes
            .expect_insert()
            .withf(|kind, owner, draft| {
                *kind == AttributeKind::Color
                    && *owner == OWNER
                    && draft.name == "Navy"
                    && draft.hex_value.as_deref() == Some("#000080")
            })
            .times(1)
            .returning(|_, _, _| Ok(21));

        let id = handler(
            attributes,
            MockProductRepository::new(),
            MockVariantRepository::new(),
        )
        .create_attribute(CreateAttributeCommand {
            kind: AttributeKind::Color,
            owner: OWNER,
            name: " Navy ".to_string(),
            hex_value: Some("#000080".to_string()),
            description: None,
        })
        .await
        .unwrap();

        assert_eq!(id, 21);
    }

    #[tokio::test]
    async fn test_invalid_command_never_reaches_repository() {
        let mut attributes = MockAttributeRepository::new();
        attributes.expect_insert().never();

        let err = handler(
            attributes,
            MockProductRepository::new(),
            MockVariantRepository::new(),
        )
        .create_attribute(CreateAttributeCommand {
            kind: AttributeKind::Color,
            owner: OWNER,
            name: "Navy".to_string(),
            hex_value: Some("navy".to_string()),
            description: None,
        })
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_archive_missing_category_is_not_found() {
        let mut attributes = MockAttributeRepository::new();
        attributes
            .expect_set_archived()
            .with(eq(AttributeKind::Category), eq(OWNER), eq(4), eq(true))
            .returning(|_, _, _, _| Ok(false));

        let err = handler(
            attributes,
            MockProductRepository::new(),
            MockVariantRepository::new(),
        )
        .archive_attribute(AttributeKind::Category, OWNER, 4)
        .await
        .unwrap_err();

        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn test_create_product_requires_active_category() {
        let mut attributes = MockAttributeRepository::new();
        attributes
            .expect_find()
            .with(
                eq(AttributeKind::Category),
                eq(OWNER),
                eq(3),
                eq(RecordScope::Active),
            )
            .returning(|_, _, _, _| Ok(None));
        let mut products = MockProductRepository::new();
        products.expect_insert().never();

        let err = handler(attributes, products, MockVariantRepository::new())
            .create_product(CreateProductCommand {
                owner: OWNER,
                name: "Tee".to_string(),
                description: None,
                category_id: 3,
                image: None,
                image_content_type: None,
            })
            .await
            .unwrap_err();

        assert!(err.to_string().contains("分类 3"));
    }

    #[tokio::test]
    async fn test_update_product_without_image_keeps_existing() {
        let mut attributes = MockAttributeRepository::new();
        attributes
            .expect_find()
            .returning(|_, _, id, _| Ok(Some(category(id))));
        let mut products = MockProductRepository::new();
        products
            .expect_update()
            .withf(|owner, id, draft| *owner == OWNER && *id == 12 && draft.image.is_none())
            .returning(|_, _, _| Ok(true));

        handler(attributes, products, MockVariantRepository::new())
            .update_product(UpdateProductCommand {
                owner: OWNER,
                id: 12,
                name: "Tee".to_string(),
                description: Some("Cotton".to_string()),
                category_id: 1,
                image: None,
                image_content_type: None,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_create_variant_rejects_foreign_size() {
        let mut products = MockProductRepository::new();
        products
            .expect_find()
            .returning(|_, id, _| Ok(Some(product(id))));
        let mut attributes = MockAttributeRepository::new();
        attributes
            .expect_options()
            .with(eq(AttributeKind::Size), eq(OWNER))
            .returning(|_, _| Ok(vec![option(1, "S"), option(2, "M")]));
        let mut variants = MockVariantRepository::new();
        variants.expect_insert().never();

        let err = handler(attributes, products, variants)
            .create_variant(variant_cmd(vec![2, 7], vec![]))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("尺码 7"));
    }

    #[tokio::test]
    async fn test_create_variant_with_associations() {
        let mut products = MockProductRepository::new();
        products
            .expect_find()
            .with(eq(OWNER), eq(9), eq(RecordScope::Active))
            .returning(|_, id, _| Ok(Some(product(id))));
        let mut attributes = MockAttributeRepository::new();
        attributes
            .expect_options()
            .with(eq(AttributeKind::Size), eq(OWNER))
            .returning(|_, _| Ok(vec![option(1, "S"), option(2, "M")]));
        attributes
            .expect_options()
            .with(eq(AttributeKind::Color), eq(OWNER))
            .returning(|_, _| Ok(vec![option(4, "Black")]));
        let mut variants = MockVariantRepository::new();
        variants
            .expect_insert()
            .withf(|_, draft| draft.size_ids == vec![1, 2] && draft.color_ids == vec![4])
            .returning(|_, _| Ok(30));

        let id = handler(attributes, products, variants)
            .create_variant(variant_cmd(vec![2, 1, 2], vec![4]))
            .await
            .unwrap();

        assert_eq!(id, 30);
    }

    #[tokio::test]
    async fn test_create_variant_for_archived_product_fails() {
        let mut products = MockProductRepository::new();
        products.expect_find().returning(|_, _, _| Ok(None));
        let mut variants = MockVariantRepository::new();
        variants.expect_insert().never();

        let err = handler(MockAttributeRepository::new(), products, variants)
            .create_variant(variant_cmd(vec![], vec![]))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_restore_variant_not_archived() {
        let mut variants = MockVariantRepository::new();
        variants
            .expect_set_archived()
            .with(eq(OWNER), eq(3), eq(false))
            .returning(|_, _, _| Ok(false));

        let err = handler(
            MockAttributeRepository::new(),
            MockProductRepository::new(),
            variants,
        )
        .restore_variant(OWNER, 3)
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
    }
}
