//! PostgreSQL 仓储实现

use async_trait::async_trait;
use softwear_adapter_postgres::{TransactionManager, db_error, push_page, push_search, to_count};
use softwear_common::{Pagination, UserId};
use softwear_errors::AppResult;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;

use crate::domain::entities::{
    AttributeDraft, AttributeOption, CatalogAttribute, Product, ProductDraft, ProductOption,
    Variant, VariantDraft,
};
use crate::domain::enums::{AttributeKind, RecordScope};
use crate::domain::repositories::{
    AttributeRepository, ListFilter, ProductRepository, VariantRepository,
};

use super::converters::{
    attribute_from_row, option_from_row, product_from_row, product_option_from_row,
    variants_from_rows,
};
use super::rows::{
    AttributeOptionRow, AttributeRow, ProductOptionRow, ProductRow, VariantColorRow, VariantRow,
    VariantSizeRow,
};

/// 活动视图按创建时间、归档视图按归档时间倒序
fn order_clause(scope: RecordScope, alias: &str) -> String {
    let prefix = if alias.is_empty() {
        String::new()
    } else {
        format!("{}.", alias)
    };
    match scope {
        RecordScope::Active => format!(" ORDER BY {p}created_at DESC, {p}id DESC", p = prefix),
        RecordScope::Archived => format!(" ORDER BY {p}archived_at DESC, {p}id DESC", p = prefix),
    }
}

// ====== 分类 / 颜色 / 尺码 ======

pub struct PostgresAttributeRepository {
    pool: PgPool,
    tx_manager: TransactionManager,
}

impl PostgresAttributeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            tx_manager: TransactionManager::new(pool.clone()),
            pool,
        }
    }

    fn hex_column(kind: AttributeKind) -> &'static str {
        if kind.has_hex_value() {
            "hex_value"
        } else {
            "NULL::varchar AS hex_value"
        }
    }

    fn push_conditions(
        qb: &mut QueryBuilder<'_, Postgres>,
        kind: AttributeKind,
        owner: UserId,
        filter: &ListFilter,
    ) {
        qb.push(" WHERE user_id = ").push_bind(owner.0);
        qb.push(" AND ").push(filter.scope.predicate(""));
        push_search(qb, kind.search_columns(), filter.search.as_deref());
    }

    /// 分类归档/恢复时连带商品与款式
    async fn cascade_category(
        tx: &mut sqlx::Transaction<'static, Postgres>,
        owner: UserId,
        category_id: i32,
        archived: bool,
    ) -> AppResult<()> {
        let (product_sql, variant_sql) = if archived {
            (
                r#"
                UPDATE tbl_products
                SET archived_at = NOW(), status = 'Archived', updated_at = NOW()
                WHERE category_id = $1 AND user_id = $2 AND archived_at IS NULL
                "#,
                r#"
                UPDATE tbl_variants
                SET archived_at = NOW(), updated_at = NOW()
                WHERE product_id IN (
                    SELECT id FROM tbl_products WHERE category_id = $1 AND user_id = $2
                ) AND user_id = $2 AND archived_at IS NULL
                "#,
            )
        } else {
            (
                r#"
                UPDATE tbl_products
                SET archived_at = NULL, status = 'Active', updated_at = NOW()
                WHERE category_id = $1 AND user_id = $2 AND archived_at IS NOT NULL
                "#,
                r#"
                UPDATE tbl_variants
                SET archived_at = NULL, updated_at = NOW()
                WHERE product_id IN (
                    SELECT id FROM tbl_products WHERE category_id = $1 AND user_id = $2
                ) AND user_id = $2 AND archived_at IS NOT NULL
                "#,
            )
        };

        let products = sqlx::query(product_sql)
            .bind(category_id)
            .bind(owner.0)
            .execute(&mut **tx)
            .await
            .map_err(db_error("级联更新商品"))?;
        let variants = sqlx::query(variant_sql)
            .bind(category_id)
            .bind(owner.0)
            .execute(&mut **tx)
            .await
            .map_err(db_error("级联更新款式"))?;

        debug!(
            category_id,
            archived,
            products = products.rows_affected(),
            variants = variants.rows_affected(),
            "Category cascade applied"
        );
        Ok(())
    }
}

#[async_trait]
impl AttributeRepository for PostgresAttributeRepository {
    async fn list(
        &self,
        kind: AttributeKind,
        owner: UserId,
        filter: &ListFilter,
        pagination: Pagination,
    ) -> AppResult<Vec<CatalogAttribute>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT id, name, {}, description, created_at, updated_at, archived_at FROM {}",
            Self::hex_column(kind),
            kind.table()
        ));
        Self::push_conditions(&mut qb, kind, owner, filter);
        qb.push(order_clause(filter.scope, ""));
        push_page(&mut qb, pagination);

        let rows = qb
            .build_query_as::<AttributeRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error(format!("查询{}列表", kind.label())))?;

        Ok(rows
            .into_iter()
            .map(|row| attribute_from_row(kind, row))
            .collect())
    }

    async fn count(
        &self,
        kind: AttributeKind,
        owner: UserId,
        filter: &ListFilter,
    ) -> AppResult<u64> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT COUNT(*) FROM {}", kind.table()));
        Self::push_conditions(&mut qb, kind, owner, filter);

        let total: i64 = qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(db_error(format!("统计{}数量", kind.label())))?;
        Ok(to_count(total))
    }

    async fn find(
        &self,
        kind: AttributeKind,
        owner: UserId,
        id: i32,
        scope: RecordScope,
    ) -> AppResult<Option<CatalogAttribute>> {
        let sql = format!(
            "SELECT id, name, {}, description, created_at, updated_at, archived_at \
             FROM {} WHERE id = $1 AND user_id = $2 AND {}",
            Self::hex_column(kind),
            kind.table(),
            scope.predicate("")
        );

        let row = sqlx::query_as::<_, AttributeRow>(&sql)
            .bind(id)
            .bind(owner.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error(format!("查询{}详情", kind.label())))?;

        Ok(row.map(|row| attribute_from_row(kind, row)))
    }

    async fn insert(
        &self,
        kind: AttributeKind,
        owner: UserId,
        draft: &AttributeDraft,
    ) -> AppResult<i32> {
        let inserted = if kind.has_hex_value() {
            sqlx::query_scalar::<_, i32>(
                r#"
                INSERT INTO tbl_colors (user_id, name, hex_value, description, created_at)
                VALUES ($1, $2, $3, $4, NOW())
                RETURNING id
                "#,
            )
            .bind(owner.0)
            .bind(&draft.name)
            .bind(draft.hex_value.as_deref().unwrap_or_default())
            .bind(&draft.description)
            .fetch_one(&self.pool)
            .await
        } else {
            // 分类与尺码表结构相同，表名来自枚举常量
            let sql = format!(
                "INSERT INTO {} (user_id, name, description, created_at) \
                 VALUES ($1, $2, $3, NOW()) RETURNING id",
                kind.table()
            );
            sqlx::query_scalar::<_, i32>(&sql)
                .bind(owner.0)
                .bind(&draft.name)
                .bind(&draft.description)
                .fetch_one(&self.pool)
                .await
        };

        inserted.map_err(db_error(format!("创建{}", kind.label())))
    }

    async fn update(
        &self,
        kind: AttributeKind,
        owner: UserId,
        id: i32,
        draft: &AttributeDraft,
    ) -> AppResult<bool> {
        let result = if kind.has_hex_value() {
            sqlx::query(
                r#"
                UPDATE tbl_colors
                SET name = $1, hex_value = $2, description = $3, updated_at = NOW()
                WHERE id = $4 AND user_id = $5 AND archived_at IS NULL
                "#,
            )
            .bind(&draft.name)
            .bind(draft.hex_value.as_deref().unwrap_or_default())
            .bind(&draft.description)
            .bind(id)
            .bind(owner.0)
            .execute(&self.pool)
            .await
        } else {
            let sql = format!(
                "UPDATE {} SET name = $1, description = $2, updated_at = NOW() \
                 WHERE id = $3 AND user_id = $4 AND archived_at IS NULL",
                kind.table()
            );
            sqlx::query(&sql)
                .bind(&draft.name)
                .bind(&draft.description)
                .bind(id)
                .bind(owner.0)
                .execute(&self.pool)
                .await
        }
        .map_err(db_error(format!("更新{}", kind.label())))?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_archived(
        &self,
        kind: AttributeKind,
        owner: UserId,
        id: i32,
        archived: bool,
    ) -> AppResult<bool> {
        let (assignment, current) = if archived {
            ("archived_at = NOW()", RecordScope::Active)
        } else {
            ("archived_at = NULL", RecordScope::Archived)
        };
        let sql = format!(
            "UPDATE {} SET {}, updated_at = NOW() WHERE id = $1 AND user_id = $2 AND {}",
            kind.table(),
            assignment,
            current.predicate("")
        );

        let mut tx = self.tx_manager.begin().await?;
        let result = sqlx::query(&sql)
            .bind(id)
            .bind(owner.0)
            .execute(&mut *tx)
            .await
            .map_err(db_error(format!("归档/恢复{}", kind.label())))?;

        if result.rows_affected() == 0 {
            TransactionManager::rollback(tx).await?;
            return Ok(false);
        }

        if kind == AttributeKind::Category {
            Self::cascade_category(&mut tx, owner, id, archived).await?;
        }

        TransactionManager::commit(tx).await?;
        Ok(true)
    }

    async fn options(&self, kind: AttributeKind, owner: UserId) -> AppResult<Vec<AttributeOption>> {
        let sql = format!(
            "SELECT id, name, {} FROM {} WHERE user_id = $1 AND archived_at IS NULL ORDER BY name",
            Self::hex_column(kind),
            kind.table()
        );

        let rows = sqlx::query_as::<_, AttributeOptionRow>(&sql)
            .bind(owner.0)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error(format!("查询{}选项", kind.label())))?;

        Ok(rows.into_iter().map(option_from_row).collect())
    }
}

// ====== 商品 ======

const PRODUCT_COLUMNS: &str = r#"
    SELECT p.id, p.name, p.description, c.id AS category_id, c.name AS category_name,
           p.status, p.image, p.image_content_type, p.created_at, p.archived_at
    FROM tbl_products p
    INNER JOIN tbl_categories c ON p.category_id = c.id
"#;

const PRODUCT_SEARCH_COLUMNS: &[&str] = &["p.name", "p.description", "c.name"];

pub struct PostgresProductRepository {
    pool: PgPool,
    tx_manager: TransactionManager,
}

impl PostgresProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            tx_manager: TransactionManager::new(pool.clone()),
            pool,
        }
    }

    fn push_conditions(qb: &mut QueryBuilder<'_, Postgres>, owner: UserId, filter: &ListFilter) {
        qb.push(" WHERE p.user_id = ").push_bind(owner.0);
        qb.push(" AND ").push(filter.scope.predicate("p"));
        push_search(qb, PRODUCT_SEARCH_COLUMNS, filter.search.as_deref());
    }
}

#[async_trait]
impl ProductRepository for PostgresProductRepository {
    async fn list(
        &self,
        owner: UserId,
        filter: &ListFilter,
        pagination: Pagination,
    ) -> AppResult<Vec<Product>> {
        let mut qb = QueryBuilder::<Postgres>::new(PRODUCT_COLUMNS);
        Self::push_conditions(&mut qb, owner, filter);
        qb.push(order_clause(filter.scope, "p"));
        push_page(&mut qb, pagination);

        let rows = qb
            .build_query_as::<ProductRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("查询商品列表"))?;

        Ok(rows.into_iter().map(product_from_row).collect())
    }

    async fn count(&self, owner: UserId, filter: &ListFilter) -> AppResult<u64> {
        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM tbl_products p INNER JOIN tbl_categories c ON p.category_id = c.id",
        );
        Self::push_conditions(&mut qb, owner, filter);

        let total: i64 = qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("统计商品数量"))?;
        Ok(to_count(total))
    }

    async fn find(&self, owner: UserId, id: i32, scope: RecordScope) -> AppResult<Option<Product>> {
        let sql = format!(
            "{} WHERE p.id = $1 AND p.user_id = $2 AND {}",
            PRODUCT_COLUMNS,
            scope.predicate("p")
        );

        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .bind(owner.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("查询商品详情"))?;

        Ok(row.map(product_from_row))
    }

    async fn insert(&self, owner: UserId, draft: &ProductDraft) -> AppResult<i32> {
        let (image, content_type) = match &draft.image {
            Some(image) => (Some(image.data.as_slice()), image.content_type.as_deref()),
            None => (None, None),
        };

        sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO tbl_products
                (user_id, name, description, category_id, image, image_content_type, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, 'Active', NOW())
            RETURNING id
            "#,
        )
        .bind(owner.0)
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(draft.category_id)
        .bind(image)
        .bind(content_type)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("创建商品"))
    }

    async fn update(&self, owner: UserId, id: i32, draft: &ProductDraft) -> AppResult<bool> {
        let result = match &draft.image {
            Some(image) => {
                sqlx::query(
                    r#"
                    UPDATE tbl_products
                    SET name = $1, description = $2, category_id = $3,
                        image = $4, image_content_type = $5, updated_at = NOW()
                    WHERE id = $6 AND user_id = $7 AND archived_at IS NULL
                    "#,
                )
                .bind(&draft.name)
                .bind(&draft.description)
                .bind(draft.category_id)
                .bind(image.data.as_slice())
                .bind(image.content_type.as_deref())
                .bind(id)
                .bind(owner.0)
                .execute(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    r#"
                    UPDATE tbl_products
                    SET name = $1, description = $2, category_id = $3, updated_at = NOW()
                    WHERE id = $4 AND user_id = $5 AND archived_at IS NULL
                    "#,
                )
                .bind(&draft.name)
                .bind(&draft.description)
                .bind(draft.category_id)
                .bind(id)
                .bind(owner.0)
                .execute(&self.pool)
                .await
            }
        }
        .map_err(db_error("更新商品"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_archived(&self, owner: UserId, id: i32, archived: bool) -> AppResult<bool> {
        let (product_sql, variant_sql) = if archived {
            (
                r#"
                UPDATE tbl_products
                SET archived_at = NOW(), status = 'Archived', updated_at = NOW()
                WHERE id = $1 AND user_id = $2 AND archived_at IS NULL
                "#,
                r#"
                UPDATE tbl_variants
                SET archived_at = NOW(), updated_at = NOW()
                WHERE product_id = $1 AND user_id = $2 AND archived_at IS NULL
                "#,
            )
        } else {
            (
                r#"
                UPDATE tbl_products
                SET archived_at = NULL, status = 'Active', updated_at = NOW()
                WHERE id = $1 AND user_id = $2 AND archived_at IS NOT NULL
                "#,
                r#"
                UPDATE tbl_variants
                SET archived_at = NULL, updated_at = NOW()
                WHERE product_id = $1 AND user_id = $2 AND archived_at IS NOT NULL
                "#,
            )
        };

        let mut tx = self.tx_manager.begin().await?;
        let result = sqlx::query(product_sql)
            .bind(id)
            .bind(owner.0)
            .execute(&mut *tx)
            .await
            .map_err(db_error("归档/恢复商品"))?;

        if result.rows_affected() == 0 {
            TransactionManager::rollback(tx).await?;
            return Ok(false);
        }

        sqlx::query(variant_sql)
            .bind(id)
            .bind(owner.0)
            .execute(&mut *tx)
            .await
            .map_err(db_error("级联更新款式"))?;

        TransactionManager::commit(tx).await?;
        Ok(true)
    }
}

// ====== 款式 ======

const VARIANT_COLUMNS: &str = r#"
    SELECT v.id, v.name, v.price, v.cost_price, v.product_id, p.name AS product_name,
           p.image AS product_image, p.image_content_type AS product_image_content_type,
           v.created_at, v.archived_at
    FROM tbl_variants v
    INNER JOIN tbl_products p ON v.product_id = p.id
"#;

const VARIANT_SEARCH_COLUMNS: &[&str] = &["v.name", "p.name"];

pub struct PostgresVariantRepository {
    pool: PgPool,
    tx_manager: TransactionManager,
}

impl PostgresVariantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            tx_manager: TransactionManager::new(pool.clone()),
            pool,
        }
    }

    fn push_conditions(qb: &mut QueryBuilder<'_, Postgres>, owner: UserId, filter: &ListFilter) {
        qb.push(" WHERE v.user_id = ").push_bind(owner.0);
        qb.push(" AND ").push(filter.scope.predicate("v"));
        push_search(qb, VARIANT_SEARCH_COLUMNS, filter.search.as_deref());
    }

    /// 一次取回多个款式的尺码与颜色
    async fn load_associations(&self, rows: Vec<VariantRow>) -> AppResult<Vec<Variant>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();

        let sizes = sqlx::query_as::<_, VariantSizeRow>(
            r#"
            SELECT vs.variant_id, s.id, s.name
            FROM tbl_variant_sizes vs
            INNER JOIN tbl_sizes s ON vs.size_id = s.id
            WHERE vs.variant_id = ANY($1)
            ORDER BY vs.variant_id, s.name
            "#,
        )
        .bind(ids.as_slice())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("查询款式尺码"))?;

        let colors = sqlx::query_as::<_, VariantColorRow>(
            r#"
            SELECT vc.variant_id, c.id, c.name, c.hex_value
            FROM tbl_variant_colors vc
            INNER JOIN tbl_colors c ON vc.color_id = c.id
            WHERE vc.variant_id = ANY($1)
            ORDER BY vc.variant_id, c.name
            "#,
        )
        .bind(ids.as_slice())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("查询款式颜色"))?;

        Ok(variants_from_rows(rows, sizes, colors))
    }

    async fn replace_associations(
        tx: &mut sqlx::Transaction<'static, Postgres>,
        variant_id: i32,
        draft: &VariantDraft,
    ) -> AppResult<()> {
        sqlx::query("DELETE FROM tbl_variant_sizes WHERE variant_id = $1")
            .bind(variant_id)
            .execute(&mut **tx)
            .await
            .map_err(db_error("清除款式尺码"))?;
        sqlx::query("DELETE FROM tbl_variant_colors WHERE variant_id = $1")
            .bind(variant_id)
            .execute(&mut **tx)
            .await
            .map_err(db_error("清除款式颜色"))?;

        if !draft.size_ids.is_empty() {
            sqlx::query(
                r#"
                INSERT INTO tbl_variant_sizes (variant_id, size_id, created_at)
                SELECT $1, UNNEST($2::int[]), NOW()
                "#,
            )
            .bind(variant_id)
            .bind(draft.size_ids.as_slice())
            .execute(&mut **tx)
            .await
            .map_err(db_error("写入款式尺码"))?;
        }

        if !draft.color_ids.is_empty() {
            sqlx::query(
                r#"
                INSERT INTO tbl_variant_colors (variant_id, color_id, created_at)
                SELECT $1, UNNEST($2::int[]), NOW()
                "#,
            )
            .bind(variant_id)
            .bind(draft.color_ids.as_slice())
            .execute(&mut **tx)
            .await
            .map_err(db_error("写入款式颜色"))?;
        }

        Ok(())
    }
}

#[async_trait]
impl VariantRepository for PostgresVariantRepository {
    async fn list(
        &self,
        owner: UserId,
        filter: &ListFilter,
        pagination: Pagination,
    ) -> AppResult<Vec<Variant>> {
        let mut qb = QueryBuilder::<Postgres>::new(VARIANT_COLUMNS);
        Self::push_conditions(&mut qb, owner, filter);
        qb.push(order_clause(filter.scope, "v"));
        push_page(&mut qb, pagination);

        let rows = qb
            .build_query_as::<VariantRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("查询款式列表"))?;

        self.load_associations(rows).await
    }

    async fn count(&self, owner: UserId, filter: &ListFilter) -> AppResult<u64> {
        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM tbl_variants v INNER JOIN tbl_products p ON v.product_id = p.id",
        );
        Self::push_conditions(&mut qb, owner, filter);

        let total: i64 = qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("统计款式数量"))?;
        Ok(to_count(total))
    }

    async fn find(&self, owner: UserId, id: i32, scope: RecordScope) -> AppResult<Option<Variant>> {
        let sql = format!(
            "{} WHERE v.id = $1 AND v.user_id = $2 AND {}",
            VARIANT_COLUMNS,
            scope.predicate("v")
        );

        let row = sqlx::query_as::<_, VariantRow>(&sql)
            .bind(id)
            .bind(owner.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("查询款式详情"))?;

        match row {
            Some(row) => Ok(self.load_associations(vec![row]).await?.into_iter().next()),
            None => Ok(None),
        }
    }

    async fn insert(&self, owner: UserId, draft: &VariantDraft) -> AppResult<i32> {
        let mut tx = self.tx_manager.begin().await?;

        let variant_id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO tbl_variants (user_id, name, price, cost_price, product_id, created_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            RETURNING id
            "#,
        )
        .bind(owner.0)
        .bind(&draft.name)
        .bind(draft.price)
        .bind(draft.cost_price)
        .bind(draft.product_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("创建款式"))?;

        Self::replace_associations(&mut tx, variant_id, draft).await?;
        TransactionManager::commit(tx).await?;
        Ok(variant_id)
    }

    async fn update(&self, owner: UserId, id: i32, draft: &VariantDraft) -> AppResult<bool> {
        let mut tx = self.tx_manager.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE tbl_variants
            SET name = $1, price = $2, cost_price = $3, product_id = $4, updated_at = NOW()
            WHERE id = $5 AND user_id = $6 AND archived_at IS NULL
            "#,
        )
        .bind(&draft.name)
        .bind(draft.price)
        .bind(draft.cost_price)
        .bind(draft.product_id)
        .bind(id)
        .bind(owner.0)
        .execute(&mut *tx)
        .await
        .map_err(db_error("更新款式"))?;

        if result.rows_affected() == 0 {
            TransactionManager::rollback(tx).await?;
            return Ok(false);
        }

        Self::replace_associations(&mut tx, id, draft).await?;
        TransactionManager::commit(tx).await?;
        Ok(true)
    }

    async fn set_archived(&self, owner: UserId, id: i32, archived: bool) -> AppResult<bool> {
        let sql = if archived {
            r#"
            UPDATE tbl_variants SET archived_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND user_id = $2 AND archived_at IS NULL
            "#
        } else {
            r#"
            UPDATE tbl_variants SET archived_at = NULL, updated_at = NOW()
            WHERE id = $1 AND user_id = $2 AND archived_at IS NOT NULL
            "#
        };

        let result = sqlx::query(sql)
            .bind(id)
            .bind(owner.0)
            .execute(&self.pool)
            .await
            .map_err(db_error("归档/恢复款式"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn active_products(&self, owner: UserId) -> AppResult<Vec<ProductOption>> {
        let rows = sqlx::query_as::<_, ProductOptionRow>(
            r#"
            SELECT id, name, image, image_content_type
            FROM tbl_products
            WHERE user_id = $1 AND archived_at IS NULL
            ORDER BY name
            "#,
        )
        .bind(owner.0)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("查询在用商品"))?;

        Ok(rows.into_iter().map(product_option_from_row).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_clause_follows_scope() {
        assert_eq!(
            order_clause(RecordScope::Active, ""),
            " ORDER BY created_at DESC, id DESC"
        );
        assert_eq!(
            order_clause(RecordScope::Archived, "v"),
            " ORDER BY v.archived_at DESC, v.id DESC"
        );
    }
}
