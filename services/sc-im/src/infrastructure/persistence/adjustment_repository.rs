//! 库存调整的 PostgreSQL 实现

use async_trait::async_trait;
use softwear_adapter_postgres::{TransactionManager, db_error, push_page, push_search, to_count};
use softwear_common::{Pagination, UserId};
use softwear_errors::AppResult;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;

use crate::domain::{
    AdjustmentFilter, AdjustmentOutcome, AdjustmentType, NewStockAdjustment, StockAdjustment,
    StockAdjustmentRepository,
};

use super::levels::{KEY_NAME_COLUMNS, USER_NAME_COLUMNS, current_stock};
use super::rows::AdjustmentRow;

const SEARCH_COLUMNS: [&str; 3] = ["v.name", "p.name", "sa.reason"];

const FROM_ADJUSTMENTS: &str = r#"
    FROM tbl_stock_adjustments sa
    JOIN tbl_variants v ON v.id = sa.variant_id
    JOIN tbl_products p ON p.id = v.product_id
    JOIN tbl_users u ON u.id = sa.user_id
    LEFT JOIN tbl_sizes sz ON sz.id = sa.size_id
    LEFT JOIN tbl_colors c ON c.id = sa.color_id
    WHERE sa.archived_at IS NULL AND v.user_id = "#;

pub struct PostgresAdjustmentRepository {
    pool: PgPool,
    tx_manager: TransactionManager,
}

impl PostgresAdjustmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            tx_manager: TransactionManager::new(pool.clone()),
            pool,
        }
    }

    fn select(seller: UserId) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new(
            "SELECT sa.id, sa.variant_id, sa.size_id, sa.color_id, sa.adjustment_type, \
             sa.quantity_adjusted, sa.reason, sa.user_id, sa.created_at, ",
        );
        qb.push(KEY_NAME_COLUMNS)
            .push(", ")
            .push(USER_NAME_COLUMNS)
            .push(FROM_ADJUSTMENTS)
            .push_bind(seller.0);
        qb
    }

    fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &AdjustmentFilter) {
        push_search(qb, &SEARCH_COLUMNS, filter.search.as_deref());
        if let Some(adjustment_type) = filter.adjustment_type {
            qb.push(" AND sa.adjustment_type = ").push_bind(adjustment_type.as_str());
        }
    }
}

#[async_trait]
impl StockAdjustmentRepository for PostgresAdjustmentRepository {
    async fn list(
        &self,
        filter: &AdjustmentFilter,
        pagination: Pagination,
    ) -> AppResult<Vec<StockAdjustment>> {
        let mut qb = Self::select(filter.seller);
        Self::push_filter(&mut qb, filter);
        qb.push(" ORDER BY sa.created_at DESC, sa.id DESC");
        push_page(&mut qb, pagination);

        let rows = qb
            .build_query_as::<AdjustmentRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("查询库存调整列表"))?;
        rows.into_iter().map(AdjustmentRow::into_adjustment).collect()
    }

    async fn count(&self, filter: &AdjustmentFilter) -> AppResult<u64> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
        qb.push(FROM_ADJUSTMENTS).push_bind(filter.seller.0);
        Self::push_filter(&mut qb, filter);

        let total = qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("统计库存调整数量"))?;
        Ok(to_count(total))
    }

    async fn details(&self, seller: UserId, id: i32) -> AppResult<Option<StockAdjustment>> {
        let mut qb = Self::select(seller);
        qb.push(" AND sa.id = ").push_bind(id);

        let row = qb
            .build_query_as::<AdjustmentRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("查询库存调整详情"))?;
        row.map(AdjustmentRow::into_adjustment).transpose()
    }

    async fn insert(&self, adjustment: &NewStockAdjustment) -> AppResult<AdjustmentOutcome> {
        let mut tx = self.tx_manager.begin().await?;

        // 锁住款式行，同一款式的调整串行执行
        let owned: Option<i32> = sqlx::query_scalar(
            "SELECT id FROM tbl_variants WHERE id = $1 AND user_id = $2 AND archived_at IS NULL FOR UPDATE",
        )
        .bind(adjustment.key.variant_id)
        .bind(adjustment.seller.0)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("校验款式归属"))?;

        if owned.is_none() {
            TransactionManager::rollback(tx).await?;
            return Ok(AdjustmentOutcome::VariantNotFound);
        }

        if adjustment.adjustment_type == AdjustmentType::Decrease {
            let available = current_stock(&mut tx, adjustment.seller, adjustment.key).await?;
            if adjustment.quantity > available {
                debug!(available, requested = adjustment.quantity, "Decrease rejected");
                TransactionManager::rollback(tx).await?;
                return Ok(AdjustmentOutcome::InsufficientStock { available });
            }
        }

        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO tbl_stock_adjustments
                (variant_id, size_id, color_id, adjustment_type, quantity_adjusted, reason, user_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())
            RETURNING id
            "#,
        )
        .bind(adjustment.key.variant_id)
        .bind(adjustment.key.size_id)
        .bind(adjustment.key.color_id)
        .bind(adjustment.adjustment_type.as_str())
        .bind(adjustment.quantity)
        .bind(&adjustment.reason)
        .bind(adjustment.created_by.0)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("新增库存调整"))?;

        TransactionManager::commit(tx).await?;
        Ok(AdjustmentOutcome::Created(id))
    }
}
