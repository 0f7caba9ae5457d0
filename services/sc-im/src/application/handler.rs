//! 库存业务处理

use std::sync::Arc;

use chrono::Utc;
use softwear_common::{DateRange, PagedResult, Pagination, UserId, non_blank};
use softwear_errors::{AppError, AppResult};
use tracing::{info, warn};

use crate::domain::{
    AdjustmentFilter, AdjustmentOutcome, DailyQuantity, InventoryItem, InventoryRepository,
    InventoryStats, LowStockItem, MovementFilter, StockAdjustment, StockAdjustmentRepository,
    StockIn, StockInDetails, StockInRepository, StockKey, StockOut, StockOutRepository,
    fill_daily,
};

use super::commands::{
    CreateAdjustmentCommand, CreateStockInCommand, CreateStockOutCommand,
    UpdateReorderLevelCommand,
};

const MAX_LOW_STOCK_ITEMS: i64 = 100;

pub struct ServiceHandler {
    inventory: Arc<dyn InventoryRepository>,
    stock_in: Arc<dyn StockInRepository>,
    stock_out: Arc<dyn StockOutRepository>,
    adjustments: Arc<dyn StockAdjustmentRepository>,
}

impl ServiceHandler {
    pub fn new(
        inventory: Arc<dyn InventoryRepository>,
        stock_in: Arc<dyn StockInRepository>,
        stock_out: Arc<dyn StockOutRepository>,
        adjustments: Arc<dyn StockAdjustmentRepository>,
    ) -> Self {
        Self {
            inventory,
            stock_in,
            stock_out,
            adjustments,
        }
    }

    // ---- 库存水平 ----

    pub async fn list_inventory(
        &self,
        seller: UserId,
        search: Option<&str>,
        pagination: Pagination,
    ) -> AppResult<PagedResult<InventoryItem>> {
        let search = non_blank(search);
        let items = self.inventory.list(seller, search.clone(), pagination).await?;
        let total = self.inventory.count(seller, search).await?;
        Ok(PagedResult::new(items, total, &pagination))
    }

    pub async fn count_inventory(&self, seller: UserId, search: Option<&str>) -> AppResult<u64> {
        self.inventory.count(seller, non_blank(search)).await
    }

    pub async fn inventory_details(
        &self,
        seller: UserId,
        key: StockKey,
    ) -> AppResult<Option<InventoryItem>> {
        self.inventory.details(seller, key).await
    }

    pub async fn current_stock(&self, seller: UserId, key: StockKey) -> AppResult<i32> {
        self.inventory.current_stock(seller, key).await
    }

    pub async fn update_reorder_level(&self, cmd: UpdateReorderLevelCommand) -> AppResult<()> {
        let update = cmd.validate()?;
        if !self.inventory.set_reorder_level(&update).await? {
            return Err(AppError::not_found(format!(
                "款式 {} 不存在或不属于当前卖家",
                update.key.variant_id
            )));
        }
        info!(
            variant_id = update.key.variant_id,
            size_id = ?update.key.size_id,
            color_id = ?update.key.color_id,
            reorder_level = update.reorder_level,
            "Reorder level updated"
        );
        Ok(())
    }

    pub async fn dashboard_stats(&self, seller: UserId) -> AppResult<InventoryStats> {
        self.inventory.stats(seller).await
    }

    pub async fn low_stock_items(&self, seller: UserId, top: i64) -> AppResult<Vec<LowStockItem>> {
        self.inventory
            .low_stock(seller, top.clamp(1, MAX_LOW_STOCK_ITEMS))
            .await
    }

    // ---- 入库 ----

    pub async fn list_stock_ins(
        &self,
        filter: &MovementFilter,
        pagination: Pagination,
    ) -> AppResult<PagedResult<StockIn>> {
        let items = self.stock_in.list(filter, pagination).await?;
        let total = self.stock_in.count(filter).await?;
        Ok(PagedResult::new(items, total, &pagination))
    }

    pub async fn count_stock_ins(&self, filter: &MovementFilter) -> AppResult<u64> {
        self.stock_in.count(filter).await
    }

    pub async fn stock_in_details(
        &self,
        id: i32,
        filter: &MovementFilter,
    ) -> AppResult<Option<StockInDetails>> {
        self.stock_in.details(id, filter).await
    }

    pub async fn create_stock_in(&self, cmd: CreateStockInCommand) -> AppResult<i32> {
        let stock_in = cmd.validate()?;
        let id = self.stock_in.insert(&stock_in).await?;
        info!(
            id,
            variant_id = stock_in.key.variant_id,
            quantity = stock_in.quantity,
            supplier_id = ?stock_in.supplier_id,
            "Stock-in recorded"
        );
        Ok(id)
    }

    /// 截至今天（UTC）的最近 `days` 天，缺失日期补零
    pub async fn daily_stock_in(&self, seller: UserId, days: u32) -> AppResult<Vec<DailyQuantity>> {
        let range = DateRange::last_days(Utc::now().date_naive(), days);
        let data = self.stock_in.daily(seller, &range).await?;
        Ok(fill_daily(&range, &data))
    }

    // ---- 出库 ----

    pub async fn list_stock_outs(
        &self,
        filter: &MovementFilter,
        pagination: Pagination,
    ) -> AppResult<PagedResult<StockOut>> {
        let items = self.stock_out.list(filter, pagination).await?;
        let total = self.stock_out.count(filter).await?;
        Ok(PagedResult::new(items, total, &pagination))
    }

    pub async fn count_stock_outs(&self, filter: &MovementFilter) -> AppResult<u64> {
        self.stock_out.count(filter).await
    }

    pub async fn stock_out_details(
        &self,
        id: i32,
        filter: &MovementFilter,
    ) -> AppResult<Option<StockOut>> {
        self.stock_out.details(id, filter).await
    }

    pub async fn create_stock_out(&self, cmd: CreateStockOutCommand) -> AppResult<i32> {
        let stock_out = cmd.validate()?;
        let id = self.stock_out.insert(&stock_out).await?;
        info!(
            id,
            variant_id = stock_out.key.variant_id,
            quantity = stock_out.quantity,
            "Stock-out recorded"
        );
        Ok(id)
    }

    pub async fn daily_stock_out(&self, seller: UserId, days: u32) -> AppResult<Vec<DailyQuantity>> {
        let range = DateRange::last_days(Utc::now().date_naive(), days);
        let data = self.stock_out.daily(seller, &range).await?;
        Ok(fill_daily(&range, &data))
    }

    // ---- 调整 ----

    pub async fn list_adjustments(
        &self,
        filter: &AdjustmentFilter,
        pagination: Pagination,
    ) -> AppResult<PagedResult<StockAdjustment>> {
        let items = self.adjustments.list(filter, pagination).await?;
        let total = self.adjustments.count(filter).await?;
        Ok(PagedResult::new(items, total, &pagination))
    }

    pub async fn count_adjustments(&self, filter: &AdjustmentFilter) -> AppResult<u64> {
        self.adjustments.count(filter).await
    }

    pub async fn adjustment_details(
        &self,
        seller: UserId,
        id: i32,
    ) -> AppResult<Option<StockAdjustment>> {
        self.adjustments.details(seller, id).await
    }

    /// 减少数量不能超过当前库存
    pub async fn create_adjustment(&self, cmd: CreateAdjustmentCommand) -> AppResult<i32> {
        let adjustment = cmd.validate()?;
        match self.adjustments.insert(&adjustment).await? {
            AdjustmentOutcome::Created(id) => {
                info!(
                    id,
                    variant_id = adjustment.key.variant_id,
                    adjustment_type = %adjustment.adjustment_type,
                    quantity = adjustment.quantity,
                    "Stock adjusted"
                );
                Ok(id)
            }
            AdjustmentOutcome::VariantNotFound => Err(AppError::not_found(format!(
                "款式 {} 不存在或不属于当前卖家",
                adjustment.key.variant_id
            ))),
            AdjustmentOutcome::InsufficientStock { available } => {
                warn!(
                    variant_id = adjustment.key.variant_id,
                    requested = adjustment.quantity,
                    available,
                    "Adjustment exceeds current stock"
                );
                Err(AppError::failed_precondition(format!(
                    "减少数量 {} 超过当前库存 {}",
                    adjustment.quantity, available
                )))
            }
        }
    }
}
