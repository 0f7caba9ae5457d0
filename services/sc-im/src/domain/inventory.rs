//! 库存水平
//!
//! 当前库存 = Σ入库 − Σ出库 ± 调整，不计已归档的记录。

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use softwear_common::{DateRange, UserId};

/// 库存维度：款式 + 尺码 + 颜色
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StockKey {
    pub variant_id: i32,
    pub size_id: Option<i32>,
    pub color_id: Option<i32>,
}

impl StockKey {
    pub fn new(variant_id: i32, size_id: Option<i32>, color_id: Option<i32>) -> Self {
        Self {
            variant_id,
            size_id,
            color_id,
        }
    }
}

/// 库存列表行
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InventoryItem {
    pub key: StockKey,
    pub variant_name: String,
    pub product_name: String,
    pub size_name: Option<String>,
    pub color_name: Option<String>,
    pub color_hex: Option<String>,
    pub current_stock: i32,
    /// 未设置时为 0
    pub reorder_level: i32,
    pub last_updated: Option<DateTime<Utc>>,
    pub updated_by: Option<UserId>,
    pub updated_by_name: Option<String>,
    pub price: Decimal,
    pub cost_price: Option<Decimal>,
    #[serde(skip_serializing)]
    pub product_image: Option<Vec<u8>>,
    pub image_content_type: Option<String>,
    pub category_id: Option<i32>,
    pub category_name: Option<String>,
}

impl InventoryItem {
    pub fn is_low_stock(&self) -> bool {
        is_low_stock(self.current_stock, self.reorder_level)
    }

    /// 库存 × 成本价，无成本价按 0 计
    pub fn stock_value(&self) -> Decimal {
        Decimal::from(self.current_stock) * self.cost_price.unwrap_or_default()
    }
}

/// 设置了补货线且库存不高于补货线
pub fn is_low_stock(current_stock: i32, reorder_level: i32) -> bool {
    reorder_level > 0 && current_stock <= reorder_level
}

/// 补货线更新
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReorderLevelUpdate {
    pub key: StockKey,
    pub reorder_level: i32,
    pub seller: UserId,
    pub updated_by: UserId,
}

/// 库存看板
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InventoryStats {
    pub total_stock_in: i64,
    pub today_stock_in: i64,
    pub total_stock_out: i64,
    pub today_stock_out: i64,
    /// 调整按笔数统计
    pub total_adjustments: i64,
    pub today_adjustments: i64,
    pub low_stock_items: i64,
    pub total_inventory_value: Decimal,
    pub total_products: i64,
}

/// 低库存提醒
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LowStockItem {
    pub key: StockKey,
    pub product_name: String,
    pub variant_name: String,
    pub size_name: Option<String>,
    pub color_name: Option<String>,
    pub current_stock: i32,
    pub reorder_level: i32,
}

/// 按日汇总的笔数与数量
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyQuantity {
    pub date: NaiveDate,
    pub count: i64,
    pub quantity: i64,
}

impl DailyQuantity {
    pub fn zero(date: NaiveDate) -> Self {
        Self {
            date,
            count: 0,
            quantity: 0,
        }
    }
}

/// 区间内每天一条，缺失的日期补零
pub fn fill_daily(range: &DateRange, data: &[DailyQuantity]) -> Vec<DailyQuantity> {
    range
        .days()
        .into_iter()
        .map(|date| {
            data.iter()
                .find(|d| d.date == date)
                .copied()
                .unwrap_or_else(|| DailyQuantity::zero(date))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    #[test]
    fn test_low_stock_requires_reorder_level() {
        assert!(!is_low_stock(0, 0));
        assert!(is_low_stock(5, 5));
        assert!(is_low_stock(2, 5));
        assert!(!is_low_stock(6, 5));
    }

    #[test]
    fn test_fill_daily_zero_fills_gaps() {
        let range = DateRange::between(date(1), date(4));
        let data = [DailyQuantity {
            date: date(3),
            count: 2,
            quantity: 15,
        }];
        let filled = fill_daily(&range, &data);
        assert_eq!(filled.len(), 4);
        assert_eq!(filled[0], DailyQuantity::zero(date(1)));
        assert_eq!(filled[2].quantity, 15);
        assert_eq!(filled[3].date, date(4));
    }

    #[test]
    fn test_stock_value_without_cost_is_zero() {
        let item = InventoryItem {
            key: StockKey::new(1, Some(2), None),
            variant_name: "Tee".to_string(),
            product_name: "Basic Tee".to_string(),
            size_name: Some("M".to_string()),
            color_name: None,
            color_hex: None,
            current_stock: 12,
            reorder_level: 0,
            last_updated: None,
            updated_by: None,
            updated_by_name: None,
            price: Decimal::new(29900, 2),
            cost_price: None,
            product_image: None,
            image_content_type: None,
            category_id: None,
            category_name: None,
        };
        assert_eq!(item.stock_value(), Decimal::ZERO);
        assert!(!item.is_low_stock());
    }
}
