//! 款式命令

use rust_decimal::Decimal;
use softwear_common::UserId;
use softwear_errors::{AppError, AppResult};

use super::required_name;
use crate::domain::entities::VariantDraft;

const MAX_VARIANT_NAME_LEN: usize = 200;

/// 去重并排序关联 ID
fn distinct_ids(ids: &[i32]) -> Vec<i32> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids
}

fn variant_draft(
    name: &str,
    price: Decimal,
    cost_price: Option<Decimal>,
    product_id: i32,
    size_ids: &[i32],
    color_ids: &[i32],
) -> AppResult<VariantDraft> {
    let name = required_name("款式", name, MAX_VARIANT_NAME_LEN)?;
    if price <= Decimal::ZERO {
        return Err(AppError::validation("价格必须大于0"));
    }
    if cost_price.is_some_and(|c| c < Decimal::ZERO) {
        return Err(AppError::validation("成本价不能为负数"));
    }
    if product_id <= 0 {
        return Err(AppError::validation("请选择所属商品"));
    }

    Ok(VariantDraft {
        name,
        price,
        cost_price,
        product_id,
        size_ids: distinct_ids(size_ids),
        color_ids: distinct_ids(color_ids),
    })
}

/// 创建款式
#[derive(Debug, Clone)]
pub struct CreateVariantCommand {
    pub owner: UserId,
    pub name: String,
    pub price: Decimal,
    pub cost_price: Option<Decimal>,
    pub product_id: i32,
    pub size_ids: Vec<i32>,
    pub color_ids: Vec<i32>,
}

impl CreateVariantCommand {
    pub fn validate(&self) -> AppResult<()> {
        self.to_draft().map(|_| ())
    }

    pub fn to_draft(&self) -> AppResult<VariantDraft> {
        variant_draft(
            &self.name,
            self.price,
            self.cost_price,
            self.product_id,
            &self.size_ids,
            &self.color_ids,
        )
    }
}

/// 修改款式，尺码与颜色整体替换
#[derive(Debug, Clone)]
pub struct UpdateVariantCommand {
    pub owner: UserId,
    pub id: i32,
    pub name: String,
    pub price: Decimal,
    pub cost_price: Option<Decimal>,
    pub product_id: i32,
    pub size_ids: Vec<i32>,
    pub color_ids: Vec<i32>,
}

impl UpdateVariantCommand {
    pub fn validate(&self) -> AppResult<()> {
        self.to_draft().map(|_| ())
    }

    pub fn to_draft(&self) -> AppResult<VariantDraft> {
        variant_draft(
            &self.name,
            self.price,
            self.cost_price,
            self.product_id,
            &self.size_ids,
            &self.color_ids,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(price: Decimal, cost: Option<Decimal>) -> CreateVariantCommand {
        CreateVariantCommand {
            owner: UserId(3),
            name: "Slim Fit".to_string(),
            price,
            cost_price: cost,
            product_id: 8,
            size_ids: vec![3, 1, 3],
            color_ids: vec![],
        }
    }

    #[test]
    fn test_price_must_be_positive() {
        assert!(create(Decimal::ZERO, None).validate().is_err());
        assert!(create(Decimal::new(-1, 0), None).validate().is_err());
        assert!(create(Decimal::new(1, 2), None).validate().is_ok());
    }

    #[test]
    fn test_cost_price_may_be_zero_not_negative() {
        assert!(create(Decimal::TEN, Some(Decimal::ZERO)).validate().is_ok());
        assert!(create(Decimal::TEN, Some(Decimal::new(-5, 1))).validate().is_err());
    }

    #[test]
    fn test_association_ids_deduplicated() {
        let draft = create(Decimal::TEN, None).to_draft().unwrap();
        assert_eq!(draft.size_ids, vec![1, 3]);
        assert!(draft.color_ids.is_empty());
    }
}
