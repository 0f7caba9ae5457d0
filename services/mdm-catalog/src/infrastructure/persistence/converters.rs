//! 数据库行到领域对象的转换

use std::collections::HashMap;

use crate::domain::entities::{
    AttributeOption, CatalogAttribute, Product, ProductOption, Variant, VariantColor, VariantSize,
};
use crate::domain::enums::AttributeKind;
use crate::domain::value_objects::ProductImage;

use super::rows::{
    AttributeOptionRow, AttributeRow, ProductOptionRow, ProductRow, VariantColorRow, VariantRow,
    VariantSizeRow,
};

pub fn attribute_from_row(kind: AttributeKind, row: AttributeRow) -> CatalogAttribute {
    CatalogAttribute {
        id: row.id,
        kind,
        name: row.name,
        hex_value: row.hex_value.map(|h| h.trim().to_string()),
        description: row.description,
        created_at: row.created_at,
        updated_at: row.updated_at,
        archived_at: row.archived_at,
    }
}

pub fn option_from_row(row: AttributeOptionRow) -> AttributeOption {
    AttributeOption {
        id: row.id,
        name: row.name,
        hex_value: row.hex_value.map(|h| h.trim().to_string()),
    }
}

pub fn product_from_row(row: ProductRow) -> Product {
    Product {
        id: row.id,
        name: row.name,
        description: row.description,
        category_id: row.category_id,
        category_name: row.category_name,
        status: row.status,
        image: ProductImage::from_parts(row.image, row.image_content_type),
        created_at: row.created_at,
        archived_at: row.archived_at,
    }
}

pub fn product_option_from_row(row: ProductOptionRow) -> ProductOption {
    ProductOption {
        id: row.id,
        name: row.name,
        image: ProductImage::from_parts(row.image, row.image_content_type),
    }
}

/// 组装款式，尺码与颜色按 variant_id 归组（保持查询顺序）
pub fn variants_from_rows(
    rows: Vec<VariantRow>,
    sizes: Vec<VariantSizeRow>,
    colors: Vec<VariantColorRow>,
) -> Vec<Variant> {
    let mut sizes_by_variant: HashMap<i32, Vec<VariantSize>> = HashMap::new();
    for size in sizes {
        sizes_by_variant
            .entry(size.variant_id)
            .or_default()
            .push(VariantSize {
                id: size.id,
                name: size.name,
            });
    }

    let mut colors_by_variant: HashMap<i32, Vec<VariantColor>> = HashMap::new();
    for color in colors {
        colors_by_variant
            .entry(color.variant_id)
            .or_default()
            .push(VariantColor {
                id: color.id,
                name: color.name,
                hex_value: color.hex_value.trim().to_string(),
            });
    }

    rows.into_iter()
        .map(|row| Variant {
            id: row.id,
            name: row.name,
            price: row.price,
            cost_price: row.cost_price,
            product_id: row.product_id,
            product_name: row.product_name,
            product_image: ProductImage::from_parts(
                row.product_image,
                row.product_image_content_type,
            ),
            created_at: row.created_at,
            archived_at: row.archived_at,
            sizes: sizes_by_variant.remove(&row.id).unwrap_or_default(),
            colors: colors_by_variant.remove(&row.id).unwrap_or_default(),
        })
        .collect()
}
