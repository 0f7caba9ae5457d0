//! 分类 / 颜色 / 尺码命令

use softwear_common::UserId;
use softwear_errors::{AppError, AppResult};

use super::{optional_text, required_name};
use crate::domain::entities::AttributeDraft;
use crate::domain::enums::AttributeKind;
use crate::domain::value_objects::HexColor;

fn attribute_draft(
    kind: AttributeKind,
    name: &str,
    hex_value: &Option<String>,
    description: &Option<String>,
) -> AppResult<AttributeDraft> {
    let name = required_name(kind.label(), name, kind.max_name_len())?;
    let hex_value = if kind.has_hex_value() {
        let raw = hex_value
            .as_deref()
            .ok_or_else(|| AppError::validation("颜色值不能为空"))?;
        Some(HexColor::parse(raw)?.into_inner())
    } else {
        None
    };

    Ok(AttributeDraft {
        name,
        hex_value,
        description: optional_text(description),
    })
}

/// 创建分类 / 颜色 / 尺码
#[derive(Debug, Clone)]
pub struct CreateAttributeCommand {
    pub kind: AttributeKind,
    pub owner: UserId,
    pub name: String,
    /// 仅颜色必填
    pub hex_value: Option<String>,
    pub description: Option<String>,
}

impl CreateAttributeCommand {
    pub fn validate(&self) -> AppResult<()> {
        self.to_draft().map(|_| ())
    }

    pub fn to_draft(&self) -> AppResult<AttributeDraft> {
        attribute_draft(self.kind, &self.name, &self.hex_value, &self.description)
    }
}

/// 修改分类 / 颜色 / 尺码
#[derive(Debug, Clone)]
pub struct UpdateAttributeCommand {
    pub kind: AttributeKind,
    pub owner: UserId,
    pub id: i32,
    pub name: String,
    pub hex_value: Option<String>,
    pub description: Option<String>,
}

impl UpdateAttributeCommand {
    pub fn validate(&self) -> AppResult<()> {
        self.to_draft().map(|_| ())
    }

    pub fn to_draft(&self) -> AppResult<AttributeDraft> {
        attribute_draft(self.kind, &self.name, &self.hex_value, &self.description)
    }
}
