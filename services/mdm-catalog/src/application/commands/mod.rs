mod attribute_commands;
mod product_commands;
mod variant_commands;

pub use attribute_commands::*;
pub use product_commands::*;
pub use variant_commands::*;

use softwear_common::non_blank;
use softwear_errors::{AppError, AppResult};

/// 必填名称：去除首尾空白后非空且不超长
fn required_name(label: &str, name: &str, max_len: usize) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::validation(format!("{}名称不能为空", label)));
    }
    if name.chars().count() > max_len {
        return Err(AppError::validation(format!(
            "{}名称长度不能超过{}个字符",
            label, max_len
        )));
    }
    Ok(name.to_string())
}

fn optional_text(value: &Option<String>) -> Option<String> {
    non_blank(value.as_deref())
}
