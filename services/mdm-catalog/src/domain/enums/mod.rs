//! 商品主数据枚举

mod attribute_kind;
mod record_scope;

pub use attribute_kind::AttributeKind;
pub use record_scope::RecordScope;
