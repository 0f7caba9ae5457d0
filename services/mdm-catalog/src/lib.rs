//! mdm-catalog - 商品主数据：分类、颜色、尺码、商品与款式

pub mod application;
pub mod domain;
pub mod infrastructure;
