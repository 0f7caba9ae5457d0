//! softwear-config - 配置加载库
//!
//! 加载顺序：`{dir}/default.toml` → `{dir}/{APP_ENV}.toml` → `SOFTWEAR_` 前缀的环境变量
//! （嵌套键用 `__` 分隔，例如 `SOFTWEAR_CLOUD__URL`）。

use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use secrecy::Secret;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    Load(#[from] figment::Error),
}

/// 默认参与同步的表，按外键依赖排序
pub const DEFAULT_SYNC_TABLES: &[&str] = &[
    "tbl_roles",
    "tbl_users",
    "tbl_histories",
    "tbl_addresses",
    "tbl_colors",
    "tbl_sizes",
    "tbl_categories",
    "tbl_products",
    "tbl_variants",
    "tbl_variant_sizes",
    "tbl_variant_colors",
    "tbl_suppliers",
    "tbl_inventories",
    "tbl_stock_in",
    "tbl_stock_out",
    "tbl_stock_adjustments",
    "tbl_purchase_orders",
    "tbl_po_items",
    "tbl_sales",
    "tbl_sales_items",
    "tbl_payments",
    "tbl_returns",
    "tbl_return_items",
    "tbl_daily_sales_verifications",
    "tbl_expenses",
    "tbl_supplier_invoices",
    "tbl_supplier_payments",
];

/// 数据库配置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: Secret<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    // 开发环境: 10, 生产环境: 50
    match std::env::var("APP_ENV").as_deref() {
        Ok("production") => 50,
        _ => 10,
    }
}

/// 同步配置
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_initial_delay_secs")]
    pub initial_delay_secs: u64,
    #[serde(default = "default_tables")]
    pub tables: Vec<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: default_interval_secs(),
            initial_delay_secs: default_initial_delay_secs(),
            tables: default_tables(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_interval_secs() -> u64 {
    3600
}

fn default_initial_delay_secs() -> u64 {
    30
}

fn default_tables() -> Vec<String> {
    DEFAULT_SYNC_TABLES.iter().map(|t| t.to_string()).collect()
}

/// 遥测配置
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub json: bool,
    #[serde(default)]
    pub metrics_enabled: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json: false,
            metrics_enabled: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// 应用配置
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_app_name")]
    pub app_name: String,
    #[serde(default = "default_app_env")]
    pub app_env: String,
    /// 本地库
    pub database: DatabaseConfig,
    /// 云端镜像库
    pub cloud: Option<DatabaseConfig>,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

fn default_app_name() -> String {
    "softwear".to_string()
}

fn default_app_env() -> String {
    "development".to_string()
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    pub fn load(config_dir: &str) -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        Self::from_figment(Self::figment(config_dir, &env))
    }

    /// 构建 Figment，便于调用方追加自定义来源
    pub fn figment(config_dir: &str, env: &str) -> Figment {
        Figment::new()
            .merge(Toml::file(format!("{}/default.toml", config_dir)))
            .merge(Toml::file(format!("{}/{}.toml", config_dir, env)))
            .merge(Env::prefixed("SOFTWEAR_").split("__"))
    }

    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        Ok(figment.extract()?)
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }

    /// 是否配置了云端镜像
    pub fn has_cloud(&self) -> bool {
        self.cloud.is_some()
    }
}

#[cfg(test)]
mod tests;
