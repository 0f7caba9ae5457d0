//! 基础设施资源管理
//!
//! 本地库连接池必需，云端镜像库可选

use secrecy::ExposeSecret;
use softwear_adapter_postgres::{
    PostgresConfig, check_connection, create_lazy_pool, create_pool,
};
use softwear_common::retry::{RetryConfig, with_retry};
use softwear_config::{AppConfig, DatabaseConfig};
use softwear_errors::AppResult;
use softwear_telemetry::HealthStatus;
use sqlx::PgPool;
use tracing::info;

/// 基础设施资源容器
pub struct Infrastructure {
    config: AppConfig,
    local_pool: PgPool,
    cloud_pool: Option<PgPool>,
}

fn postgres_config(db: &DatabaseConfig) -> PostgresConfig {
    PostgresConfig::new(db.url.expose_secret()).with_max_connections(db.max_connections)
}

impl Infrastructure {
    /// 立即连接两个库（带重试），任一失败即返回错误
    pub async fn from_config(config: AppConfig) -> AppResult<Self> {
        let retry_config = RetryConfig::default();

        let local_config = postgres_config(&config.database);
        let local_pool = with_retry(&retry_config, "Local PostgreSQL connection", || {
            let cfg = local_config.clone();
            async move { create_pool(&cfg).await }
        })
        .await?;
        info!(
            "Local connection pool created (max_connections: {})",
            config.database.max_connections
        );

        let cloud_pool = match &config.cloud {
            Some(cloud) => {
                let cloud_config = postgres_config(cloud);
                let pool = with_retry(&retry_config, "Cloud PostgreSQL connection", || {
                    let cfg = cloud_config.clone();
                    async move { create_pool(&cfg).await }
                })
                .await?;
                info!(
                    "Cloud connection pool created (max_connections: {})",
                    cloud.max_connections
                );
                Some(pool)
            }
            None => {
                info!("Cloud database not configured, skipping");
                None
            }
        };

        Ok(Self {
            config,
            local_pool,
            cloud_pool,
        })
    }

    /// 延迟连接：连接在首次查询时建立，适合需要容忍数据库暂时不可用的后台任务
    pub fn lazy(config: AppConfig) -> AppResult<Self> {
        let local_pool = create_lazy_pool(&postgres_config(&config.database))?;
        let cloud_pool = config
            .cloud
            .as_ref()
            .map(|cloud| create_lazy_pool(&postgres_config(cloud)))
            .transpose()?;

        Ok(Self {
            config,
            local_pool,
            cloud_pool,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// 本地库连接池
    pub fn local_pool(&self) -> PgPool {
        self.local_pool.clone()
    }

    /// 云端镜像库连接池（未配置时为 None）
    pub fn cloud_pool(&self) -> Option<PgPool> {
        self.cloud_pool.clone()
    }

    /// 检查所有已配置的数据库
    pub async fn health_check(&self) -> HealthStatus {
        let mut status = HealthStatus::new();

        match check_connection(&self.local_pool).await {
            Ok(()) => status.add_check("local", true, None),
            Err(e) => status.add_check("local", false, Some(e.to_string())),
        }

        match &self.cloud_pool {
            Some(pool) => match check_connection(pool).await {
                Ok(()) => status.add_check("cloud", true, None),
                Err(e) => status.add_check("cloud", false, Some(e.to_string())),
            },
            None => status.add_check("cloud", false, Some("not configured".to_string())),
        }

        status
    }
}
