//! softwear-sync - 本地库与云端镜像库的同步工具

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use softwear_adapter_postgres::{MigrationManager, schema_migrations};
use softwear_bootstrap::{Infrastructure, init_runtime, shutdown_signal};
use softwear_config::AppConfig;
use sqlx::PgPool;
use tracing::{info, warn};

use sys_sync::application::{AutoSyncService, ProgressFn, SyncEngine};
use sys_sync::domain::{DatabaseSide, SyncProgress, SyncResult};
use sys_sync::infrastructure::PostgresTableStore;

#[derive(Parser)]
#[command(name = "softwear-sync")]
#[command(author, version, about = "Replicate the SoftWear store database to its cloud mirror")]
#[command(propagate_version = true)]
struct Cli {
    /// 配置目录
    #[arg(long, env = "SOFTWEAR_CONFIG_DIR", default_value = "config", global = true)]
    config_dir: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Test both database connections
    Check,
    /// Show row counts per synced table
    Tables {
        #[arg(long, value_enum, default_value_t = Side::Local)]
        side: Side,
    },
    /// Push local rows to the cloud mirror
    Push {
        /// Only this table
        #[arg(long)]
        table: Option<String>,
    },
    /// Pull rows missing locally from the cloud mirror
    Pull {
        /// Only this table
        #[arg(long)]
        table: Option<String>,
    },
    /// Run the hourly background push until interrupted
    Daemon,
    /// Apply schema migrations
    Migrate {
        #[arg(long, value_enum, default_value_t = MigrateTarget::Local)]
        target: MigrateTarget,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Side {
    Local,
    Cloud,
}

impl From<Side> for DatabaseSide {
    fn from(side: Side) -> Self {
        match side {
            Side::Local => DatabaseSide::Local,
            Side::Cloud => DatabaseSide::Cloud,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum MigrateTarget {
    Local,
    Cloud,
    Both,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = AppConfig::load(&cli.config_dir)
        .with_context(|| format!("loading configuration from '{}'", cli.config_dir))?;
    let _metrics = init_runtime(&config);

    match cli.command {
        Commands::Check => check(config).await,
        Commands::Tables { side } => tables(config, side.into()).await,
        Commands::Push { table } => push(config, table).await,
        Commands::Pull { table } => pull(config, table).await,
        Commands::Daemon => daemon(config).await,
        Commands::Migrate { target } => migrate(config, target).await,
    }
}

fn require_cloud(infra: &Infrastructure) -> Result<PgPool> {
    match infra.cloud_pool() {
        Some(pool) => Ok(pool),
        None => bail!("cloud database is not configured (set SOFTWEAR_CLOUD__URL)"),
    }
}

fn build_engine(infra: &Infrastructure) -> Result<SyncEngine> {
    let cloud = require_cloud(infra)?;
    Ok(SyncEngine::new(
        Arc::new(PostgresTableStore::new(infra.local_pool())),
        Arc::new(PostgresTableStore::new(cloud)),
        infra.config().sync.tables.clone(),
    ))
}

fn print_result(result: &SyncResult) {
    println!("{}", result.message);
    for error in &result.errors {
        println!("  - {}", error);
    }
}

fn print_progress(progress: &SyncProgress) {
    println!(
        "[{:>3}%] {}/{} {} (synced {}, skipped {})",
        progress.percentage(),
        progress.current_table,
        progress.total_tables,
        progress.current_table_name,
        progress.rows_synced,
        progress.rows_skipped
    );
}

async fn check(config: AppConfig) -> Result<()> {
    let infra = Infrastructure::lazy(config)?;
    let health = infra.health_check().await;
    for check in &health.checks {
        match &check.message {
            Some(message) => println!("{:<6} {} ({})", check.name, status_word(check.healthy), message),
            None => println!("{:<6} {}", check.name, status_word(check.healthy)),
        }
    }
    info!(summary = %health.summary(), "Connection check finished");
    if !health.healthy {
        bail!("one or more databases are unreachable");
    }
    Ok(())
}

fn status_word(healthy: bool) -> &'static str {
    if healthy { "ok" } else { "FAILED" }
}

async fn tables(config: AppConfig, side: DatabaseSide) -> Result<()> {
    let infra = Infrastructure::lazy(config)?;
    let engine = build_engine(&infra)?;
    let infos = engine.table_info(side).await;
    if infos.is_empty() {
        bail!("{:?} database is unreachable", side);
    }
    for info in infos {
        println!("{:<32} {:>10}", info.table_name, info.row_count);
    }
    Ok(())
}

async fn push(config: AppConfig, table: Option<String>) -> Result<()> {
    let infra = Infrastructure::from_config(config).await?;
    let engine = build_engine(&infra)?;
    let result = match table {
        Some(table) => engine.push_table(&table).await,
        None => engine.push_all(Some(&mut print_progress as &mut ProgressFn<'_>)).await,
    };
    print_result(&result);
    if !result.success {
        bail!("push finished with errors");
    }
    Ok(())
}

async fn pull(config: AppConfig, table: Option<String>) -> Result<()> {
    let infra = Infrastructure::from_config(config).await?;
    let engine = build_engine(&infra)?;
    let result = match table {
        Some(table) => engine.pull_table(&table).await,
        None => engine.pull_all(Some(&mut print_progress as &mut ProgressFn<'_>)).await,
    };
    print_result(&result);
    if !result.success {
        bail!("pull finished with errors");
    }
    Ok(())
}

async fn daemon(config: AppConfig) -> Result<()> {
    if !config.sync.enabled {
        warn!("Automatic sync is disabled in configuration");
        return Ok(());
    }
    let infra = Infrastructure::lazy(config)?;
    let engine = Arc::new(build_engine(&infra)?);
    let service = Arc::new(AutoSyncService::from_config(engine, &infra.config().sync));

    let mut events = service.subscribe();
    let reporter = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            info!(
                success = event.result.success,
                message = %event.result.message,
                "Sync cycle finished"
            );
        }
    });

    let handle = service.start();
    shutdown_signal().await;
    service.stop();
    handle.await.context("sync task failed")?;
    reporter.abort();

    let status = service.status().await;
    info!(last_status = %status.last_status, "Sync daemon stopped");
    Ok(())
}

async fn migrate(config: AppConfig, target: MigrateTarget) -> Result<()> {
    let infra = Infrastructure::from_config(config).await?;
    let mut pools = Vec::new();
    if matches!(target, MigrateTarget::Local | MigrateTarget::Both) {
        pools.push(("local", infra.local_pool()));
    }
    if matches!(target, MigrateTarget::Cloud | MigrateTarget::Both) {
        pools.push(("cloud", require_cloud(&infra)?));
    }

    let migrations = schema_migrations();
    for (name, pool) in pools {
        let result = MigrationManager::new(pool).migrate(&migrations).await?;
        println!(
            "{}: {} applied, {} already present",
            name,
            result.applied_count(),
            result.skipped.len()
        );
        for error in &result.errors {
            println!("  - {} {}: {}", error.version, error.name, error.error);
        }
        if !result.is_success() {
            bail!("{} migrations failed", name);
        }
    }
    Ok(())
}
