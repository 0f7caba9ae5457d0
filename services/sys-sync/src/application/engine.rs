//! 同步引擎
//!
//! 推送（本地 → 云端）按主键先更新、未命中再插入；拉取（云端 → 本地）只插入本地缺少的行。
//! 每行单独写入，单行失败计入跳过数，不中断同表的其他行。

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use softwear_adapter_postgres::DbErrorKind;
use tracing::{debug, info, warn};

use crate::domain::{
    ColumnInfo, DatabaseSide, Record, StoreError, StoreResult, SyncDirection, SyncProgress,
    SyncResult, TableInfo, TableName, TableStore, WriteOutcome, is_binary_column, key_text,
    normalize_binary_value,
};
use crate::infrastructure::observability::metrics as sync_metrics;

/// 批量同步的进度回调
pub type ProgressFn<'a> = dyn FnMut(&SyncProgress) + Send + 'a;

/// 拉取结果里最多列出的已存在行
const MAX_SKIP_DETAILS: usize = 5;
/// 结果消息里最多列出的错误
const MAX_ERROR_DETAILS: usize = 3;

/// 本地库与云端库之间的复制器
pub struct SyncEngine {
    local: Arc<dyn TableStore>,
    cloud: Arc<dyn TableStore>,
    tables: Vec<String>,
}

/// 一张表的写入计划
struct ColumnPlan {
    /// 源表中存在、目标表也存在的列
    written: Vec<String>,
    /// 目标表中出现在 written 里的标识列
    identity: Vec<String>,
    binary: HashSet<String>,
}

impl ColumnPlan {
    fn build(
        source: &[ColumnInfo],
        first_row: &Record,
        destination: StoreResult<Vec<ColumnInfo>>,
        assume_id_identity: bool,
    ) -> Self {
        let all: Vec<String> = if source.is_empty() {
            first_row.keys().cloned().collect()
        } else {
            source.iter().map(|c| c.name.clone()).collect()
        };

        let (written, identity) = match destination {
            Ok(dest) if !dest.is_empty() => {
                let names: HashSet<&str> = dest.iter().map(|c| c.name.as_str()).collect();
                let written: Vec<String> = all
                    .iter()
                    .filter(|c| names.contains(c.as_str()))
                    .cloned()
                    .collect();
                let identity = dest
                    .iter()
                    .filter(|c| c.is_identity && written.contains(&c.name))
                    .map(|c| c.name.clone())
                    .collect();
                (written, identity)
            }
            Ok(_) => (all, Vec::new()),
            Err(e) => {
                debug!(error = %e, "Destination columns unavailable, writing all source columns");
                let identity = if assume_id_identity {
                    id_column(&all).into_iter().collect()
                } else {
                    Vec::new()
                };
                (all, identity)
            }
        };

        let types: HashMap<&str, &str> = source
            .iter()
            .map(|c| (c.name.as_str(), c.data_type.as_str()))
            .collect();
        let binary = written
            .iter()
            .filter(|c| is_binary_column(c, types.get(c.as_str()).copied()))
            .cloned()
            .collect();

        Self {
            written,
            identity,
            binary,
        }
    }

    fn overrides_identity(&self) -> bool {
        !self.identity.is_empty()
    }

    /// 更新列：写入列去掉主键和标识列
    fn update_columns(&self, key_column: &str) -> Vec<String> {
        self.written
            .iter()
            .filter(|c| c.as_str() != key_column && !self.identity.contains(c))
            .cloned()
            .collect()
    }

    /// 二进制列统一转换为 `\x` 十六进制文本
    fn prepare(&self, row: &Record) -> Record {
        let mut prepared = row.clone();
        for column in &self.binary {
            if let Some(value) = prepared.get_mut(column) {
                *value = normalize_binary_value(value);
            }
        }
        prepared
    }
}

/// 列表中名为 id 的列（不区分大小写）
fn id_column(columns: &[String]) -> Option<String> {
    columns.iter().find(|c| c.eq_ignore_ascii_case("id")).cloned()
}

fn key_of(row: &Record, column: &str) -> String {
    row.get(column).and_then(key_text).unwrap_or_default()
}

fn first_errors(errors: &[String]) -> String {
    errors
        .iter()
        .take(MAX_ERROR_DETAILS)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("; ")
}

impl SyncEngine {
    pub fn new(local: Arc<dyn TableStore>, cloud: Arc<dyn TableStore>, tables: Vec<String>) -> Self {
        Self {
            local,
            cloud,
            tables,
        }
    }

    /// 参与同步的表（按依赖顺序）
    pub fn tables(&self) -> &[String] {
        &self.tables
    }

    fn store(&self, side: DatabaseSide) -> &Arc<dyn TableStore> {
        match side {
            DatabaseSide::Local => &self.local,
            DatabaseSide::Cloud => &self.cloud,
        }
    }

    pub async fn test_local_connection(&self) -> bool {
        self.test_connection(DatabaseSide::Local).await
    }

    pub async fn test_cloud_connection(&self) -> bool {
        self.test_connection(DatabaseSide::Cloud).await
    }

    async fn test_connection(&self, side: DatabaseSide) -> bool {
        match self.store(side).ping().await {
            Ok(()) => true,
            Err(e) => {
                warn!(?side, error = %e, "Database connection test failed");
                false
            }
        }
    }

    /// 各表行数；连接失败时返回空列表，单表计数失败记为 0
    pub async fn table_info(&self, side: DatabaseSide) -> Vec<TableInfo> {
        let store = self.store(side);
        if let Err(e) = store.ping().await {
            warn!(?side, error = %e, "Cannot read table info");
            return Vec::new();
        }

        let mut infos = Vec::with_capacity(self.tables.len());
        for table in &self.tables {
            let row_count = match TableName::parse(table) {
                Ok(name) => store.count_rows(&name).await.unwrap_or_else(|e| {
                    debug!(table = %table, error = %e, "Row count failed");
                    0
                }),
                Err(_) => 0,
            };
            infos.push(TableInfo {
                table_name: table.clone(),
                row_count,
                last_sync: None,
            });
        }
        infos
    }

    // ====== 推送：本地 → 云端 ======

    /// 推送单张表
    pub async fn push_table(&self, table: &str) -> SyncResult {
        let mut result = SyncResult::failed("");
        let outcome = match TableName::parse(table) {
            Ok(name) => self.push_rows(&name, &mut result).await,
            Err(e) => Err(StoreError::new(None, e.to_string())),
        };

        if let Err(e) = outcome {
            warn!(table, error = %e, "Push failed");
            result.success = false;
            result.message = format!("Error syncing {}: {}", table, e);
            result.errors.push(e.message);
        }
        result
    }

    async fn push_rows(&self, table: &TableName, result: &mut SyncResult) -> StoreResult<()> {
        if !self.local.table_exists(table).await? {
            result.message = format!("Table {} does not exist in local database.", table);
            return Ok(());
        }

        if self.local.count_rows(table).await? == 0 {
            result.success = true;
            result.message = format!("Table {} has no data to sync.", table);
            return Ok(());
        }

        let source = self.local.columns(table).await.unwrap_or_default();
        let rows = self.local.fetch_rows(table).await?;
        let Some(first_row) = rows.first() else {
            result.success = true;
            result.message = format!("No data to sync from {}.", table);
            return Ok(());
        };

        self.cloud.ping().await?;

        let plan = ColumnPlan::build(&source, first_row, self.cloud.columns(table).await, true);
        let all_columns: Vec<String> = first_row.keys().cloned().collect();
        let key_column = match self.cloud.primary_key(table).await {
            Ok(pk) => pk.or_else(|| id_column(&all_columns)),
            Err(e) => {
                result.errors.push(format!(
                    "Warning: Could not determine primary key for {}: {}",
                    table, e
                ));
                id_column(&all_columns)
            }
        }
        .filter(|pk| plan.written.contains(pk));
        let update_columns = key_column
            .as_deref()
            .map(|pk| plan.update_columns(pk))
            .unwrap_or_default();

        let (mut inserted, mut updated, mut skipped) = (0u64, 0u64, 0u64);
        for row in &rows {
            let prepared = plan.prepare(row);
            let outcome = self
                .upsert(table, key_column.as_deref(), &update_columns, &plan, &prepared)
                .await;
            match outcome {
                Ok(WriteOutcome::Inserted) => inserted += 1,
                Ok(WriteOutcome::Updated) => updated += 1,
                Ok(WriteOutcome::Unchanged) => {}
                Err(e) => {
                    skipped += 1;
                    result
                        .errors
                        .push(push_row_error(table, key_column.as_deref(), row, &e));
                }
            }
        }

        self.realign(&*self.cloud, table, &plan).await;
        sync_metrics::record_table_sync(table.as_str(), SyncDirection::Push, inserted, updated, skipped);
        info!(table = %table, inserted, updated, skipped, "Table pushed");

        result.success = true;
        result.rows_synced = inserted + updated;
        result.rows_skipped = skipped;

        let mut parts = Vec::new();
        match (inserted, updated) {
            (0, 0) => {}
            (i, 0) => parts.push(format!("{} inserted", i)),
            (0, u) => parts.push(format!("{} updated", u)),
            (i, u) => parts.push(format!("{} inserted, {} updated", i, u)),
        }
        if skipped > 0 {
            parts.push(format!("{} skipped", skipped));
            if !result.errors.is_empty() {
                parts.push(format!("Errors: {}", first_errors(&result.errors)));
            }
        }

        result.message = if parts.is_empty() {
            format!("No changes needed for {}.", table)
        } else {
            format!("Synced {}: {}.", table, parts.join(", "))
        };
        Ok(())
    }

    async fn upsert(
        &self,
        table: &TableName,
        key_column: Option<&str>,
        update_columns: &[String],
        plan: &ColumnPlan,
        row: &Record,
    ) -> StoreResult<WriteOutcome> {
        if let Some(pk) = key_column {
            if update_columns.is_empty() {
                if self.cloud.row_exists(table, pk, row).await? {
                    return Ok(WriteOutcome::Unchanged);
                }
            } else if self.cloud.update_row(table, pk, update_columns, row).await? > 0 {
                return Ok(WriteOutcome::Updated);
            }
        }

        self.cloud
            .insert_row(table, &plan.written, row, plan.overrides_identity())
            .await?;
        Ok(WriteOutcome::Inserted)
    }

    /// 按顺序推送全部表
    pub async fn push_all(&self, progress: Option<&mut ProgressFn<'_>>) -> SyncResult {
        self.run_all(SyncDirection::Push, progress).await
    }

    // ====== 拉取：云端 → 本地 ======

    /// 拉取单张表
    pub async fn pull_table(&self, table: &str) -> SyncResult {
        let mut result = SyncResult::failed("");
        let outcome = match TableName::parse(table) {
            Ok(name) => self.pull_rows(&name, &mut result).await,
            Err(e) => Err(StoreError::new(None, e.to_string())),
        };

        if let Err(e) = outcome {
            warn!(table, error = %e, "Pull failed");
            result.success = false;
            result.message = format!("Error pulling {}: {}", table, e);
            result.errors.push(e.message);
        }
        result
    }

    async fn pull_rows(&self, table: &TableName, result: &mut SyncResult) -> StoreResult<()> {
        if !self.cloud.table_exists(table).await? {
            result.message = format!("Table {} does not exist in Azure database.", table);
            return Ok(());
        }

        if self.cloud.count_rows(table).await? == 0 {
            result.success = true;
            result.message = format!("Table {} has no data to pull from Azure.", table);
            return Ok(());
        }

        let source = self.cloud.columns(table).await.unwrap_or_default();
        let rows = self.cloud.fetch_rows(table).await?;
        let Some(first_row) = rows.first() else {
            result.success = true;
            result.message = format!("No data to pull from {}.", table);
            return Ok(());
        };

        self.local.ping().await?;

        let plan = ColumnPlan::build(&source, first_row, self.local.columns(table).await, false);
        let all_columns: Vec<String> = first_row.keys().cloned().collect();

        let key_column = match self.local.primary_key(table).await {
            Ok(pk) => pk.or_else(|| id_column(&all_columns)),
            Err(e) => {
                result.errors.push(format!(
                    "Warning: Could not check existing keys for {}: {}",
                    table, e
                ));
                None
            }
        };
        let existing: HashSet<String> = match key_column.as_deref() {
            Some(pk) => match self.local.key_values(table, pk).await {
                Ok(keys) => keys.into_iter().collect(),
                Err(e) => {
                    result.errors.push(format!(
                        "Warning: Could not check existing keys for {}: {}",
                        table, e
                    ));
                    HashSet::new()
                }
            },
            None => HashSet::new(),
        };
        let key_column = key_column.filter(|pk| all_columns.contains(pk));

        let (mut inserted, mut skipped) = (0u64, 0u64);
        let mut skip_details: Vec<String> = Vec::new();
        for row in &rows {
            if let Some(pk) = key_column.as_deref()
                && !existing.is_empty()
                && let Some(key) = row.get(pk).and_then(key_text)
                && existing.contains(&key)
            {
                skipped += 1;
                let mut detail = format!("{}={}", pk, key);
                if let Some(name) = row.get("name").and_then(key_text) {
                    detail.push_str(&format!(" (name='{}')", name));
                }
                skip_details.push(detail);
                continue;
            }

            let prepared = plan.prepare(row);
            match self
                .local
                .insert_row(table, &plan.written, &prepared, plan.overrides_identity())
                .await
            {
                Ok(()) => inserted += 1,
                Err(e) => match e.kind() {
                    DbErrorKind::UniqueViolation => {
                        skipped += 1;
                        if let Some(pk) = key_column.as_deref() {
                            result.errors.push(format!(
                                "Skipped duplicate {} with {}={} (already exists in Local)",
                                table,
                                pk,
                                key_of(row, pk)
                            ));
                        }
                    }
                    DbErrorKind::ForeignKeyViolation | DbErrorKind::IdentityConflict => {
                        skipped += 1;
                        result
                            .errors
                            .push(format!("Skipped row in {}: {}", table, e.message));
                    }
                    DbErrorKind::Other => result.errors.push(match &e.code {
                        Some(code) => {
                            format!("Error inserting row in {}: {} (Error #{})", table, e.message, code)
                        }
                        None => format!("Error inserting row in {}: {}", table, e.message),
                    }),
                },
            }
        }

        self.realign(&*self.local, table, &plan).await;
        sync_metrics::record_table_sync(table.as_str(), SyncDirection::Pull, inserted, 0, skipped);
        info!(table = %table, inserted, skipped, "Table pulled");

        result.success = true;
        result.rows_synced = inserted;
        result.rows_skipped = skipped;
        result.message = pull_message(table, inserted, skipped, &skip_details, &result.errors);
        Ok(())
    }

    /// 按顺序拉取全部表
    pub async fn pull_all(&self, progress: Option<&mut ProgressFn<'_>>) -> SyncResult {
        self.run_all(SyncDirection::Pull, progress).await
    }

    // ====== 批量 ======

    async fn run_all(
        &self,
        direction: SyncDirection,
        mut progress: Option<&mut ProgressFn<'_>>,
    ) -> SyncResult {
        let started = Instant::now();
        let total = self.tables.len();
        let mut result = SyncResult::succeeded("");
        let (mut synced, mut skipped, mut processed) = (0u64, 0u64, 0usize);

        info!(direction = direction.as_str(), tables = total, "Batch sync started");

        for (i, table) in self.tables.iter().enumerate() {
            if let Some(report) = progress.as_deref_mut() {
                report(&SyncProgress {
                    current_table: i + 1,
                    total_tables: total,
                    current_table_name: table.clone(),
                    rows_synced: synced,
                    rows_skipped: skipped,
                });
            }

            let table_result = match direction {
                SyncDirection::Push => self.push_table(table).await,
                SyncDirection::Pull => self.pull_table(table).await,
            };

            if table_result.success {
                synced += table_result.rows_synced;
                skipped += table_result.rows_skipped;
                processed += 1;
            } else if !table_result.errors.is_empty() {
                result.success = false;
                result.errors.extend(table_result.errors);
            }
        }

        if let Some(report) = progress.as_deref_mut() {
            report(&SyncProgress {
                current_table: total,
                total_tables: total,
                current_table_name: "Completed".to_string(),
                rows_synced: synced,
                rows_skipped: skipped,
            });
        }

        result.rows_synced = synced;
        result.rows_skipped = skipped;
        result.message = match direction {
            SyncDirection::Push => format!(
                "Sync completed. Processed {}/{} tables. Synced {} rows, skipped {} rows.",
                processed, total, synced, skipped
            ),
            SyncDirection::Pull => format!(
                "Pull completed: {} rows pulled from Azure to Local, {} rows skipped across {} tables.",
                synced, skipped, processed
            ),
        };

        sync_metrics::record_batch_duration(direction, started.elapsed().as_secs_f64());
        info!(
            direction = direction.as_str(),
            processed,
            synced,
            skipped,
            success = result.success,
            "Batch sync finished"
        );
        result
    }

    /// 显式写入标识列后推进序列
    async fn realign(&self, store: &dyn TableStore, table: &TableName, plan: &ColumnPlan) {
        for column in &plan.identity {
            if let Err(e) = store.realign_identity(table, column).await {
                warn!(table = %table, column = %column, error = %e, "Identity realign failed");
            }
        }
    }
}

fn push_row_error(table: &TableName, key_column: Option<&str>, row: &Record, e: &StoreError) -> String {
    match e.kind() {
        DbErrorKind::IdentityConflict => {
            format!("Skipped row with identity conflict in {}: {}", table, e.message)
        }
        DbErrorKind::ForeignKeyViolation => match key_column {
            Some(pk) => format!(
                "Skipped row in {} with {}={} due to foreign key constraint: {}",
                table,
                pk,
                key_of(row, pk),
                e.message
            ),
            None => format!(
                "Skipped row in {} due to foreign key constraint: {}",
                table, e.message
            ),
        },
        _ => match &e.code {
            Some(code) => format!("Error syncing row in {}: {} (Error #{})", table, e.message, code),
            None => format!("Error syncing row in {}: {}", table, e.message),
        },
    }
}

fn pull_message(
    table: &TableName,
    inserted: u64,
    skipped: u64,
    skip_details: &[String],
    errors: &[String],
) -> String {
    let head = format!("Pulled {} rows from Azure to Local for {}.", inserted, table);
    if skipped == 0 {
        return head;
    }

    let mut parts = Vec::new();
    if !skip_details.is_empty() {
        let mut seen = HashSet::new();
        let unique: Vec<&str> = skip_details
            .iter()
            .map(String::as_str)
            .filter(|d| seen.insert(*d))
            .take(MAX_SKIP_DETAILS)
            .collect();
        parts.push(format!("Skipped existing: {}", unique.join(", ")));
        if skip_details.len() > MAX_SKIP_DETAILS {
            parts.push(format!("... and {} more", skip_details.len() - MAX_SKIP_DETAILS));
        }
    }
    if !errors.is_empty() {
        parts.push(format!("Errors: {}", first_errors(errors)));
    }

    if parts.is_empty() {
        format!("{} {} rows skipped (duplicates).", head, skipped)
    } else {
        format!("{} {} rows skipped. {}", head, skipped, parts.join(". "))
    }
}

#[cfg(test)]
mod tests;
