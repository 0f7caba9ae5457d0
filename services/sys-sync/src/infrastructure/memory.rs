//! 内存表存储，供引擎测试使用
//!
//! 模拟 Postgres 的行为：主键冲突返回 23505，被标记的外键值返回 23503，
//! 未显式允许时写入标识列返回 428C9。

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::{ColumnInfo, Record, StoreError, StoreResult, TableName, TableStore, key_text};

#[derive(Debug, Clone, Default)]
struct MemoryTable {
    columns: Vec<ColumnInfo>,
    primary_key: Option<String>,
    rows: Vec<Record>,
}

#[derive(Default)]
pub struct MemoryStore {
    offline: AtomicBool,
    tables: Mutex<HashMap<String, MemoryTable>>,
    fk_rejects: Mutex<HashSet<(String, String)>>,
    realigned: Mutex<Vec<(String, String)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册一张表；列以 `(名称, 类型, 是否标识列)` 描述
    pub fn with_table(
        self,
        name: &str,
        columns: &[(&str, &str, bool)],
        primary_key: Option<&str>,
        rows: Vec<Record>,
    ) -> Self {
        let table = MemoryTable {
            columns: columns
                .iter()
                .map(|(name, data_type, is_identity)| ColumnInfo {
                    name: name.to_string(),
                    data_type: data_type.to_string(),
                    is_identity: *is_identity,
                })
                .collect(),
            primary_key: primary_key.map(str::to_string),
            rows,
        };
        self.tables.lock().unwrap().insert(name.to_string(), table);
        self
    }

    /// 写入该主键值的行时报外键冲突
    pub fn reject_foreign_key(self, table: &str, key: &str) -> Self {
        self.fk_rejects
            .lock()
            .unwrap()
            .insert((table.to_string(), key.to_string()));
        self
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn rows(&self, table: &str) -> Vec<Record> {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .map(|t| t.rows.clone())
            .unwrap_or_default()
    }

    pub fn realigned(&self) -> Vec<(String, String)> {
        self.realigned.lock().unwrap().clone()
    }

    fn check_online(&self) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(StoreError::new(Some("08006"), "connection refused"))
        } else {
            Ok(())
        }
    }

    fn with<T>(
        &self,
        table: &TableName,
        f: impl FnOnce(&mut MemoryTable) -> StoreResult<T>,
    ) -> StoreResult<T> {
        self.check_online()?;
        let mut tables = self.tables.lock().unwrap();
        match tables.get_mut(table.as_str()) {
            Some(t) => f(t),
            None => Err(StoreError::new(
                Some("42P01"),
                format!("relation \"{}\" does not exist", table),
            )),
        }
    }

    fn check_foreign_key(&self, table: &TableName, key_column: Option<&str>, row: &Record) -> StoreResult<()> {
        let key = key_column.and_then(|k| row.get(k)).and_then(key_text);
        if let Some(key) = key
            && self
                .fk_rejects
                .lock()
                .unwrap()
                .contains(&(table.to_string(), key))
        {
            return Err(StoreError::new(
                Some("23503"),
                format!("insert or update on table \"{}\" violates foreign key constraint", table),
            ));
        }
        Ok(())
    }
}

fn same_key(a: &Record, b: &Record, column: &str) -> bool {
    let left = a.get(column).and_then(key_text);
    left.is_some() && left == b.get(column).and_then(key_text)
}

#[async_trait]
impl TableStore for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        self.check_online()
    }

    async fn table_exists(&self, table: &TableName) -> StoreResult<bool> {
        self.check_online()?;
        Ok(self.tables.lock().unwrap().contains_key(table.as_str()))
    }

    async fn count_rows(&self, table: &TableName) -> StoreResult<i64> {
        self.with(table, |t| Ok(t.rows.len() as i64))
    }

    async fn columns(&self, table: &TableName) -> StoreResult<Vec<ColumnInfo>> {
        self.check_online()?;
        Ok(self
            .tables
            .lock()
            .unwrap()
            .get(table.as_str())
            .map(|t| t.columns.clone())
            .unwrap_or_default())
    }

    async fn primary_key(&self, table: &TableName) -> StoreResult<Option<String>> {
        self.check_online()?;
        Ok(self
            .tables
            .lock()
            .unwrap()
            .get(table.as_str())
            .and_then(|t| t.primary_key.clone()))
    }

    async fn fetch_rows(&self, table: &TableName) -> StoreResult<Vec<Record>> {
        self.with(table, |t| Ok(t.rows.clone()))
    }

    async fn key_values(&self, table: &TableName, column: &str) -> StoreResult<Vec<String>> {
        self.with(table, |t| {
            Ok(t.rows
                .iter()
                .filter_map(|r| r.get(column).and_then(key_text))
                .collect())
        })
    }

    async fn update_row(
        &self,
        table: &TableName,
        key_column: &str,
        columns: &[String],
        row: &Record,
    ) -> StoreResult<u64> {
        self.check_foreign_key(table, Some(key_column), row)?;
        self.with(table, |t| {
            let mut affected = 0;
            for existing in t.rows.iter_mut().filter(|r| same_key(r, row, key_column)) {
                for column in columns {
                    existing.insert(column.clone(), row.get(column).cloned().unwrap_or(Value::Null));
                }
                affected += 1;
            }
            Ok(affected)
        })
    }

    async fn row_exists(&self, table: &TableName, key_column: &str, row: &Record) -> StoreResult<bool> {
        self.with(table, |t| Ok(t.rows.iter().any(|r| same_key(r, row, key_column))))
    }

    async fn insert_row(
        &self,
        table: &TableName,
        columns: &[String],
        row: &Record,
        override_identity: bool,
    ) -> StoreResult<()> {
        let primary_key = self.primary_key(table).await?;
        self.check_foreign_key(table, primary_key.as_deref(), row)?;
        self.with(table, |t| {
            let writes_identity = t
                .columns
                .iter()
                .any(|c| c.is_identity && columns.contains(&c.name));
            if writes_identity && !override_identity {
                return Err(StoreError::new(
                    Some("428C9"),
                    "cannot insert a non-DEFAULT value into an identity column",
                ));
            }
            if let Some(pk) = &t.primary_key
                && t.rows.iter().any(|r| same_key(r, row, pk))
            {
                return Err(StoreError::new(
                    Some("23505"),
                    format!("duplicate key value violates unique constraint \"{}_pkey\"", table),
                ));
            }

            let mut record = Record::new();
            for column in &t.columns {
                let value = if columns.contains(&column.name) {
                    row.get(&column.name).cloned().unwrap_or(Value::Null)
                } else {
                    Value::Null
                };
                record.insert(column.name.clone(), value);
            }
            t.rows.push(record);
            Ok(())
        })
    }

    async fn realign_identity(&self, table: &TableName, column: &str) -> StoreResult<()> {
        self.check_online()?;
        self.realigned
            .lock()
            .unwrap()
            .push((table.to_string(), column.to_string()));
        Ok(())
    }
}
