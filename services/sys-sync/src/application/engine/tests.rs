use std::sync::Arc;

use serde_json::{Value, json};

use super::*;
use crate::domain::MockTableStore;
use crate::infrastructure::memory::MemoryStore;

const COLOR_COLUMNS: &[(&str, &str, bool)] = &[
    ("id", "integer", true),
    ("name", "character varying", false),
    ("hex_value", "character", false),
];

const ROLE_COLUMNS: &[(&str, &str, bool)] = &[
    ("id", "integer", true),
    ("name", "character varying", false),
    ("description", "text", false),
];

fn record(value: Value) -> Record {
    value.as_object().cloned().unwrap()
}

fn color(id: i64, name: &str) -> Record {
    record(json!({ "id": id, "name": name, "hex_value": "#000000" }))
}

fn role(id: i64, name: &str) -> Record {
    record(json!({ "id": id, "name": name, "description": null }))
}

fn engine(
    local: MemoryStore,
    cloud: MemoryStore,
    tables: &[&str],
) -> (SyncEngine, Arc<MemoryStore>, Arc<MemoryStore>) {
    let local = Arc::new(local);
    let cloud = Arc::new(cloud);
    let engine = SyncEngine::new(
        local.clone(),
        cloud.clone(),
        tables.iter().map(|t| t.to_string()).collect(),
    );
    (engine, local, cloud)
}

// ====== 推送 ======

#[tokio::test]
async fn test_push_inserts_missing_rows_and_realigns_identity() {
    let local = MemoryStore::new().with_table(
        "tbl_colors",
        COLOR_COLUMNS,
        Some("id"),
        vec![color(1, "Red"), color(2, "Blue")],
    );
    let cloud = MemoryStore::new().with_table("tbl_colors", COLOR_COLUMNS, Some("id"), vec![]);
    let (engine, _, cloud) = engine(local, cloud, &["tbl_colors"]);

    let result = engine.push_table("tbl_colors").await;

    assert!(result.success);
    assert_eq!(result.message, "Synced tbl_colors: 2 inserted.");
    assert_eq!(result.rows_synced, 2);
    assert_eq!(cloud.rows("tbl_colors").len(), 2);
    assert_eq!(
        cloud.realigned(),
        vec![("tbl_colors".to_string(), "id".to_string())]
    );
}

#[tokio::test]
async fn test_push_updates_existing_rows_by_primary_key() {
    let local = MemoryStore::new().with_table(
        "tbl_colors",
        COLOR_COLUMNS,
        Some("id"),
        vec![color(1, "Red"), color(2, "Blue")],
    );
    let cloud =
        MemoryStore::new().with_table("tbl_colors", COLOR_COLUMNS, Some("id"), vec![color(1, "Old")]);
    let (engine, _, cloud) = engine(local, cloud, &["tbl_colors"]);

    let result = engine.push_table("tbl_colors").await;

    assert_eq!(result.message, "Synced tbl_colors: 1 inserted, 1 updated.");
    assert_eq!(result.rows_synced, 2);
    let rows = cloud.rows("tbl_colors");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["name"], json!("Red"));
}

#[tokio::test]
async fn test_push_skips_rows_rejected_by_foreign_key() {
    let columns = &[
        ("id", "integer", true),
        ("name", "character varying", false),
        ("product_id", "integer", false),
    ];
    let rows = vec![
        record(json!({ "id": 1, "name": "Tee S", "product_id": 1 })),
        record(json!({ "id": 2, "name": "Tee M", "product_id": 99 })),
    ];
    let local = MemoryStore::new().with_table("tbl_variants", columns, Some("id"), rows);
    let cloud = MemoryStore::new()
        .with_table("tbl_variants", columns, Some("id"), vec![])
        .reject_foreign_key("tbl_variants", "2");
    let (engine, _, cloud) = engine(local, cloud, &["tbl_variants"]);

    let result = engine.push_table("tbl_variants").await;

    assert!(result.success);
    assert_eq!(result.rows_synced, 1);
    assert_eq!(result.rows_skipped, 1);
    assert!(result.message.starts_with(
        "Synced tbl_variants: 1 inserted, 1 skipped, Errors: Skipped row in tbl_variants with id=2 due to foreign key constraint"
    ));
    assert_eq!(cloud.rows("tbl_variants").len(), 1);
}

#[tokio::test]
async fn test_push_missing_and_empty_tables() {
    let local = MemoryStore::new().with_table("tbl_colors", COLOR_COLUMNS, Some("id"), vec![]);
    let (engine, _, _) = engine(local, MemoryStore::new(), &[]);

    let missing = engine.push_table("tbl_sizes").await;
    assert!(!missing.success);
    assert_eq!(missing.message, "Table tbl_sizes does not exist in local database.");
    assert!(missing.errors.is_empty());

    let empty = engine.push_table("tbl_colors").await;
    assert!(empty.success);
    assert_eq!(empty.message, "Table tbl_colors has no data to sync.");
}

#[tokio::test]
async fn test_push_rejects_unsafe_table_name() {
    let (engine, _, _) = engine(MemoryStore::new(), MemoryStore::new(), &[]);

    let result = engine.push_table("tbl_users; DROP TABLE tbl_roles").await;

    assert!(!result.success);
    assert!(result.message.starts_with("Error syncing tbl_users; DROP TABLE tbl_roles:"));
    assert_eq!(result.errors.len(), 1);
}

#[tokio::test]
async fn test_push_writes_shared_columns_and_normalizes_binary() {
    let local = MemoryStore::new().with_table(
        "tbl_products",
        &[
            ("id", "integer", true),
            ("name", "character varying", false),
            ("image", "bytea", false),
            ("legacy_code", "text", false),
        ],
        Some("id"),
        vec![record(json!({
            "id": 1,
            "name": "Polo",
            "image": "89-50-4E-47",
            "legacy_code": "X1"
        }))],
    );
    let cloud = MemoryStore::new().with_table(
        "tbl_products",
        &[
            ("id", "integer", true),
            ("name", "character varying", false),
            ("image", "bytea", false),
        ],
        Some("id"),
        vec![],
    );
    let (engine, _, cloud) = engine(local, cloud, &["tbl_products"]);

    let result = engine.push_table("tbl_products").await;

    assert_eq!(result.message, "Synced tbl_products: 1 inserted.");
    let rows = cloud.rows("tbl_products");
    assert_eq!(rows[0]["image"], json!("\\x89504e47"));
    assert!(!rows[0].contains_key("legacy_code"));
}

#[tokio::test]
async fn test_push_key_only_rows_are_left_alone() {
    let columns = &[("id", "integer", true)];
    let local = MemoryStore::new().with_table(
        "tbl_tags",
        columns,
        Some("id"),
        vec![record(json!({ "id": 1 })), record(json!({ "id": 2 }))],
    );
    let cloud =
        MemoryStore::new().with_table("tbl_tags", columns, Some("id"), vec![record(json!({ "id": 1 }))]);
    let (engine, _, cloud) = engine(local, cloud, &["tbl_tags"]);

    let result = engine.push_table("tbl_tags").await;

    assert_eq!(result.message, "Synced tbl_tags: 1 inserted.");
    assert_eq!(result.rows_synced, 1);
    assert_eq!(cloud.rows("tbl_tags").len(), 2);
}

#[tokio::test]
async fn test_push_fails_when_cloud_is_unreachable() {
    let local =
        MemoryStore::new().with_table("tbl_colors", COLOR_COLUMNS, Some("id"), vec![color(1, "Red")]);
    let cloud = MemoryStore::new();
    cloud.set_offline(true);
    let (engine, _, _) = engine(local, cloud, &["tbl_colors"]);

    let result = engine.push_table("tbl_colors").await;

    assert!(!result.success);
    assert_eq!(result.message, "Error syncing tbl_colors: connection refused");
    assert_eq!(result.errors, vec!["connection refused".to_string()]);
}

// ====== 拉取 ======

#[tokio::test]
async fn test_pull_inserts_only_rows_missing_locally() {
    let cloud = MemoryStore::new().with_table(
        "tbl_roles",
        ROLE_COLUMNS,
        Some("id"),
        vec![role(1, "admin"), role(2, "seller"), role(3, "cashier")],
    );
    let local =
        MemoryStore::new().with_table("tbl_roles", ROLE_COLUMNS, Some("id"), vec![role(1, "admin")]);
    let (engine, local, _) = engine(local, cloud, &["tbl_roles"]);

    let result = engine.pull_table("tbl_roles").await;

    assert!(result.success);
    assert_eq!(
        result.message,
        "Pulled 2 rows from Azure to Local for tbl_roles. 1 rows skipped. Skipped existing: id=1 (name='admin')"
    );
    assert_eq!(result.rows_synced, 2);
    assert_eq!(result.rows_skipped, 1);
    assert_eq!(local.rows("tbl_roles").len(), 3);
    assert_eq!(
        local.realigned(),
        vec![("tbl_roles".to_string(), "id".to_string())]
    );
}

#[tokio::test]
async fn test_pull_reports_foreign_key_skips() {
    let columns = &[("id", "integer", true), ("product_id", "integer", false)];
    let cloud = MemoryStore::new().with_table(
        "tbl_variants",
        columns,
        Some("id"),
        vec![
            record(json!({ "id": 1, "product_id": 1 })),
            record(json!({ "id": 2, "product_id": 42 })),
        ],
    );
    let local = MemoryStore::new()
        .with_table("tbl_variants", columns, Some("id"), vec![])
        .reject_foreign_key("tbl_variants", "2");
    let (engine, _, _) = engine(local, cloud, &["tbl_variants"]);

    let result = engine.pull_table("tbl_variants").await;

    assert_eq!(
        result.message,
        "Pulled 1 rows from Azure to Local for tbl_variants. 1 rows skipped. Errors: Skipped row in tbl_variants: insert or update on table \"tbl_variants\" violates foreign key constraint"
    );
}

#[tokio::test]
async fn test_pull_lists_at_most_five_existing_rows() {
    let columns = &[("id", "integer", true), ("label", "text", false)];
    let rows: Vec<Record> = (1..=7)
        .map(|id| record(json!({ "id": id, "label": "XL" })))
        .collect();
    let cloud = MemoryStore::new().with_table("tbl_sizes", columns, Some("id"), rows.clone());
    let local = MemoryStore::new().with_table("tbl_sizes", columns, Some("id"), rows);
    let (engine, _, _) = engine(local, cloud, &["tbl_sizes"]);

    let result = engine.pull_table("tbl_sizes").await;

    assert_eq!(
        result.message,
        "Pulled 0 rows from Azure to Local for tbl_sizes. 7 rows skipped. Skipped existing: id=1, id=2, id=3, id=4, id=5. ... and 2 more"
    );
}

#[tokio::test]
async fn test_pull_missing_cloud_table() {
    let (engine, _, _) = engine(MemoryStore::new(), MemoryStore::new(), &[]);

    let result = engine.pull_table("tbl_roles").await;

    assert!(!result.success);
    assert_eq!(result.message, "Table tbl_roles does not exist in Azure database.");
}

// ====== 批量 ======

#[tokio::test]
async fn test_push_all_reports_progress_in_order() {
    let local = MemoryStore::new()
        .with_table("tbl_roles", ROLE_COLUMNS, Some("id"), vec![role(1, "admin")])
        .with_table("tbl_colors", COLOR_COLUMNS, Some("id"), vec![]);
    let cloud = MemoryStore::new()
        .with_table("tbl_roles", ROLE_COLUMNS, Some("id"), vec![])
        .with_table("tbl_colors", COLOR_COLUMNS, Some("id"), vec![]);
    let (engine, _, _) = engine(local, cloud, &["tbl_roles", "tbl_colors"]);

    let mut seen = Vec::new();
    let mut report = |p: &SyncProgress| seen.push((p.current_table, p.current_table_name.clone()));
    let result = engine
        .push_all(Some(&mut report as &mut ProgressFn<'_>))
        .await;

    assert!(result.success);
    assert_eq!(
        result.message,
        "Sync completed. Processed 2/2 tables. Synced 1 rows, skipped 0 rows."
    );
    assert_eq!(
        seen,
        vec![
            (1, "tbl_roles".to_string()),
            (2, "tbl_colors".to_string()),
            (2, "Completed".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_push_all_counts_only_processed_tables() {
    let local = MemoryStore::new().with_table("tbl_roles", ROLE_COLUMNS, Some("id"), vec![role(1, "admin")]);
    let cloud = MemoryStore::new().with_table("tbl_roles", ROLE_COLUMNS, Some("id"), vec![]);
    let (engine, _, _) = engine(local, cloud, &["tbl_roles", "tbl_missing"]);

    let result = engine.push_all(None).await;

    // 缺表只有消息没有错误，不影响整体成功
    assert!(result.success);
    assert_eq!(
        result.message,
        "Sync completed. Processed 1/2 tables. Synced 1 rows, skipped 0 rows."
    );
}

#[tokio::test]
async fn test_push_all_collects_table_errors() {
    let local = MemoryStore::new()
        .with_table("tbl_roles", ROLE_COLUMNS, Some("id"), vec![role(1, "admin")])
        .with_table("tbl_colors", COLOR_COLUMNS, Some("id"), vec![color(1, "Red")]);
    let cloud = MemoryStore::new();
    cloud.set_offline(true);
    let (engine, _, _) = engine(local, cloud, &["tbl_roles", "tbl_colors"]);

    let result = engine.push_all(None).await;

    assert!(!result.success);
    assert_eq!(result.errors.len(), 2);
    assert_eq!(
        result.message,
        "Sync completed. Processed 0/2 tables. Synced 0 rows, skipped 0 rows."
    );
}

#[tokio::test]
async fn test_pull_all_summary() {
    let cloud = MemoryStore::new().with_table(
        "tbl_roles",
        ROLE_COLUMNS,
        Some("id"),
        vec![role(1, "admin"), role(2, "seller")],
    );
    let local =
        MemoryStore::new().with_table("tbl_roles", ROLE_COLUMNS, Some("id"), vec![role(1, "admin")]);
    let (engine, _, _) = engine(local, cloud, &["tbl_roles"]);

    let result = engine.pull_all(None).await;

    assert!(result.success);
    assert_eq!(
        result.message,
        "Pull completed: 1 rows pulled from Azure to Local, 1 rows skipped across 1 tables."
    );
}

// ====== 连接与表信息 ======

#[tokio::test]
async fn test_connection_checks() {
    let cloud = MemoryStore::new();
    cloud.set_offline(true);
    let (engine, _, _) = engine(MemoryStore::new(), cloud, &["tbl_roles"]);

    assert!(engine.test_local_connection().await);
    assert!(!engine.test_cloud_connection().await);
    assert!(engine.table_info(DatabaseSide::Cloud).await.is_empty());
}

#[tokio::test]
async fn test_table_info_counts_zero_on_error() {
    let mut local = MockTableStore::new();
    local.expect_ping().returning(|| Ok(()));
    local.expect_count_rows().returning(|table| {
        if table.as_str() == "tbl_roles" {
            Ok(5)
        } else {
            Err(StoreError::new(Some("42P01"), "relation does not exist"))
        }
    });
    let engine = SyncEngine::new(
        Arc::new(local),
        Arc::new(MemoryStore::new()),
        vec!["tbl_roles".to_string(), "tbl_sales".to_string()],
    );

    let info = engine.table_info(DatabaseSide::Local).await;

    assert_eq!(info.len(), 2);
    assert_eq!(info[0].row_count, 5);
    assert_eq!(info[1].row_count, 0);
    assert!(info.iter().all(|t| t.last_sync.is_none()));
}
