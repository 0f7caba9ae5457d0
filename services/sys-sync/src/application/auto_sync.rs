//! 定时自动推送
//!
//! 启动后等待 `initial_delay` 先推送一次，之后每个 `interval` 推送一次。
//! 同一时刻只允许一次同步；每次结束后广播 [`SyncCompleted`]。

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Local};
use serde::Serialize;
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use softwear_config::SyncConfig;

use crate::application::SyncEngine;
use crate::domain::{SyncCompleted, SyncResult};

const EVENT_CAPACITY: usize = 16;
const TRIGGER_BUSY: &str = "A sync operation is already in progress.";
const TIMER_BUSY: &str = "Sync already in progress";

/// 自动同步状态快照
#[derive(Debug, Clone, Serialize)]
pub struct AutoSyncStatus {
    pub enabled: bool,
    pub running: bool,
    pub last_sync_time: Option<DateTime<Local>>,
    pub last_status: String,
    pub interval_minutes: u64,
}

struct SyncState {
    last_sync_time: Option<DateTime<Local>>,
    last_status: String,
}

pub struct AutoSyncService {
    engine: Arc<SyncEngine>,
    interval: Duration,
    initial_delay: Duration,
    enabled: AtomicBool,
    running: AtomicBool,
    state: Mutex<SyncState>,
    cancel: std::sync::Mutex<Option<CancellationToken>>,
    events: broadcast::Sender<SyncCompleted>,
}

impl AutoSyncService {
    pub fn new(engine: Arc<SyncEngine>, interval: Duration, initial_delay: Duration) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            engine,
            interval,
            initial_delay,
            enabled: AtomicBool::new(true),
            running: AtomicBool::new(false),
            state: Mutex::new(SyncState {
                last_sync_time: None,
                last_status: "Not started".to_string(),
            }),
            cancel: std::sync::Mutex::new(None),
            events,
        }
    }

    pub fn from_config(engine: Arc<SyncEngine>, config: &SyncConfig) -> Self {
        Self::new(
            engine,
            Duration::from_secs(config.interval_secs),
            Duration::from_secs(config.initial_delay_secs),
        )
    }

    pub fn interval_minutes(&self) -> u64 {
        self.interval.as_secs() / 60
    }

    /// 订阅同步完成事件
    pub fn subscribe(&self) -> broadcast::Receiver<SyncCompleted> {
        self.events.subscribe()
    }

    /// 启动定时器；重复调用会先停掉上一个定时器
    pub fn start(self: &Arc<Self>) -> JoinHandle<()> {
        let token = CancellationToken::new();
        if let Some(previous) = self.replace_token(Some(token.clone())) {
            previous.cancel();
        }
        self.enabled.store(true, Ordering::SeqCst);
        info!(
            interval_minutes = self.interval_minutes(),
            "Background sync service started"
        );

        let service = Arc::clone(self);
        tokio::spawn(async move {
            let first_tick = Instant::now() + service.interval;

            tokio::select! {
                _ = token.cancelled() => return,
                _ = tokio::time::sleep(service.initial_delay) => {
                    service.trigger_sync().await;
                }
            }

            let mut ticker = tokio::time::interval_at(first_tick, service.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        if service.enabled.load(Ordering::SeqCst)
                            && !service.running.load(Ordering::SeqCst)
                        {
                            service.perform_sync(TIMER_BUSY).await;
                        }
                    }
                }
            }
        })
    }

    /// 停止定时器；正在进行的同步会跑完
    pub fn stop(&self) {
        if let Some(token) = self.replace_token(None) {
            token.cancel();
        }
        self.enabled.store(false, Ordering::SeqCst);
        info!("Background sync service stopped");
    }

    fn replace_token(&self, token: Option<CancellationToken>) -> Option<CancellationToken> {
        let mut guard = self.cancel.lock().unwrap_or_else(|p| p.into_inner());
        std::mem::replace(&mut *guard, token)
    }

    /// 手动触发一次推送
    pub async fn trigger_sync(&self) -> SyncResult {
        self.perform_sync(TRIGGER_BUSY).await
    }

    pub async fn status(&self) -> AutoSyncStatus {
        let state = self.state.lock().await;
        AutoSyncStatus {
            enabled: self.enabled.load(Ordering::SeqCst),
            running: self.running.load(Ordering::SeqCst),
            last_sync_time: state.last_sync_time,
            last_status: state.last_status.clone(),
            interval_minutes: self.interval_minutes(),
        }
    }

    /// `busy` 为已有同步在跑时返回的消息
    async fn perform_sync(&self, busy: &str) -> SyncResult {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return SyncResult::failed(busy);
        }

        self.state.lock().await.last_status = "Syncing...".to_string();
        info!(
            started_at = %Local::now().format("%Y-%m-%d %H:%M:%S"),
            "Starting automatic sync"
        );

        let result = self.run_push().await;
        self.running.store(false, Ordering::SeqCst);

        let sync_time = self.state.lock().await.last_sync_time;
        // 没有订阅者时发送失败，忽略
        let _ = self.events.send(SyncCompleted {
            result: result.clone(),
            sync_time,
        });
        result
    }

    async fn run_push(&self) -> SyncResult {
        let local_connected = self.engine.test_local_connection().await;
        let cloud_connected = self.engine.test_cloud_connection().await;

        if !local_connected {
            warn!("Local database connection failed, sync skipped");
            self.state.lock().await.last_status = "Failed: Local DB not connected".to_string();
            return SyncResult::failed("Local database connection failed. Sync skipped.");
        }
        if !cloud_connected {
            warn!("Cloud database connection failed, sync skipped");
            self.state.lock().await.last_status = "Failed: Azure DB not connected".to_string();
            return SyncResult::failed("Azure database connection failed. Sync skipped.");
        }

        // 在独立任务中执行，panic 只影响本次同步
        let engine = Arc::clone(&self.engine);
        match tokio::spawn(async move { engine.push_all(None).await }).await {
            Ok(result) => {
                let mut state = self.state.lock().await;
                state.last_sync_time = Some(Local::now());
                state.last_status = if result.success {
                    format!("Success: {} rows synced", result.rows_synced)
                } else {
                    format!("Completed with errors: {}", result.message)
                };
                info!(
                    synced = result.rows_synced,
                    skipped = result.rows_skipped,
                    message = %result.message,
                    "Automatic sync completed"
                );
                result
            }
            Err(e) => {
                error!(error = %e, "Automatic sync failed");
                self.state.lock().await.last_status = format!("Error: {}", e);
                SyncResult::failed(format!("Error during sync: {}", e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::memory::MemoryStore;
    use serde_json::json;

    const COLUMNS: &[(&str, &str, bool)] = &[("id", "integer", true), ("name", "text", false)];

    fn service(local_offline: bool, cloud_offline: bool) -> Arc<AutoSyncService> {
        let local = MemoryStore::new().with_table(
            "tbl_roles",
            COLUMNS,
            Some("id"),
            vec![json!({ "id": 1, "name": "admin" }).as_object().cloned().unwrap()],
        );
        let cloud = MemoryStore::new().with_table("tbl_roles", COLUMNS, Some("id"), vec![]);
        local.set_offline(local_offline);
        cloud.set_offline(cloud_offline);
        let engine = SyncEngine::new(
            Arc::new(local),
            Arc::new(cloud),
            vec!["tbl_roles".to_string()],
        );
        Arc::new(AutoSyncService::new(
            Arc::new(engine),
            Duration::from_secs(3600),
            Duration::from_secs(30),
        ))
    }

    #[tokio::test]
    async fn test_initial_status() {
        let status = service(false, false).status().await;
        assert!(status.enabled);
        assert!(!status.running);
        assert_eq!(status.last_status, "Not started");
        assert_eq!(status.interval_minutes, 60);
        assert!(status.last_sync_time.is_none());
    }

    #[tokio::test]
    async fn test_trigger_sync_pushes_and_broadcasts() {
        let service = service(false, false);
        let mut events = service.subscribe();

        let result = service.trigger_sync().await;

        assert!(result.success);
        assert_eq!(result.rows_synced, 1);
        let status = service.status().await;
        assert_eq!(status.last_status, "Success: 1 rows synced");
        assert!(status.last_sync_time.is_some());

        let event = events.recv().await.unwrap();
        assert_eq!(event.result, result);
        assert_eq!(event.sync_time, status.last_sync_time);
    }

    #[tokio::test]
    async fn test_trigger_sync_skips_when_local_is_down() {
        let service = service(true, false);

        let result = service.trigger_sync().await;

        assert!(!result.success);
        assert_eq!(result.message, "Local database connection failed. Sync skipped.");
        let status = service.status().await;
        assert_eq!(status.last_status, "Failed: Local DB not connected");
        assert!(status.last_sync_time.is_none());
    }

    #[tokio::test]
    async fn test_trigger_sync_skips_when_cloud_is_down() {
        let service = service(false, true);

        let result = service.trigger_sync().await;

        assert_eq!(result.message, "Azure database connection failed. Sync skipped.");
        assert_eq!(service.status().await.last_status, "Failed: Azure DB not connected");
    }

    #[tokio::test]
    async fn test_trigger_sync_refuses_overlap() {
        let service = service(false, false);
        service.running.store(true, Ordering::SeqCst);

        let result = service.trigger_sync().await;

        assert!(!result.success);
        assert_eq!(result.message, "A sync operation is already in progress.");
    }

    #[tokio::test]
    async fn test_concurrent_triggers_report_overlap_with_trigger_message() {
        let service = service(false, false);

        let (first, second) = tokio::join!(service.trigger_sync(), service.trigger_sync());

        assert!(first.success || second.success);
        for result in [&first, &second] {
            if !result.success {
                assert_eq!(result.message, "A sync operation is already in progress.");
            }
        }
        assert!(!service.status().await.running);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_runs_initial_sync_after_delay() {
        let service = service(false, false);
        let handle = service.start();

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(service.status().await.last_status, "Not started");

        tokio::time::sleep(Duration::from_secs(25)).await;
        assert_eq!(service.status().await.last_status, "Success: 1 rows synced");

        service.stop();
        handle.await.unwrap();
        assert!(!service.status().await.enabled);
    }
}
