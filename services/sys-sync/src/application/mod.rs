//! 应用层

pub mod auto_sync;
pub mod engine;

pub use auto_sync::{AutoSyncService, AutoSyncStatus};
pub use engine::{ProgressFn, SyncEngine};
