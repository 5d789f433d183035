use std::sync::Arc;

pub mod db;
pub mod diagnostics;
pub mod backend;
pub mod mongo_backend;
pub mod memory_backend;

pub mod watchlist_service;
pub mod alerts_service;
pub mod presentation_service;

/// Source of "now" in unix millis for `addedAt`/`createdAt`.
pub type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

pub fn system_clock() -> Clock {
    Arc::new(|| chrono::Utc::now().timestamp_millis())
}
