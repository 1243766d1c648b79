//! Background expiry sweeper.
//!
//! The chat engine already sweeps opportunistically before each send; this
//! task covers quiet periods so idle sessions don't pile up while nobody
//! is talking.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::debug;

use super::store::SessionStore;

/// Spawn a task that sweeps the store every `every` interval.
///
/// Runs until the returned handle is aborted or the runtime shuts down.
pub fn spawn_sweeper(store: Arc<SessionStore>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        // The first tick fires immediately; skip it so a fresh store
        // isn't swept before it has served anything.
        interval.tick().await;
        loop {
            interval.tick().await;
            let removed = store.sweep(Utc::now());
            if removed > 0 {
                debug!(removed, "background sweep");
            }
        }
    })
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
