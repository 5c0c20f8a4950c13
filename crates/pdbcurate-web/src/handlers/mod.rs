//! HTTP handlers for all web routes.

pub mod api;
pub mod assets;
pub mod auth;
pub mod browser;
pub mod export;
pub mod groups;

use pdbcurate_db::Snapshot;
use std::sync::Arc;
use tracing::warn;

use crate::state::AppState;

/// Current snapshot, fetching once if nothing has been loaded yet. A failed
/// fetch is returned as a message next to whatever data is available.
pub(crate) async fn current_snapshot(state: &AppState) -> (Arc<Snapshot>, Option<String>) {
    let snapshot = state.store.snapshot().await;
    if snapshot.is_loaded() {
        return (snapshot, None);
    }
    match state.refresh().await {
        Ok(_) => (state.store.snapshot().await, None),
        Err(e) => {
            warn!(error = %e, "Initial fetch failed");
            (snapshot, Some(format!("Could not load records: {}", e)))
        }
    }
}
