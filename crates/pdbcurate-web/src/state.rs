//! Shared application state for the web server.

use pdbcurate_common::Schema;
use pdbcurate_db::{DbError, RecordBackend, RecordRepository, RecordStore, RefreshOutcome};
use pdbcurate_structure::{StructureFetcher, ThumbnailSource, ViewerConfig};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

use crate::config::Config;
use crate::session::AccessGate;
use crate::templates::Templates;

/// Events pushed to connected clients via SSE.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppEvent {
    /// The record store was replaced by a newer fetch
    RecordsRefreshed { token: u64, records: usize },
    /// Every member of a group was updated
    GroupUpdated { publication_id: String, status: String, records: usize },
    /// A group update stopped part-way or was rejected
    UpdateFailed { publication_id: String, message: String },
    /// General notification
    Notification { level: String, message: String },
}

/// Shared state injected into every Axum handler.
pub struct AppState {
    pub store: RecordStore,
    pub schema: Arc<Schema>,
    pub gate: AccessGate,
    pub fetcher: StructureFetcher,
    pub thumbnails: ThumbnailSource,
    pub viewer: ViewerConfig,
    pub templates: Templates,
    /// Broadcast channel for SSE push events
    pub event_tx: broadcast::Sender<AppEvent>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(
        store: RecordStore,
        gate: AccessGate,
        fetcher: StructureFetcher,
        thumbnails: ThumbnailSource,
    ) -> anyhow::Result<Self> {
        let (event_tx, _) = broadcast::channel(256);
        Ok(Self {
            schema: store.repository().shared_schema(),
            store,
            gate,
            fetcher,
            thumbnails,
            viewer: ViewerConfig::default(),
            templates: Templates::new()?,
            event_tx,
        })
    }

    /// Wire up the state from configuration. Secrets are moved out of
    /// `config`.
    pub fn from_config(
        mut config: Config,
        schema: Schema,
        backend: Arc<dyn RecordBackend>,
    ) -> anyhow::Result<Self> {
        let repo = RecordRepository::new(backend, Arc::new(schema));
        let fetcher = StructureFetcher::new(
            &config.structure.cache_dir,
            std::time::Duration::from_secs(config.structure.timeout_secs),
        )?;
        Self::new(
            RecordStore::new(repo),
            AccessGate::new(config.access.password.take()),
            fetcher,
            ThumbnailSource::new(&config.structure.thumbnail_host),
        )
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.event_tx.subscribe()
    }

    pub fn publish(&self, event: AppEvent) {
        // No subscribers is not an error.
        if self.event_tx.send(event).is_err() {
            debug!("No SSE subscribers");
        }
    }

    /// Refetch the store and announce the new snapshot.
    pub async fn refresh(&self) -> Result<RefreshOutcome, DbError> {
        let outcome = self.store.refresh().await?;
        if outcome.applied {
            self.publish(AppEvent::RecordsRefreshed {
                token: outcome.token,
                records: outcome.records,
            });
        }
        Ok(outcome)
    }
}
