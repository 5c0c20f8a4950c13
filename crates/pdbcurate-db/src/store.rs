//! The record store.
//!
//! Holds the last fetched record list. The list is only ever replaced as a
//! whole. Every fetch takes a token from a monotonically increasing counter and
//! a response is applied only if its token is newer than the snapshot's, so an
//! older fetch that resolves late can never overwrite a newer one.

use chrono::{DateTime, Utc};
use pdbcurate_common::Record;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::error::{DbError, Result};
use crate::records::RecordRepository;

/// Immutable view of the store at one point in time.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub records: Vec<Record>,
    /// Token of the fetch that produced this snapshot; 0 before the first.
    pub token: u64,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    pub fn is_loaded(&self) -> bool {
        self.token > 0
    }

    pub fn members(&self, publication_id: &str) -> Vec<Record> {
        self.records
            .iter()
            .filter(|r| r.publication_id.as_deref() == Some(publication_id))
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshOutcome {
    pub token: u64,
    pub records: usize,
    /// False when a newer snapshot was already in place.
    pub applied: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateOutcome {
    pub publication_id: String,
    pub status: String,
    /// Ids of the records written, in write order.
    pub updated: Vec<String>,
    /// Refetch after the writes; `None` when it failed.
    pub refresh: Option<RefreshOutcome>,
}

pub struct RecordStore {
    repo: RecordRepository,
    next_token: AtomicU64,
    current: RwLock<Arc<Snapshot>>,
}

impl RecordStore {
    pub fn new(repo: RecordRepository) -> Self {
        Self {
            repo,
            next_token: AtomicU64::new(0),
            current: RwLock::new(Arc::new(Snapshot::default())),
        }
    }

    pub fn repository(&self) -> &RecordRepository {
        &self.repo
    }

    pub async fn snapshot(&self) -> Arc<Snapshot> {
        self.current.read().await.clone()
    }

    /// Reserve the token for a new fetch.
    pub fn begin_refresh(&self) -> u64 {
        self.next_token.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Install the result of the fetch identified by `token`, unless a newer
    /// fetch has already been applied.
    pub async fn apply(&self, token: u64, records: Vec<Record>) -> RefreshOutcome {
        let count = records.len();
        let mut current = self.current.write().await;
        if token <= current.token {
            debug!(token, current = current.token, "Discarding stale fetch");
            return RefreshOutcome { token, records: count, applied: false };
        }

        *current = Arc::new(Snapshot {
            records,
            token,
            fetched_at: Some(Utc::now()),
        });
        RefreshOutcome { token, records: count, applied: true }
    }

    /// Refetch the whole table. On failure the previous snapshot stays.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<RefreshOutcome> {
        let token = self.begin_refresh();
        match self.repo.fetch_all().await {
            Ok(records) => {
                let outcome = self.apply(token, records).await;
                info!(token, records = outcome.records, applied = outcome.applied, "Record store refreshed");
                Ok(outcome)
            }
            Err(e) => {
                warn!(token, error = %e, "Fetch failed; keeping previous records");
                Err(e)
            }
        }
    }

    /// Apply one status/memo to every record of a publication.
    ///
    /// Writes are issued one record at a time. The first failure stops the
    /// sequence and is returned as `PartialUpdate`; the store is refetched
    /// either way so it shows what was actually committed.
    #[instrument(skip(self, memo))]
    pub async fn update_group(
        &self,
        publication_id: &str,
        status: &str,
        memo: &str,
    ) -> Result<UpdateOutcome> {
        let members = self.snapshot().await.members(publication_id);
        if members.is_empty() {
            return Err(DbError::GroupNotFound(publication_id.to_string()));
        }
        let status = self.repo.schema().edit_status(status, &members[0].status)?;

        let mut updated = Vec::with_capacity(members.len());
        for member in &members {
            if let Err(e) = self.repo.save_annotation(member, &status, memo).await {
                warn!(
                    publication_id,
                    record = %member.id,
                    saved = updated.len(),
                    total = members.len(),
                    error = %e,
                    "Group update failed part-way"
                );
                if let Err(refresh_err) = self.refresh().await {
                    warn!(error = %refresh_err, "Refetch after failed update also failed");
                }
                return Err(DbError::PartialUpdate {
                    publication_id: publication_id.to_string(),
                    applied: updated,
                    failed: member.id.clone(),
                    total: members.len(),
                    reason: e.to_string(),
                });
            }
            updated.push(member.id.clone());
        }

        info!(publication_id, records = updated.len(), status = %status, "Group updated");
        let refresh = self.refresh().await.ok();
        Ok(UpdateOutcome {
            publication_id: publication_id.to_string(),
            status,
            updated,
            refresh,
        })
    }
}
