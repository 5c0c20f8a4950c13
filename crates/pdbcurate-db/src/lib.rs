//! pdbcurate database layer
//!
//! The curated table lives in a hosted PostgREST service (Supabase). This
//! crate wraps it behind the `RecordBackend` trait and provides:
//!
//! - `PostgrestBackend`, the HTTP client for the hosted table
//! - `MemoryBackend`, in-process tables for tests and offline demos
//! - `RecordRepository`, schema-aware reads and curator writes
//! - `RecordStore`, the wholesale-refreshed record snapshot with request
//!   fencing and the group update fan-out
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use pdbcurate_common::Schema;
//! use pdbcurate_db::{PostgrestBackend, RecordRepository, RecordStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = PostgrestBackend::new(
//!         "https://project.supabase.co",
//!         "anon-key".to_string().into(),
//!         Duration::from_secs(30),
//!     )?;
//!     let repo = RecordRepository::new(Arc::new(backend), Arc::new(Schema::usc_backup()));
//!     let store = RecordStore::new(repo);
//!     store.refresh().await?;
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod error;
pub mod memory;
pub mod postgrest;
pub mod records;
pub mod store;

pub use backend::{OrderBy, RecordBackend, Row};
pub use error::{DbError, Result};
pub use memory::{BackendCall, MemoryBackend};
pub use postgrest::PostgrestBackend;
pub use records::RecordRepository;
pub use store::{RecordStore, RefreshOutcome, Snapshot, UpdateOutcome};
