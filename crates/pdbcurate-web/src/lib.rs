//! pdbcurate-web: curation UI for PDB records grouped by publication.
//! Provides:
//!   - Shared-password login gate
//!   - Grouped record browser with status filter, search and date sort
//!   - Group status/memo editing
//!   - CSV export
//!   - Inline 3D structure viewer backed by a coordinate proxy
//!   - JSON API and SSE notifications

pub mod config;
pub mod demo;
pub mod error;
pub mod handlers;
pub mod router;
pub mod session;
pub mod sse;
pub mod state;
pub mod templates;

pub use config::Config;
pub use router::build_router;
pub use state::{AppEvent, AppState, SharedState};
