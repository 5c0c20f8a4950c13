//! Database error types.

use pdbcurate_common::CurateError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend returned {status}: {message}")]
    Backend { status: u16, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Record(#[from] CurateError),

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("No row with {column} = {key} in {table}")]
    RowNotFound { table: String, column: String, key: String },

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("No records belong to publication {0}")]
    GroupNotFound(String),

    #[error(
        "Update of publication {publication_id} stopped at record {failed} \
         ({} of {total} records saved): {reason}",
        .applied.len()
    )]
    PartialUpdate {
        publication_id: String,
        applied: Vec<String>,
        failed: String,
        total: usize,
        reason: String,
    },
}
