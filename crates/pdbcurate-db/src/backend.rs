//! The persistence collaborator interface.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::Result;

/// One backend row as returned by the REST API.
pub type Row = Map<String, Value>;

/// Single-column sort for reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub ascending: bool,
}

impl OrderBy {
    pub fn asc(column: &str) -> Self {
        Self { column: column.to_string(), ascending: true }
    }

    pub fn desc(column: &str) -> Self {
        Self { column: column.to_string(), ascending: false }
    }
}

/// A queryable, updatable table store.
#[async_trait]
pub trait RecordBackend: Send + Sync {
    /// Column-projected read of a whole table.
    async fn select(
        &self,
        table: &str,
        columns: &[String],
        order: Option<&OrderBy>,
    ) -> Result<Vec<Row>>;

    /// Update the row whose `key_column` equals `key`.
    async fn update(&self, table: &str, key_column: &str, key: &str, patch: &Row) -> Result<()>;

    /// Insert `row`, or merge it into the row matching all `conflict_columns`.
    async fn upsert(&self, table: &str, conflict_columns: &[String], row: &Row) -> Result<()>;
}

/// Text form of a cell used for key comparison.
pub(crate) fn cell_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
