//! In-process backend.
//!
//! Used by tests and by the server's offline mode. Rows are plain JSON
//! objects, sorted the way PostgreSQL sorts them (NULL above every value).
//! Failures can be injected to exercise the error paths of the store.

use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering as AtomicOrdering};
use std::sync::{Mutex, MutexGuard};

use crate::backend::{cell_text, OrderBy, RecordBackend, Row};
use crate::error::{DbError, Result};

/// A call observed by the backend, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    Select { table: String },
    Update { table: String, key: String, patch: Row },
    Upsert { table: String, row: Row },
}

#[derive(Default)]
pub struct MemoryBackend {
    tables: Mutex<HashMap<String, Vec<Row>>>,
    calls: Mutex<Vec<BackendCall>>,
    updates: AtomicUsize,
    /// 1-based index of the write that should fail, 0 for none.
    fail_write_at: AtomicUsize,
    fail_selects: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a table.
    pub fn with_table(self, table: &str, rows: Vec<Row>) -> Self {
        lock(&self.tables).insert(table.to_string(), rows);
        self
    }

    /// Make the n-th write (update or upsert, counted from 1) fail.
    pub fn fail_nth_write(&self, n: usize) {
        self.fail_write_at.store(n, AtomicOrdering::SeqCst);
    }

    pub fn fail_selects(&self, fail: bool) {
        self.fail_selects.store(fail, AtomicOrdering::SeqCst);
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        lock(&self.calls).clone()
    }

    pub fn rows(&self, table: &str) -> Vec<Row> {
        lock(&self.tables).get(table).cloned().unwrap_or_default()
    }

    fn next_write(&self) -> Result<()> {
        let n = self.updates.fetch_add(1, AtomicOrdering::SeqCst) + 1;
        if n == self.fail_write_at.load(AtomicOrdering::SeqCst) {
            return Err(DbError::Backend {
                status: 503,
                message: format!("injected failure on write {}", n),
            });
        }
        Ok(())
    }
}

/// PostgreSQL ordering: numbers numerically, everything else as text,
/// NULL greater than any value.
fn compare_cells(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(x), Some(y)) => cell_text(x).cmp(&cell_text(y)),
    }
}

fn same_key(row: &Row, column: &str, key: &str) -> bool {
    row.get(column).and_then(cell_text).as_deref() == Some(key)
}

#[async_trait]
impl RecordBackend for MemoryBackend {
    async fn select(
        &self,
        table: &str,
        columns: &[String],
        order: Option<&OrderBy>,
    ) -> Result<Vec<Row>> {
        lock(&self.calls).push(BackendCall::Select { table: table.to_string() });
        if self.fail_selects.load(AtomicOrdering::SeqCst) {
            return Err(DbError::Backend {
                status: 503,
                message: "injected select failure".to_string(),
            });
        }

        let tables = lock(&self.tables);
        let rows = tables
            .get(table)
            .ok_or_else(|| DbError::TableNotFound(table.to_string()))?;

        let mut projected: Vec<Row> = rows
            .iter()
            .map(|row| {
                row.iter()
                    .filter(|(k, _)| columns.iter().any(|c| c == *k))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .collect();

        if let Some(order) = order {
            projected.sort_by(|a, b| {
                let ord = compare_cells(a.get(&order.column), b.get(&order.column));
                if order.ascending { ord } else { ord.reverse() }
            });
        }
        Ok(projected)
    }

    async fn update(&self, table: &str, key_column: &str, key: &str, patch: &Row) -> Result<()> {
        lock(&self.calls).push(BackendCall::Update {
            table: table.to_string(),
            key: key.to_string(),
            patch: patch.clone(),
        });
        self.next_write()?;

        let mut tables = lock(&self.tables);
        let rows = tables
            .get_mut(table)
            .ok_or_else(|| DbError::TableNotFound(table.to_string()))?;

        let mut matched = false;
        for row in rows.iter_mut().filter(|r| same_key(r, key_column, key)) {
            matched = true;
            for (k, v) in patch {
                row.insert(k.clone(), v.clone());
            }
        }

        if !matched {
            return Err(DbError::RowNotFound {
                table: table.to_string(),
                column: key_column.to_string(),
                key: key.to_string(),
            });
        }
        Ok(())
    }

    async fn upsert(&self, table: &str, conflict_columns: &[String], row: &Row) -> Result<()> {
        lock(&self.calls).push(BackendCall::Upsert {
            table: table.to_string(),
            row: row.clone(),
        });
        self.next_write()?;

        let keys: Vec<(String, Option<String>)> = conflict_columns
            .iter()
            .map(|c| (c.clone(), row.get(c).and_then(cell_text)))
            .collect();
        if keys.iter().any(|(_, v)| v.is_none()) {
            return Err(DbError::InvalidQuery(format!(
                "upsert row is missing one of the conflict columns {:?}",
                conflict_columns
            )));
        }

        let mut tables = lock(&self.tables);
        let rows = tables.entry(table.to_string()).or_default();
        let existing = rows.iter_mut().find(|r| {
            keys.iter()
                .all(|(c, v)| r.get(c).and_then(cell_text).as_deref() == v.as_deref())
        });

        match existing {
            Some(existing) => {
                for (k, v) in row {
                    existing.insert(k.clone(), v.clone());
                }
            }
            None => rows.push(row.clone()),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows(values: Value) -> Vec<Row> {
        values
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_object().cloned().unwrap())
            .collect()
    }

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_select_projects_and_orders_nulls_first_descending() {
        let backend = MemoryBackend::new().with_table(
            "t",
            rows(json!([
                { "ID": 1, "d": "2020-01-01", "x": "hidden" },
                { "ID": 2, "d": null },
                { "ID": 3, "d": "2022-06-01" }
            ])),
        );

        let out = backend
            .select("t", &cols(&["ID", "d"]), Some(&OrderBy::desc("d")))
            .await
            .unwrap();
        let ids: Vec<i64> = out.iter().map(|r| r["ID"].as_i64().unwrap()).collect();
        assert_eq!(ids, vec![2, 3, 1]);
        assert!(out[2].get("x").is_none());
    }

    #[tokio::test]
    async fn test_update_matches_numeric_key_by_text() {
        let backend = MemoryBackend::new().with_table("t", rows(json!([{ "ID": 42, "Status": "" }])));
        let mut patch = Row::new();
        patch.insert("Status".to_string(), json!("Yes"));

        backend.update("t", "ID", "42", &patch).await.unwrap();
        assert_eq!(backend.rows("t")[0]["Status"], "Yes");

        let err = backend.update("t", "ID", "43", &patch).await.unwrap_err();
        assert!(matches!(err, DbError::RowNotFound { .. }));
    }

    #[tokio::test]
    async fn test_upsert_merges_on_composite_key() {
        let backend = MemoryBackend::new();
        let key = cols(&["pub", "pdb"]);
        let mut row = Row::new();
        row.insert("pub".to_string(), json!("1"));
        row.insert("pdb".to_string(), json!("1ABC"));
        row.insert("status".to_string(), json!("Maybe"));
        backend.upsert("notes", &key, &row).await.unwrap();

        row.insert("status".to_string(), json!("Yes"));
        backend.upsert("notes", &key, &row).await.unwrap();

        let stored = backend.rows("notes");
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0]["status"], "Yes");
    }

    #[tokio::test]
    async fn test_injected_write_failure() {
        let backend = MemoryBackend::new().with_table("t", rows(json!([{ "ID": 1 }, { "ID": 2 }])));
        backend.fail_nth_write(2);
        let patch = Row::new();

        assert!(backend.update("t", "ID", "1", &patch).await.is_ok());
        assert!(matches!(
            backend.update("t", "ID", "2", &patch).await,
            Err(DbError::Backend { status: 503, .. })
        ));
        assert_eq!(backend.calls().len(), 2);
    }
}
