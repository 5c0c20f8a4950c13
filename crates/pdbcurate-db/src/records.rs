//! Record repository.
//!
//! Reads the curated table through the dataset schema and writes curator
//! edits back, either as row updates or as annotation-table upserts.

use pdbcurate_common::{Record, Schema};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::backend::{cell_text, OrderBy, RecordBackend, Row};
use crate::error::Result;

/// Repository for curated records.
#[derive(Clone)]
pub struct RecordRepository {
    backend: Arc<dyn RecordBackend>,
    schema: Arc<Schema>,
}

impl RecordRepository {
    pub fn new(backend: Arc<dyn RecordBackend>, schema: Arc<Schema>) -> Self {
        Self { backend, schema }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn shared_schema(&self) -> Arc<Schema> {
        self.schema.clone()
    }

    /// Fetch every record, newest release first.
    ///
    /// Rows without a primary key are skipped with a warning. When the schema
    /// has an annotation table, its status/memo override the record's own.
    #[instrument(skip(self), fields(table = %self.schema.table))]
    pub async fn fetch_all(&self) -> Result<Vec<Record>> {
        let order = OrderBy::desc(&self.schema.columns.release_date);
        let rows = self
            .backend
            .select(&self.schema.table, &self.schema.projection(), Some(&order))
            .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            match Record::from_row(&self.schema, row) {
                Ok(record) => records.push(record),
                Err(e) => warn!(error = %e, "Skipping malformed row"),
            }
        }

        if self.schema.annotation.is_some() {
            self.overlay_annotations(&mut records).await?;
        }

        debug!(records = records.len(), "Fetched records");
        Ok(records)
    }

    async fn overlay_annotations(&self, records: &mut [Record]) -> Result<()> {
        let Some(annotation) = &self.schema.annotation else {
            return Ok(());
        };

        let columns = vec![
            annotation.publication_column.clone(),
            annotation.structure_column.clone(),
            annotation.status_column.clone(),
            annotation.memo_column.clone(),
        ];
        let rows = self.backend.select(&annotation.table, &columns, None).await?;

        let text = |row: &Row, col: &str| row.get(col).and_then(cell_text);
        let notes: HashMap<(String, String), (String, String)> = rows
            .iter()
            .filter_map(|row| {
                let key = (
                    text(row, &annotation.publication_column)?,
                    text(row, &annotation.structure_column)?,
                );
                let status = text(row, &annotation.status_column).unwrap_or_default();
                let memo = text(row, &annotation.memo_column).unwrap_or_default();
                Some((key, (status, memo)))
            })
            .collect();

        for record in records.iter_mut() {
            let Some(publication) = &record.publication_id else { continue };
            if let Some((status, memo)) =
                notes.get(&(publication.clone(), record.structure_id.clone()))
            {
                record.status = status.clone();
                record.memo = memo.clone();
            }
        }
        Ok(())
    }

    /// Persist a curator edit for one record.
    #[instrument(skip(self, record, memo), fields(id = %record.id))]
    pub async fn save_annotation(&self, record: &Record, status: &str, memo: &str) -> Result<()> {
        match &self.schema.annotation {
            Some(annotation) => {
                let mut row = Row::new();
                row.insert(
                    annotation.publication_column.clone(),
                    Value::String(record.publication().to_string()),
                );
                row.insert(
                    annotation.structure_column.clone(),
                    Value::String(record.structure_id.clone()),
                );
                row.insert(annotation.status_column.clone(), Value::String(status.to_string()));
                row.insert(annotation.memo_column.clone(), Value::String(memo.to_string()));

                let conflict = vec![
                    annotation.publication_column.clone(),
                    annotation.structure_column.clone(),
                ];
                self.backend.upsert(&annotation.table, &conflict, &row).await
            }
            None => {
                let cols = &self.schema.columns;
                let mut patch = Row::new();
                patch.insert(cols.status.clone(), Value::String(status.to_string()));
                patch.insert(cols.memo.clone(), Value::String(memo.to_string()));
                self.backend
                    .update(&self.schema.table, &cols.id, &record.id, &patch)
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{BackendCall, MemoryBackend};
    use serde_json::json;

    fn rows(values: Value) -> Vec<Row> {
        values
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_object().cloned().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_fetch_all_skips_rows_without_id() {
        let backend = MemoryBackend::new().with_table(
            "pdb_USC_backup",
            rows(json!([
                { "ID": 1, "structureid": "1AAA", "PubMed": "p1", "releaseDate": "2021-01-01" },
                { "structureid": "2BBB", "PubMed": "p1" },
                { "ID": 3, "structureid": "3CCC", "PubMed": "p2", "releaseDate": "2022-01-01" }
            ])),
        );
        let repo = RecordRepository::new(Arc::new(backend), Arc::new(Schema::usc_backup()));

        let records = repo.fetch_all().await.unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "1"]);
    }

    #[tokio::test]
    async fn test_annotations_overlay_status_and_memo() {
        let backend = MemoryBackend::new()
            .with_table(
                "pdb_entries",
                rows(json!([
                    { "id": 1, "pdb_id": "1AAA", "pubmed_id": "11", "status": "", "memo": "" },
                    { "id": 2, "pdb_id": "2BBB", "pubmed_id": "11", "status": "", "memo": "" }
                ])),
            )
            .with_table(
                "pdb_annotations",
                rows(json!([
                    { "pubmed_id": "11", "pdb_id": "2BBB", "status": "Maybe", "memo": "ask PI" }
                ])),
            );
        let repo = RecordRepository::new(Arc::new(backend), Arc::new(Schema::annotated()));

        let records = repo.fetch_all().await.unwrap();
        let second = records.iter().find(|r| r.id == "2").unwrap();
        assert_eq!(second.status, "Maybe");
        assert_eq!(second.memo, "ask PI");
        let first = records.iter().find(|r| r.id == "1").unwrap();
        assert_eq!(first.status, "");
    }

    #[tokio::test]
    async fn test_save_annotation_upserts_when_annotation_table_exists() {
        let backend = Arc::new(MemoryBackend::new());
        let repo = RecordRepository::new(backend.clone(), Arc::new(Schema::annotated()));
        let record = Record::new("9", "9ZZZ", Some("77"));

        repo.save_annotation(&record, "Yes", "looks right").await.unwrap();

        match &backend.calls()[0] {
            BackendCall::Upsert { table, row } => {
                assert_eq!(table, "pdb_annotations");
                assert_eq!(row["pubmed_id"], "77");
                assert_eq!(row["pdb_id"], "9ZZZ");
                assert_eq!(row["status"], "Yes");
                assert_eq!(row["memo"], "looks right");
            }
            other => panic!("unexpected call {:?}", other),
        }
    }
}
