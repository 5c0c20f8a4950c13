//! The generic curated record.
//!
//! Rows arrive as loosely-typed JSON objects. `Record::from_row` reads them
//! through a `Schema`, so the rest of the workspace only deals with one shape.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::error::{CurateError, Result};
use crate::prediction::Prediction;
use crate::schema::{ColumnSource, Schema};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Record {
    /// Opaque primary key, in its JSON text form.
    pub id: String,
    pub structure_id: String,
    /// `None` when the row has no (or a blank) publication id.
    pub publication_id: Option<String>,
    pub status: String,
    pub memo: String,
    pub release_date: Option<String>,
    /// Descriptive columns keyed by backend column name.
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
    #[serde(default)]
    pub predictions: Vec<Prediction>,
}

impl Record {
    pub fn new(id: &str, structure_id: &str, publication_id: Option<&str>) -> Self {
        Self {
            id: id.to_string(),
            structure_id: structure_id.to_string(),
            publication_id: publication_id.map(String::from),
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status: &str) -> Self {
        self.status = status.to_string();
        self
    }

    pub fn with_memo(mut self, memo: &str) -> Self {
        self.memo = memo.to_string();
        self
    }

    pub fn with_release_date(mut self, date: &str) -> Self {
        self.release_date = Some(date.to_string());
        self
    }

    pub fn with_field(mut self, key: &str, value: &str) -> Self {
        self.fields.insert(key.to_string(), value.to_string());
        self
    }

    /// Build a record from one backend row.
    pub fn from_row(schema: &Schema, row: &Map<String, Value>) -> Result<Self> {
        let cols = &schema.columns;

        let id = row
            .get(&cols.id)
            .and_then(value_text)
            .ok_or_else(|| CurateError::MissingColumn(cols.id.clone()))?;

        let fields = schema
            .fields
            .iter()
            .filter_map(|f| row.get(&f.key).and_then(value_text).map(|v| (f.key.clone(), v)))
            .collect();

        let predictions = schema
            .predictions
            .iter()
            .map(|channel| {
                Prediction::from_values(
                    &channel.name,
                    channel.label_column.as_ref().and_then(|c| row.get(c)),
                    channel.score_column.as_ref().and_then(|c| row.get(c)),
                )
            })
            .collect();

        Ok(Self {
            id,
            structure_id: row.get(&cols.structure).and_then(value_text).unwrap_or_default(),
            publication_id: row
                .get(&cols.publication)
                .and_then(value_text)
                .filter(|p| !p.trim().is_empty()),
            status: row.get(&cols.status).and_then(value_text).unwrap_or_default(),
            memo: row.get(&cols.memo).and_then(value_text).unwrap_or_default(),
            release_date: row
                .get(&cols.release_date)
                .and_then(value_text)
                .filter(|d| !d.trim().is_empty()),
            fields,
            predictions,
        })
    }

    /// Descriptive field value, empty when absent.
    pub fn field(&self, key: &str) -> &str {
        self.fields.get(key).map(String::as_str).unwrap_or("")
    }

    pub fn prediction(&self, channel: &str) -> Option<&Prediction> {
        self.predictions.iter().find(|p| p.channel == channel)
    }

    pub fn publication(&self) -> &str {
        self.publication_id.as_deref().unwrap_or("")
    }

    /// Release date without a time component, as shown in detail rows.
    pub fn release_day(&self) -> Option<&str> {
        self.release_date
            .as_deref()
            .and_then(|d| d.split([' ', 'T']).next())
            .filter(|d| !d.is_empty())
    }

    /// Value of an export column; missing values are empty strings.
    pub fn column_value(&self, source: &ColumnSource) -> String {
        match source {
            ColumnSource::Id => self.id.clone(),
            ColumnSource::Status => self.status.clone(),
            ColumnSource::Memo => self.memo.clone(),
            ColumnSource::Structure => self.structure_id.clone(),
            ColumnSource::Publication => self.publication().to_string(),
            ColumnSource::ReleaseDate => self.release_date.clone().unwrap_or_default(),
            ColumnSource::Field(key) => self.field(key).to_string(),
            ColumnSource::PredictionLabel(channel) => self
                .prediction(channel)
                .map(|p| p.label_display().to_string())
                .unwrap_or_default(),
            ColumnSource::PredictionScore(channel) => self
                .prediction(channel)
                .map(|p| p.score_display())
                .unwrap_or_default(),
        }
    }
}

/// Text form of a JSON cell. Null has none; non-strings use their JSON text.
fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
