//! Dataset schema descriptors.
//!
//! Each curated table has its own column names, descriptive fields and export
//! layout. A `Schema` describes one of them so that grouping, filtering,
//! rendering and export are written once. Descriptors come from a built-in
//! preset or from a YAML/JSON file.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::error::{CurateError, Result};
use crate::status::normalize_status;

/// Complete description of one dataset variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Short name shown in the page header.
    pub name: String,

    /// Backend table holding the records.
    pub table: String,

    /// Columns backing the fixed record attributes.
    #[serde(default)]
    pub columns: CoreColumns,

    /// Descriptive columns, in display order.
    #[serde(default)]
    pub fields: Vec<FieldSpec>,

    /// Model prediction channels.
    #[serde(default)]
    pub predictions: Vec<PredictionChannel>,

    /// Status vocabulary offered to curators (blank is always allowed).
    #[serde(default = "default_statuses")]
    pub statuses: Vec<String>,

    #[serde(default)]
    pub export: ExportSpec,

    /// Separate table receiving curator edits, keyed by (publication, structure).
    #[serde(default)]
    pub annotation: Option<AnnotationTable>,
}

// ── Columns ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreColumns {
    #[serde(default = "default_id_column")]
    pub id: String,
    #[serde(default = "default_structure_column")]
    pub structure: String,
    #[serde(default = "default_publication_column")]
    pub publication: String,
    #[serde(default = "default_status_column")]
    pub status: String,
    #[serde(default = "default_memo_column")]
    pub memo: String,
    #[serde(default = "default_release_date_column")]
    pub release_date: String,
}

fn default_id_column()           -> String { "ID".to_string() }
fn default_structure_column()    -> String { "structureid".to_string() }
fn default_publication_column()  -> String { "PubMed".to_string() }
fn default_status_column()       -> String { "Status".to_string() }
fn default_memo_column()         -> String { "memo".to_string() }
fn default_release_date_column() -> String { "releaseDate".to_string() }

impl Default for CoreColumns {
    fn default() -> Self {
        Self {
            id: default_id_column(),
            structure: default_structure_column(),
            publication: default_publication_column(),
            status: default_status_column(),
            memo: default_memo_column(),
            release_date: default_release_date_column(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    #[default]
    Text,
    /// Value is a URL rendered as a link.
    Link,
    Date,
    Number,
}

/// How a field is summarised on the group card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Summary {
    /// Value of the first member only.
    #[default]
    First,
    /// Distinct non-empty values of all members, joined.
    Distinct,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Backend column name.
    pub key: String,
    pub label: String,
    #[serde(default)]
    pub kind: FieldKind,
    #[serde(default)]
    pub summary: Summary,
    #[serde(default = "default_true")]
    pub on_card: bool,
    #[serde(default = "default_true")]
    pub on_detail: bool,
}

fn default_true() -> bool { true }

impl FieldSpec {
    pub fn new(key: &str, label: &str, kind: FieldKind, summary: Summary) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            kind,
            summary,
            on_card: true,
            on_detail: true,
        }
    }

    /// Hide the field on the group card; show it per member only.
    pub fn detail_only(mut self) -> Self {
        self.on_card = false;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionChannel {
    pub name: String,
    #[serde(default)]
    pub label_column: Option<String>,
    #[serde(default)]
    pub score_column: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationTable {
    pub table: String,
    pub publication_column: String,
    pub structure_column: String,
    #[serde(default = "default_annotation_status")]
    pub status_column: String,
    #[serde(default = "default_memo_column")]
    pub memo_column: String,
}

fn default_annotation_status() -> String { "status".to_string() }

// ── Export ───────────────────────────────────────────────────────────────────

/// Row order of the exported CSV.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportOrder {
    /// Lexical by publication id, records without one last.
    #[default]
    Publication,
    /// Newest release date first, undated records last.
    ReleaseDate,
}

/// Which records the export covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportScope {
    /// The whole record store, regardless of the active filter.
    #[default]
    All,
    /// Only records of the groups visible under the active filter.
    Visible,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnSource {
    Id,
    Status,
    Memo,
    Structure,
    Publication,
    ReleaseDate,
    Field(String),
    PredictionLabel(String),
    PredictionScore(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportColumn {
    pub label: String,
    /// `structure`, or a one-key map such as `{ field: method }`.
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub source: ColumnSource,
}

impl ExportColumn {
    pub fn new(label: &str, source: ColumnSource) -> Self {
        Self { label: label.to_string(), source }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSpec {
    #[serde(default = "default_export_filename")]
    pub filename: String,
    #[serde(default)]
    pub order: ExportOrder,
    #[serde(default)]
    pub scope: ExportScope,
    /// Explicit column layout; derived from the schema when empty.
    #[serde(default)]
    pub columns: Vec<ExportColumn>,
}

fn default_export_filename() -> String { "records_export.csv".to_string() }

impl Default for ExportSpec {
    fn default() -> Self {
        Self {
            filename: default_export_filename(),
            order: ExportOrder::default(),
            scope: ExportScope::default(),
            columns: Vec::new(),
        }
    }
}

fn default_statuses() -> Vec<String> {
    ["Yes", "No", "Maybe", "Already In", "Pubmed ready", "Ready for yes"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

// ── Presets ──────────────────────────────────────────────────────────────────

impl Schema {
    /// The original PDB backup table: one row per structure, linked to
    /// PubMed/PDB/UniProt pages.
    pub fn usc_backup() -> Self {
        Self {
            name: "PDB Entry Labeler".to_string(),
            table: "pdb_USC_backup".to_string(),
            columns: CoreColumns::default(),
            fields: vec![
                FieldSpec::new("PDB", "PDB Link", FieldKind::Link, Summary::First).detail_only(),
                FieldSpec::new("UniProt", "UniProt Link", FieldKind::Link, Summary::First).detail_only(),
                FieldSpec::new("protein_type", "Uniprot Protein Type", FieldKind::Text, Summary::Distinct),
            ],
            predictions: Vec::new(),
            statuses: default_statuses(),
            export: ExportSpec {
                filename: "pdb_records_export.csv".to_string(),
                order: ExportOrder::Publication,
                scope: ExportScope::All,
                columns: vec![
                    ExportColumn::new("ID", ColumnSource::Id),
                    ExportColumn::new("Status", ColumnSource::Status),
                    ExportColumn::new("Memo", ColumnSource::Memo),
                    ExportColumn::new("StructureID", ColumnSource::Structure),
                    ExportColumn::new("PubMed", ColumnSource::Publication),
                    ExportColumn::new("PDB", ColumnSource::Field("PDB".to_string())),
                    ExportColumn::new("UniProt", ColumnSource::Field("UniProt".to_string())),
                    ExportColumn::new("ReleaseDate", ColumnSource::ReleaseDate),
                    ExportColumn::new("Protein Type", ColumnSource::Field("protein_type".to_string())),
                ],
            },
            annotation: None,
        }
    }

    /// Later dataset shape: publication metadata, two prediction channels and
    /// curator edits kept in a separate annotation table.
    pub fn annotated() -> Self {
        Self {
            name: "PDB Publication Review".to_string(),
            table: "pdb_entries".to_string(),
            columns: CoreColumns {
                id: "id".to_string(),
                structure: "pdb_id".to_string(),
                publication: "pubmed_id".to_string(),
                status: "status".to_string(),
                memo: "memo".to_string(),
                release_date: "release_date".to_string(),
            },
            fields: vec![
                FieldSpec::new("title", "Title", FieldKind::Text, Summary::First),
                FieldSpec::new("journal", "Journal", FieldKind::Text, Summary::First),
                FieldSpec::new("classification", "Classification", FieldKind::Text, Summary::Distinct),
                FieldSpec::new("organism", "Organism", FieldKind::Text, Summary::Distinct),
                FieldSpec::new("resolution", "Resolution (Å)", FieldKind::Number, Summary::Distinct),
            ],
            predictions: vec![
                PredictionChannel {
                    name: "primary".to_string(),
                    label_column: Some("primary_label".to_string()),
                    score_column: Some("primary_score".to_string()),
                },
                PredictionChannel {
                    name: "secondary".to_string(),
                    label_column: Some("secondary_label".to_string()),
                    score_column: Some("secondary_score".to_string()),
                },
            ],
            statuses: default_statuses(),
            export: ExportSpec {
                filename: "pdb_annotations_export.csv".to_string(),
                order: ExportOrder::ReleaseDate,
                scope: ExportScope::All,
                columns: Vec::new(),
            },
            annotation: Some(AnnotationTable {
                table: "pdb_annotations".to_string(),
                publication_column: "pubmed_id".to_string(),
                structure_column: "pdb_id".to_string(),
                status_column: "status".to_string(),
                memo_column: "memo".to_string(),
            }),
        }
    }

    /// Look up a built-in preset by name.
    pub fn preset(name: &str) -> Result<Self> {
        match name {
            "usc_backup" => Ok(Self::usc_backup()),
            "annotated" => Ok(Self::annotated()),
            other => Err(CurateError::UnknownPreset(other.to_string())),
        }
    }

    pub fn from_yaml(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let schema: Schema = serde_yaml::from_str(&content)?;
        schema.validate()?;
        Ok(schema)
    }

    pub fn from_json(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let schema: Schema = serde_json::from_str(&content)?;
        schema.validate()?;
        Ok(schema)
    }

    /// Load a descriptor file, choosing the parser by extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(path),
            _ => Self::from_yaml(path),
        }
    }

    /// Check internal consistency.
    pub fn validate(&self) -> Result<()> {
        if self.table.trim().is_empty() {
            return Err(CurateError::InvalidSchema("table name is empty".to_string()));
        }

        let mut seen = HashSet::new();
        for status in &self.statuses {
            let key = normalize_status(status);
            if key.is_empty() {
                return Err(CurateError::InvalidSchema("blank status in vocabulary".to_string()));
            }
            if !seen.insert(key) {
                return Err(CurateError::InvalidSchema(format!("duplicate status `{}`", status)));
            }
        }

        let mut channels = HashSet::new();
        for channel in &self.predictions {
            if !channels.insert(channel.name.as_str()) {
                return Err(CurateError::InvalidSchema(format!(
                    "duplicate prediction channel `{}`",
                    channel.name
                )));
            }
        }

        for column in &self.export.columns {
            match &column.source {
                ColumnSource::Field(key) if self.field(key).is_none() => {
                    return Err(CurateError::InvalidSchema(format!(
                        "export column `{}` refers to unknown field `{}`",
                        column.label, key
                    )));
                }
                ColumnSource::PredictionLabel(name) | ColumnSource::PredictionScore(name)
                    if !channels.contains(name.as_str()) =>
                {
                    return Err(CurateError::InvalidSchema(format!(
                        "export column `{}` refers to unknown prediction channel `{}`",
                        column.label, name
                    )));
                }
                _ => {}
            }
        }

        Ok(())
    }

    pub fn field(&self, key: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// Columns to request from the backend, without duplicates.
    pub fn projection(&self) -> Vec<String> {
        let mut columns: Vec<String> = Vec::new();
        let mut push = |name: &str| {
            if !columns.iter().any(|c| c == name) {
                columns.push(name.to_string());
            }
        };

        push(&self.columns.id);
        push(&self.columns.status);
        push(&self.columns.memo);
        push(&self.columns.structure);
        push(&self.columns.publication);
        push(&self.columns.release_date);
        for field in &self.fields {
            push(&field.key);
        }
        for channel in &self.predictions {
            if let Some(col) = &channel.label_column {
                push(col);
            }
            if let Some(col) = &channel.score_column {
                push(col);
            }
        }
        columns
    }

    /// Export layout: the explicit one, or one derived from the descriptor.
    pub fn export_columns(&self) -> Vec<ExportColumn> {
        if !self.export.columns.is_empty() {
            return self.export.columns.clone();
        }

        let mut columns = vec![
            ExportColumn::new("ID", ColumnSource::Id),
            ExportColumn::new("Status", ColumnSource::Status),
            ExportColumn::new("Memo", ColumnSource::Memo),
            ExportColumn::new("StructureID", ColumnSource::Structure),
            ExportColumn::new("Publication", ColumnSource::Publication),
        ];
        columns.extend(
            self.fields
                .iter()
                .map(|f| ExportColumn::new(&f.label, ColumnSource::Field(f.key.clone()))),
        );
        columns.push(ExportColumn::new("ReleaseDate", ColumnSource::ReleaseDate));
        for channel in &self.predictions {
            columns.push(ExportColumn::new(
                &format!("{} label", channel.name),
                ColumnSource::PredictionLabel(channel.name.clone()),
            ));
            columns.push(ExportColumn::new(
                &format!("{} score", channel.name),
                ColumnSource::PredictionScore(channel.name.clone()),
            ));
        }
        columns
    }

    /// Map user input onto the vocabulary's canonical casing.
    /// Blank input is always accepted and stays blank.
    pub fn canonical_status(&self, input: &str) -> Result<String> {
        let key = normalize_status(input);
        if key.is_empty() {
            return Ok(String::new());
        }
        self.statuses
            .iter()
            .find(|s| normalize_status(s) == key)
            .cloned()
            .ok_or_else(|| CurateError::InvalidStatus(input.trim().to_string()))
    }

    /// Like [`Schema::canonical_status`], but a status outside the vocabulary
    /// is accepted when it is exactly the one already stored (`current`), so
    /// an edit that only touches the memo keeps a legacy status.
    pub fn edit_status(&self, input: &str, current: &str) -> Result<String> {
        let kept = current.trim();
        if !kept.is_empty() && input.trim() == kept {
            if let Ok(canonical) = self.canonical_status(kept) {
                return Ok(canonical);
            }
            return Ok(current.to_string());
        }
        self.canonical_status(input)
    }
}
