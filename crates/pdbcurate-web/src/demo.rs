//! Bundled demo rows for `--offline`.
//!
//! Rows are laid out with the active schema's column names so every preset
//! (and most custom descriptors) can be served without a backend.

use pdbcurate_common::{FieldKind, Schema};
use pdbcurate_db::{MemoryBackend, Row};
use serde_json::{json, Value};

struct DemoEntry {
    id: u64,
    structure: &'static str,
    publication: &'static str,
    status: &'static str,
    release: &'static str,
    protein_type: &'static str,
    title: &'static str,
    prediction: (&'static str, f64),
}

const ENTRIES: &[DemoEntry] = &[
    DemoEntry { id: 1, structure: "1CRN", publication: "6265219", status: "", release: "1981-04-30 00:00:00", protein_type: "Plant protein", title: "Water and protein structure", prediction: ("no", 0.12) },
    DemoEntry { id: 2, structure: "4HHB", publication: "7373648", status: "Yes", release: "1984-07-17 00:00:00", protein_type: "Oxygen transport", title: "The crystal structure of human deoxyhaemoglobin", prediction: ("yes", 0.97) },
    DemoEntry { id: 3, structure: "2HHB", publication: "7373648", status: "", release: "1984-07-17 00:00:00", protein_type: "Oxygen transport", title: "The crystal structure of human deoxyhaemoglobin", prediction: ("yes", 0.91) },
    DemoEntry { id: 4, structure: "1UBQ", publication: "3041148", status: "Maybe", release: "1987-01-02 00:00:00", protein_type: "Chromosomal protein", title: "Structure of ubiquitin refined at 1.8 A resolution", prediction: ("maybe", 0.55) },
    DemoEntry { id: 5, structure: "6LU7", publication: "32272481", status: "", release: "2020-02-05 00:00:00", protein_type: "Viral protein", title: "Structure of Mpro from SARS-CoV-2", prediction: ("yes", 0.88) },
    DemoEntry { id: 6, structure: "6Y2E", publication: "32272481", status: "", release: "2020-03-04 00:00:00", protein_type: "Hydrolase", title: "Structure of Mpro from SARS-CoV-2", prediction: ("yes", 0.83) },
    DemoEntry { id: 7, structure: "7BV2", publication: "32358203", status: "No", release: "2020-04-22 00:00:00", protein_type: "Viral protein", title: "Structural basis for inhibition of the RNA-dependent RNA polymerase", prediction: ("no", 0.31) },
    DemoEntry { id: 8, structure: "3NIR", publication: "", status: "", release: "", protein_type: "", title: "", prediction: ("", 0.0) },
];

fn field_value(entry: &DemoEntry, key: &str, kind: FieldKind) -> Option<Value> {
    let value = match (key, kind) {
        ("PDB", _) => format!("https://www.rcsb.org/structure/{}", entry.structure),
        ("UniProt", _) => "https://www.uniprot.org/uniprotkb".to_string(),
        ("protein_type", _) | ("classification", _) => entry.protein_type.to_string(),
        ("title", _) => entry.title.to_string(),
        ("journal", _) => "Demo Journal".to_string(),
        ("organism", _) => "Homo sapiens".to_string(),
        (_, FieldKind::Number) => return Some(json!(1.8)),
        _ => return None,
    };
    (!value.is_empty()).then(|| Value::String(value))
}

fn demo_row(schema: &Schema, entry: &DemoEntry) -> Row {
    let cols = &schema.columns;
    let mut row = Row::new();
    row.insert(cols.id.clone(), json!(entry.id));
    row.insert(cols.structure.clone(), json!(entry.structure));
    // The backup table stores PubMed URLs, the annotated one bare ids.
    let publication = if schema.annotation.is_none() && !entry.publication.is_empty() {
        format!("https://pubmed.ncbi.nlm.nih.gov/{}/", entry.publication)
    } else {
        entry.publication.to_string()
    };
    row.insert(cols.publication.clone(), json!(publication));
    row.insert(cols.status.clone(), json!(entry.status));
    row.insert(cols.memo.clone(), json!(""));
    row.insert(cols.release_date.clone(), json!(entry.release));

    for field in &schema.fields {
        if let Some(value) = field_value(entry, &field.key, field.kind) {
            row.insert(field.key.clone(), value);
        }
    }

    let (label, score) = entry.prediction;
    if !label.is_empty() {
        for channel in &schema.predictions {
            if let Some(column) = &channel.label_column {
                row.insert(column.clone(), json!([label]));
            }
            if let Some(column) = &channel.score_column {
                row.insert(column.clone(), json!(score));
            }
        }
    }
    row
}

/// In-memory backend holding the demo rows (and an empty annotation table
/// when the schema has one).
pub fn demo_backend(schema: &Schema) -> MemoryBackend {
    let rows = ENTRIES.iter().map(|e| demo_row(schema, e)).collect();
    let backend = MemoryBackend::new().with_table(&schema.table, rows);
    match &schema.annotation {
        Some(annotation) => backend.with_table(&annotation.table, Vec::new()),
        None => backend,
    }
}
