//! CSV export.
//!
//! Every field is double-quoted (embedded quotes doubled), fields are joined
//! with commas and rows with `\n`, without a trailing newline. Absent values
//! are written as empty strings.

use csv::{QuoteStyle, Terminator, WriterBuilder};
use pdbcurate_common::{ExportOrder, ExportScope, Record, Result, Schema};
use tracing::debug;

use crate::dates::parse_release_date;
use crate::filter::{compare_dates, GroupQuery, SortDirection};
use crate::grouping::group_records;

/// Select and order the records an export should contain.
///
/// With `ExportScope::All` the query is ignored and every record in the store
/// is exported, including records without a publication id.
pub fn export_records<'r>(records: &'r [Record], schema: &Schema, query: &GroupQuery) -> Vec<&'r Record> {
    let mut selected: Vec<&Record> = match schema.export.scope {
        ExportScope::All => records.iter().collect(),
        ExportScope::Visible => {
            let grouping = group_records(records);
            records
                .iter()
                .filter(|r| {
                    r.publication_id
                        .as_deref()
                        .and_then(|p| grouping.get(p))
                        .is_some_and(|g| query.accepts(g))
                })
                .collect()
        }
    };

    match schema.export.order {
        ExportOrder::Publication => selected.sort_by(|a, b| {
            match (a.publication_id.as_deref(), b.publication_id.as_deref()) {
                (Some(x), Some(y)) => x.cmp(y),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            }
        }),
        ExportOrder::ReleaseDate => selected.sort_by(|a, b| {
            compare_dates(
                a.release_date.as_deref().and_then(parse_release_date),
                b.release_date.as_deref().and_then(parse_release_date),
                SortDirection::NewestFirst,
            )
        }),
    }
    selected
}

/// Encode records as CSV using the schema's export columns.
pub fn export_csv<'r, I>(records: I, schema: &Schema) -> Result<String>
where
    I: IntoIterator<Item = &'r Record>,
{
    let columns = schema.export_columns();
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(columns.iter().map(|c| c.label.as_str()))?;
    let mut rows = 0usize;
    for record in records {
        writer.write_record(columns.iter().map(|c| record.column_value(&c.source)))?;
        rows += 1;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    let mut text = String::from_utf8_lossy(&bytes).into_owned();
    if text.ends_with('\n') {
        text.pop();
    }

    debug!(rows, columns = columns.len(), "CSV export encoded");
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use csv::ReaderBuilder;
    use pdbcurate_common::StatusFilter;

    fn usc_records() -> Vec<Record> {
        vec![
            Record::new("3", "CCC", Some("https://pubmed/200"))
                .with_status("No")
                .with_release_date("2021-01-01"),
            Record::new("1", "AAA", None).with_memo("orphan"),
            Record::new("2", "BBB", Some("https://pubmed/100"))
                .with_status("Yes")
                .with_memo("He said \"ok\"")
                .with_field("PDB", "https://www.rcsb.org/structure/BBB")
                .with_release_date("2023-04-05 00:00:00"),
        ]
    }

    fn decode(text: &str) -> Vec<Vec<String>> {
        ReaderBuilder::new()
            .has_headers(false)
            .from_reader(text.as_bytes())
            .records()
            .map(|r| r.unwrap().iter().map(String::from).collect())
            .collect()
    }

    #[test]
    fn test_quoting_and_layout() {
        let schema = Schema::usc_backup();
        let records = usc_records();
        let text = export_csv(&records[2..], &schema).unwrap();

        let lines: Vec<&str> = text.split('\n').collect();
        assert_eq!(
            lines[0],
            r#""ID","Status","Memo","StructureID","PubMed","PDB","UniProt","ReleaseDate","Protein Type""#
        );
        assert_eq!(
            lines[1],
            r#""2","Yes","He said ""ok""","BBB","https://pubmed/100","https://www.rcsb.org/structure/BBB","","2023-04-05 00:00:00","""#
        );
        assert_eq!(lines.len(), 2);
        assert!(!text.ends_with('\n'));
    }

    #[test]
    fn test_round_trip_recovers_values() {
        let schema = Schema::usc_backup();
        let records = usc_records();
        let text = export_csv(&records, &schema).unwrap();

        let rows = decode(&text);
        assert_eq!(rows.len(), 4);
        let quoted = rows.iter().find(|r| r[0] == "2").unwrap();
        assert_eq!(quoted[2], "He said \"ok\"");
        let orphan = rows.iter().find(|r| r[0] == "1").unwrap();
        assert_eq!(orphan[4], "");
        assert_eq!(orphan[2], "orphan");
    }

    #[test]
    fn test_publication_order_puts_missing_last() {
        let schema = Schema::usc_backup();
        let records = usc_records();
        let ids: Vec<&str> = export_records(&records, &schema, &GroupQuery::default())
            .iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(ids, vec!["2", "3", "1"]);
    }

    #[test]
    fn test_release_date_order() {
        let mut schema = Schema::usc_backup();
        schema.export.order = ExportOrder::ReleaseDate;
        let records = usc_records();
        let ids: Vec<&str> = export_records(&records, &schema, &GroupQuery::default())
            .iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(ids, vec!["2", "3", "1"]);
    }

    #[test]
    fn test_scope_all_ignores_filter_but_visible_honours_it() {
        let mut schema = Schema::usc_backup();
        let records = usc_records();
        let query = GroupQuery { status: StatusFilter::parse("no"), ..Default::default() };

        assert_eq!(export_records(&records, &schema, &query).len(), 3);

        schema.export.scope = ExportScope::Visible;
        let ids: Vec<&str> = export_records(&records, &schema, &query)
            .iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(ids, vec!["3"]);
    }

    #[test]
    fn test_prediction_columns_for_derived_layout() {
        let schema = Schema::annotated();
        let mut record = Record::new("5", "5EEE", Some("9"));
        record.predictions.push(pdbcurate_common::Prediction {
            channel: "primary".to_string(),
            label: Some("binder".to_string()),
            score: Some(0.5),
        });
        let text = export_csv([&record], &schema).unwrap();
        let rows = decode(&text);
        let header = &rows[0];
        let label_col = header.iter().position(|h| h == "primary label").unwrap();
        let score_col = header.iter().position(|h| h == "primary score").unwrap();
        assert_eq!(rows[1][label_col], "binder");
        assert_eq!(rows[1][score_col], "0.500");
        let secondary = header.iter().position(|h| h == "secondary score").unwrap();
        assert_eq!(rows[1][secondary], "");
    }
}
