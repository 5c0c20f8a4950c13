//! Publication grouping.
//!
//! Records are partitioned by publication id. Groups keep first-seen order
//! (both of keys and of members within a key); any display order is applied
//! later by the filter engine.

use chrono::NaiveDate;
use pdbcurate_common::{FieldSpec, Record, StatusFilter, Summary};
use serde::Serialize;
use std::collections::HashMap;

use crate::dates::parse_release_date;

/// Records sharing one publication id. Never empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group {
    pub publication_id: String,
    members: Vec<Record>,
}

impl Group {
    pub fn members(&self) -> &[Record] {
        &self.members
    }

    /// The member whose values stand for the whole group.
    pub fn first(&self) -> &Record {
        &self.members[0]
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Release date of the first member, used for ordering.
    pub fn release_date(&self) -> Option<NaiveDate> {
        self.first().release_date.as_deref().and_then(parse_release_date)
    }

    pub fn structure_ids(&self) -> Vec<&str> {
        self.members.iter().map(|r| r.structure_id.as_str()).collect()
    }

    /// Distinct non-empty values in order of first appearance.
    pub fn distinct<'a, F>(&'a self, value: F) -> Vec<&'a str>
    where
        F: Fn(&'a Record) -> Option<&'a str>,
    {
        let mut seen: Vec<&str> = Vec::new();
        for v in self.members.iter().filter_map(value) {
            if !v.trim().is_empty() && !seen.contains(&v) {
                seen.push(v);
            }
        }
        seen
    }

    /// All release dates of the group, joined for display.
    pub fn release_dates(&self) -> String {
        self.distinct(|r| r.release_date.as_deref()).join(", ")
    }

    /// Card-level value of a descriptive field.
    pub fn summary(&self, field: &FieldSpec) -> String {
        match field.summary {
            Summary::First => self.first().field(&field.key).to_string(),
            Summary::Distinct => self.distinct(|r| Some(r.field(&field.key))).join(", "),
        }
    }

    /// True when any member's status satisfies the filter.
    pub fn matches_status(&self, filter: &StatusFilter) -> bool {
        self.members.iter().any(|r| filter.matches(&r.status))
    }

    /// True when any member's structure id contains `needle` (already
    /// lower-cased). An empty needle matches everything.
    pub fn matches_search(&self, needle: &str) -> bool {
        needle.is_empty()
            || self
                .members
                .iter()
                .any(|r| r.structure_id.to_lowercase().contains(needle))
    }
}

/// Result of grouping a record list.
#[derive(Debug, Clone, Default)]
pub struct Grouping {
    groups: Vec<Group>,
    index: HashMap<String, usize>,
    ungrouped: usize,
}

impl Grouping {
    /// Groups in first-seen order.
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn get(&self, publication_id: &str) -> Option<&Group> {
        self.index.get(publication_id).map(|&i| &self.groups[i])
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of records left out for lack of a publication id.
    pub fn ungrouped(&self) -> usize {
        self.ungrouped
    }
}

/// Partition records by publication id.
pub fn group_records<'a, I>(records: I) -> Grouping
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut grouping = Grouping::default();
    for record in records {
        let Some(key) = record.publication_id.as_deref() else {
            grouping.ungrouped += 1;
            continue;
        };
        match grouping.index.get(key) {
            Some(&i) => grouping.groups[i].members.push(record.clone()),
            None => {
                grouping.index.insert(key.to_string(), grouping.groups.len());
                grouping.groups.push(Group {
                    publication_id: key.to_string(),
                    members: vec![record.clone()],
                });
            }
        }
    }
    grouping
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdbcurate_common::{FieldKind, Schema};
    use proptest::prelude::*;

    fn rec(id: &str, structure: &str, publication: Option<&str>) -> Record {
        Record::new(id, structure, publication)
    }

    #[test]
    fn test_first_seen_order_and_singletons() {
        let records = vec![
            rec("1", "AAA", Some("p2")),
            rec("2", "BBB", Some("p1")),
            rec("3", "CCC", Some("p2")),
            rec("4", "DDD", None),
        ];
        let grouping = group_records(&records);

        let keys: Vec<&str> = grouping.groups().iter().map(|g| g.publication_id.as_str()).collect();
        assert_eq!(keys, vec!["p2", "p1"]);
        assert_eq!(grouping.get("p2").unwrap().structure_ids(), vec!["AAA", "CCC"]);
        assert_eq!(grouping.get("p1").unwrap().len(), 1);
        assert_eq!(grouping.ungrouped(), 1);
    }

    #[test]
    fn test_summaries_first_and_distinct() {
        let records = vec![
            rec("1", "AAA", Some("p")).with_field("journal", "Nature").with_field("kind", "Kinase"),
            rec("2", "BBB", Some("p")).with_field("journal", "Science").with_field("kind", "Kinase"),
            rec("3", "CCC", Some("p")).with_field("kind", "Transferase"),
        ];
        let grouping = group_records(&records);
        let group = grouping.get("p").unwrap();

        let journal = FieldSpec::new("journal", "Journal", FieldKind::Text, Summary::First);
        let kind = FieldSpec::new("kind", "Type", FieldKind::Text, Summary::Distinct);
        assert_eq!(group.summary(&journal), "Nature");
        assert_eq!(group.summary(&kind), "Kinase, Transferase");
    }

    #[test]
    fn test_release_dates_joined() {
        let records = vec![
            rec("1", "AAA", Some("p")).with_release_date("2020-01-01"),
            rec("2", "BBB", Some("p")).with_release_date("2020-01-01"),
            rec("3", "CCC", Some("p")).with_release_date("2021-05-05"),
        ];
        let grouping = group_records(&records);
        assert_eq!(grouping.get("p").unwrap().release_dates(), "2020-01-01, 2021-05-05");
    }

    #[test]
    fn test_status_scenario() {
        let records = vec![
            rec("1", "AAA", Some("1")).with_status("Yes"),
            rec("2", "BBB", Some("1")).with_status(""),
        ];
        let grouping = group_records(&records);
        let group = grouping.get("1").unwrap();
        assert_eq!(group.len(), 2);
        assert!(group.matches_status(&StatusFilter::parse("Yes")));
        assert!(group.matches_status(&StatusFilter::Blank));
        assert!(!group.matches_status(&StatusFilter::parse("No")));
        assert!(group.matches_search("bb"));
        assert!(!group.matches_search("zz"));
    }

    #[test]
    fn test_usc_schema_distinct_protein_type() {
        let schema = Schema::usc_backup();
        let field = schema.field("protein_type").unwrap();
        let records = vec![
            rec("1", "AAA", Some("p")).with_field("protein_type", "Enzyme"),
            rec("2", "BBB", Some("p")),
        ];
        let grouping = group_records(&records);
        assert_eq!(grouping.get("p").unwrap().summary(field), "Enzyme");
    }

    fn arb_records() -> impl Strategy<Value = Vec<Record>> {
        proptest::collection::vec(
            (proptest::option::of(0u8..6), "[A-Z0-9]{4}"),
            0..40,
        )
        .prop_map(|items| {
            items
                .into_iter()
                .enumerate()
                .map(|(i, (publication, structure))| {
                    let publication = publication.map(|p| format!("pub-{}", p));
                    Record::new(&i.to_string(), &structure, publication.as_deref())
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_groups_partition_grouped_records(records in arb_records()) {
            let grouping = group_records(&records);

            let grouped: usize = grouping.groups().iter().map(Group::len).sum();
            prop_assert_eq!(grouped + grouping.ungrouped(), records.len());

            for group in grouping.groups() {
                let expected: Vec<&Record> = records
                    .iter()
                    .filter(|r| r.publication_id.as_deref() == Some(group.publication_id.as_str()))
                    .collect();
                let actual: Vec<&Record> = group.members().iter().collect();
                prop_assert_eq!(actual, expected);
            }
        }
    }
}
