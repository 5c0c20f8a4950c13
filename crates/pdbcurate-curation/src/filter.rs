//! Status/search filtering and release-date ordering of groups.

use chrono::NaiveDate;
use pdbcurate_common::StatusFilter;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::grouping::{Group, Grouping};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    #[serde(rename = "desc")]
    NewestFirst,
    #[serde(rename = "asc")]
    OldestFirst,
}

impl SortDirection {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "asc" => SortDirection::OldestFirst,
            _ => SortDirection::NewestFirst,
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            SortDirection::NewestFirst => SortDirection::OldestFirst,
            SortDirection::OldestFirst => SortDirection::NewestFirst,
        }
    }

    pub fn as_param(self) -> &'static str {
        match self {
            SortDirection::NewestFirst => "desc",
            SortDirection::OldestFirst => "asc",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortDirection::NewestFirst => "Newest First",
            SortDirection::OldestFirst => "Oldest First",
        }
    }
}

/// Everything that decides which groups are shown, and in which order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupQuery {
    pub status: StatusFilter,
    pub search: String,
    pub direction: SortDirection,
}

impl GroupQuery {
    /// Lower-cased, trimmed search string.
    fn needle(&self) -> String {
        self.search.trim().to_lowercase()
    }

    pub fn accepts(&self, group: &Group) -> bool {
        group.matches_status(&self.status) && group.matches_search(&self.needle())
    }
}

/// Compare two optional release dates. Undated entries go last in both
/// directions; the caller's stable sort keeps ties in grouping order.
pub(crate) fn compare_dates(
    a: Option<NaiveDate>,
    b: Option<NaiveDate>,
    direction: SortDirection,
) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => match direction {
            SortDirection::NewestFirst => y.cmp(&x),
            SortDirection::OldestFirst => x.cmp(&y),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Groups to display for a query, ordered by the first member's release date.
pub fn visible_groups<'g>(grouping: &'g Grouping, query: &GroupQuery) -> Vec<&'g Group> {
    let needle = query.needle();
    let mut keyed: Vec<(Option<NaiveDate>, &Group)> = grouping
        .groups()
        .iter()
        .filter(|g| g.matches_status(&query.status) && g.matches_search(&needle))
        .map(|g| (g.release_date(), g))
        .collect();

    keyed.sort_by(|(a, _), (b, _)| compare_dates(*a, *b, query.direction));
    keyed.into_iter().map(|(_, g)| g).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grouping::group_records;
    use pdbcurate_common::Record;
    use proptest::prelude::*;

    fn rec(id: &str, structure: &str, publication: &str, date: Option<&str>) -> Record {
        let r = Record::new(id, structure, Some(publication));
        match date {
            Some(d) => r.with_release_date(d),
            None => r,
        }
    }

    fn keys(groups: &[&Group]) -> Vec<String> {
        groups.iter().map(|g| g.publication_id.clone()).collect()
    }

    #[test]
    fn test_scenario_status_and_search() {
        let records = vec![
            rec("1", "AAA", "1", None).with_status("Yes"),
            rec("2", "BBB", "1", None).with_status(""),
        ];
        let grouping = group_records(&records);

        let by_status = GroupQuery { status: StatusFilter::parse("Yes"), ..Default::default() };
        let shown = visible_groups(&grouping, &by_status);
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].len(), 2);

        let by_search = GroupQuery { search: "bb".to_string(), ..Default::default() };
        assert_eq!(visible_groups(&grouping, &by_search).len(), 1);

        let miss = GroupQuery { search: "zzz".to_string(), ..Default::default() };
        assert!(visible_groups(&grouping, &miss).is_empty());
    }

    #[test]
    fn test_sort_by_first_member_date_with_undated_last() {
        let records = vec![
            rec("1", "A1", "old", Some("2019-01-01")),
            rec("2", "A2", "none", None),
            rec("3", "A3", "new", Some("2023-06-01 00:00:00")),
            rec("4", "A4", "old", Some("2030-01-01")),
            rec("5", "A5", "junk", Some("not a date")),
            rec("6", "A6", "mid", Some("2021-03-03")),
        ];
        let grouping = group_records(&records);

        let desc = GroupQuery::default();
        assert_eq!(keys(&visible_groups(&grouping, &desc)), vec!["new", "mid", "old", "none", "junk"]);

        let asc = GroupQuery { direction: SortDirection::OldestFirst, ..Default::default() };
        assert_eq!(keys(&visible_groups(&grouping, &asc)), vec!["old", "mid", "new", "none", "junk"]);
    }

    #[test]
    fn test_equal_dates_keep_grouping_order() {
        let records = vec![
            rec("1", "A1", "b", Some("2020-01-01")),
            rec("2", "A2", "a", Some("2020-01-01")),
            rec("3", "A3", "c", Some("2020-01-01")),
        ];
        let grouping = group_records(&records);
        for direction in [SortDirection::NewestFirst, SortDirection::OldestFirst] {
            let q = GroupQuery { direction, ..Default::default() };
            assert_eq!(keys(&visible_groups(&grouping, &q)), vec!["b", "a", "c"]);
        }
    }

    #[test]
    fn test_direction_params() {
        assert_eq!(SortDirection::parse("asc"), SortDirection::OldestFirst);
        assert_eq!(SortDirection::parse("whatever"), SortDirection::NewestFirst);
        assert_eq!(SortDirection::NewestFirst.toggle().as_param(), "asc");
        assert_eq!(SortDirection::OldestFirst.label(), "Oldest First");
    }

    fn arb_records() -> impl Strategy<Value = Vec<Record>> {
        let status = prop_oneof![
            Just(""),
            Just("  "),
            Just("Yes"),
            Just(" yes "),
            Just("No"),
            Just("Maybe"),
        ];
        let date = prop_oneof![
            Just(None),
            Just(Some("garbage")),
            Just(Some("2020-01-01")),
            Just(Some("2021-07-15 10:00:00")),
            Just(Some("1999")),
        ];
        proptest::collection::vec((0u8..8, "[A-D]{3}", status, date), 0..30).prop_map(|items| {
            items
                .into_iter()
                .enumerate()
                .map(|(i, (p, s, st, d))| {
                    rec(&i.to_string(), &s, &format!("p{}", p), d).with_status(st)
                })
                .collect()
        })
    }

    fn arb_filter() -> impl Strategy<Value = StatusFilter> {
        prop_oneof![
            Just(StatusFilter::All),
            Just(StatusFilter::Blank),
            Just(StatusFilter::parse("yes")),
            Just(StatusFilter::parse("No")),
            Just(StatusFilter::parse("already in")),
        ]
    }

    proptest! {
        #[test]
        fn prop_status_filter_iff_any_member_matches(records in arb_records(), filter in arb_filter()) {
            let grouping = group_records(&records);
            let query = GroupQuery { status: filter.clone(), ..Default::default() };
            let shown: Vec<String> = keys(&visible_groups(&grouping, &query));

            for group in grouping.groups() {
                let expected = group.members().iter().any(|r| match &filter {
                    StatusFilter::All => true,
                    StatusFilter::Blank => r.status.trim().is_empty(),
                    StatusFilter::Label(l) => r.status.trim().to_lowercase() == *l,
                });
                prop_assert_eq!(shown.contains(&group.publication_id), expected);
            }
        }

        #[test]
        fn prop_sort_is_reproducible_and_ordered(records in arb_records(), asc in any::<bool>()) {
            let direction = if asc { SortDirection::OldestFirst } else { SortDirection::NewestFirst };
            let query = GroupQuery { direction, ..Default::default() };

            let grouping = group_records(&records);
            let first = keys(&visible_groups(&grouping, &query));
            let again = keys(&visible_groups(&group_records(&records), &query));
            prop_assert_eq!(&first, &again);

            let shown = visible_groups(&grouping, &query);
            for pair in shown.windows(2) {
                prop_assert_ne!(
                    compare_dates(pair[0].release_date(), pair[1].release_date(), direction),
                    Ordering::Greater
                );
            }
        }
    }
}
