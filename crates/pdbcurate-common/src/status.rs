//! Curator status labels and the status filter.
//!
//! Statuses are free strings in the backend. Comparison is always done on the
//! trimmed, lower-cased form; display keeps whatever casing the row carries.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reserved filter value matching every group.
pub const FILTER_ALL: &str = "__ALL__";
/// Reserved filter value matching blank / whitespace-only statuses.
pub const FILTER_BLANK: &str = "__EMPTY__";

/// Normalized comparison key for a status string.
pub fn normalize_status(status: &str) -> String {
    status.trim().to_lowercase()
}

/// Active status filter for the browser view.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StatusFilter {
    #[default]
    All,
    Blank,
    /// Normalized label (trimmed, lower-case).
    Label(String),
}

impl StatusFilter {
    /// Parse a filter value as it arrives from a form or query string.
    /// An empty value means "no filter".
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(FILTER_ALL) {
            StatusFilter::All
        } else if trimmed.eq_ignore_ascii_case(FILTER_BLANK) {
            StatusFilter::Blank
        } else {
            StatusFilter::Label(normalize_status(trimmed))
        }
    }

    /// Does a single record status satisfy this filter?
    pub fn matches(&self, status: &str) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Blank => status.trim().is_empty(),
            StatusFilter::Label(label) => normalize_status(status) == *label,
        }
    }

    /// Value used in URLs and `<select>` options.
    pub fn as_param(&self) -> &str {
        match self {
            StatusFilter::All => FILTER_ALL,
            StatusFilter::Blank => FILTER_BLANK,
            StatusFilter::Label(label) => label,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, StatusFilter::All)
    }
}

impl From<String> for StatusFilter {
    fn from(raw: String) -> Self {
        StatusFilter::parse(&raw)
    }
}

impl From<StatusFilter> for String {
    fn from(filter: StatusFilter) -> Self {
        filter.as_param().to_string()
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_param())
    }
}
