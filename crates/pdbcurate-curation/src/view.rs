//! Browser view state.
//!
//! A `ViewState` is a plain value: the page is rendered from it, links and
//! forms carry it in the URL query, and every user interaction produces a new
//! state through `apply`. Nothing here is stored server-side.

use pdbcurate_common::StatusFilter;
use std::collections::BTreeSet;
use url::form_urlencoded;

use crate::filter::{GroupQuery, SortDirection};

/// Query parameter names.
pub const PARAM_STATUS: &str = "status";
pub const PARAM_SEARCH: &str = "q";
pub const PARAM_SORT: &str = "sort";
pub const PARAM_EXPANDED: &str = "expanded";
pub const PARAM_EDIT: &str = "edit";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub status: StatusFilter,
    pub search: String,
    pub direction: SortDirection,
    /// Publication ids whose member list is open.
    pub expanded: BTreeSet<String>,
    /// Publication id whose edit form is open.
    pub editing: Option<String>,
}

/// One discrete user interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewAction {
    SetStatus(StatusFilter),
    SetSearch(String),
    ToggleSort,
    ToggleExpanded(String),
    OpenEditor(String),
    CloseEditor,
    /// Clear filters and search, keep sort direction.
    ClearFilters,
}

impl ViewState {
    /// Build a state from a raw (undecoded) query string. Unknown keys are
    /// ignored; missing keys take their defaults.
    pub fn from_query(raw: &str) -> Self {
        Self::from_pairs(
            form_urlencoded::parse(raw.trim_start_matches('?').as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned())),
        )
    }

    /// Build a state from decoded key/value pairs (e.g. form fields).
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut state = ViewState::default();
        for (key, value) in pairs {
            match key.as_str() {
                PARAM_STATUS => state.status = StatusFilter::parse(&value),
                PARAM_SEARCH => state.search = value.trim().to_string(),
                PARAM_SORT => state.direction = SortDirection::parse(&value),
                PARAM_EXPANDED => state.expanded.extend(
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from),
                ),
                PARAM_EDIT => {
                    let value = value.trim();
                    state.editing = (!value.is_empty()).then(|| value.to_string());
                }
                _ => {}
            }
        }
        state
    }

    /// Encode as a query string (without the leading `?`). Defaults are
    /// omitted so the plain page URL stays `/`.
    pub fn to_query(&self) -> String {
        let mut out = form_urlencoded::Serializer::new(String::new());
        if !self.status.is_all() {
            out.append_pair(PARAM_STATUS, self.status.as_param());
        }
        if !self.search.is_empty() {
            out.append_pair(PARAM_SEARCH, &self.search);
        }
        if self.direction != SortDirection::default() {
            out.append_pair(PARAM_SORT, self.direction.as_param());
        }
        if !self.expanded.is_empty() {
            let joined = self.expanded.iter().map(String::as_str).collect::<Vec<_>>().join(",");
            out.append_pair(PARAM_EXPANDED, &joined);
        }
        if let Some(editing) = &self.editing {
            out.append_pair(PARAM_EDIT, editing);
        }
        out.finish()
    }

    /// Page URL for this state.
    pub fn href(&self) -> String {
        let query = self.to_query();
        if query.is_empty() {
            "/".to_string()
        } else {
            format!("/?{}", query)
        }
    }

    /// URL of the state reached by `action`.
    pub fn href_after(&self, action: ViewAction) -> String {
        self.clone().apply(action).href()
    }

    pub fn apply(mut self, action: ViewAction) -> Self {
        match action {
            ViewAction::SetStatus(status) => self.status = status,
            ViewAction::SetSearch(search) => self.search = search.trim().to_string(),
            ViewAction::ToggleSort => self.direction = self.direction.toggle(),
            ViewAction::ToggleExpanded(id) => {
                if !self.expanded.remove(&id) {
                    self.expanded.insert(id);
                }
            }
            ViewAction::OpenEditor(id) => self.editing = Some(id),
            ViewAction::CloseEditor => self.editing = None,
            ViewAction::ClearFilters => {
                self.status = StatusFilter::All;
                self.search.clear();
            }
        }
        self
    }

    pub fn is_expanded(&self, publication_id: &str) -> bool {
        self.expanded.contains(publication_id)
    }

    pub fn is_editing(&self, publication_id: &str) -> bool {
        self.editing.as_deref() == Some(publication_id)
    }

    pub fn group_query(&self) -> GroupQuery {
        GroupQuery {
            status: self.status.clone(),
            search: self.search.clone(),
            direction: self.direction,
        }
    }
}
