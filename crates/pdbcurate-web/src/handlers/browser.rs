//! The record browser page.

use axum::extract::{Query, State};
use axum::response::Html;
use pdbcurate_common::{FieldKind, Record, Schema, StatusFilter, FILTER_ALL, FILTER_BLANK};
use pdbcurate_curation::{group_records, visible_groups, Group, ViewAction, ViewState};
use pdbcurate_structure::{entry_page_url, ThumbnailSource, ViewerConfig};
use serde::Serialize;

use super::current_snapshot;
use crate::error::ApiResult;
use crate::state::SharedState;

const PUBMED_BASE: &str = "https://pubmed.ncbi.nlm.nih.gov";

// ── View models ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct Banner {
    pub level: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
struct SelectOption {
    value: String,
    label: String,
    selected: bool,
}

#[derive(Debug, Serialize)]
struct HiddenField {
    name: &'static str,
    value: String,
}

#[derive(Debug, Serialize)]
struct LinkView {
    label: String,
    href: String,
}

#[derive(Debug, Serialize)]
struct FieldView {
    label: String,
    value: String,
    href: Option<String>,
}

#[derive(Debug, Serialize)]
struct PredictionView {
    channel: String,
    label: String,
    score: String,
}

#[derive(Debug, Serialize)]
struct MemberView {
    id: String,
    structure_id: String,
    release_day: String,
    thumbnail: Option<String>,
    fields: Vec<FieldView>,
    predictions: Vec<PredictionView>,
    links: Vec<LinkView>,
}

#[derive(Debug, Serialize)]
struct CardView {
    publication_id: String,
    publication_href: Option<String>,
    structures: Vec<LinkView>,
    structure_id: String,
    first_id: String,
    release_dates: String,
    summaries: Vec<FieldView>,
    predictions: Vec<PredictionView>,
    thumbnail: Option<String>,
    status: String,
    memo: String,
    status_options: Vec<SelectOption>,
    size: usize,
    expandable: bool,
    expanded: bool,
    toggle_href: String,
    editing: bool,
    edit_href: String,
    close_href: String,
    members: Vec<MemberView>,
}

#[derive(Debug, Serialize)]
struct PageView<'a> {
    title: &'a str,
    banners: Vec<Banner>,
    status_options: Vec<SelectOption>,
    search: &'a str,
    hidden: Vec<HiddenField>,
    sort_label: &'static str,
    sort_href: String,
    export_href: String,
    reload_href: String,
    view_query: String,
    cards: Vec<CardView>,
    group_count: usize,
    record_count: usize,
    ungrouped: usize,
    loaded: bool,
    token: u64,
    fetched_at: Option<String>,
    gate_enabled: bool,
    viewer: &'a ViewerConfig,
}

// ── Handler ──────────────────────────────────────────────────────────────────

pub async fn browser_page(
    State(state): State<SharedState>,
    Query(params): Query<Vec<(String, String)>>,
) -> ApiResult<Html<String>> {
    let view = ViewState::from_pairs(params.iter().cloned());
    let mut banners = banners_from(&params);

    let (snapshot, fetch_error) = current_snapshot(&state).await;
    if let Some(message) = fetch_error {
        banners.push(Banner { level: "warning", message });
    }

    let schema = state.schema.as_ref();
    let grouping = group_records(&snapshot.records);
    let shown = visible_groups(&grouping, &view.group_query());
    let cards = shown
        .into_iter()
        .map(|group| card_view(group, schema, &view, &state.thumbnails))
        .collect();

    let page = PageView {
        title: &schema.name,
        banners,
        status_options: filter_options(schema, &view.status),
        search: &view.search,
        hidden: hidden_fields(&view),
        sort_label: view.direction.label(),
        sort_href: view.href_after(ViewAction::ToggleSort),
        export_href: export_href(&view),
        reload_href: view.href(),
        view_query: view.clone().apply(ViewAction::CloseEditor).to_query(),
        cards,
        group_count: grouping.len(),
        record_count: snapshot.records.len(),
        ungrouped: grouping.ungrouped(),
        loaded: snapshot.is_loaded(),
        token: snapshot.token,
        fetched_at: snapshot
            .fetched_at
            .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
        gate_enabled: !state.gate.is_open(),
        viewer: &state.viewer,
    };

    Ok(Html(state.templates.render("browser.html", &page)?))
}

// ── Builders ─────────────────────────────────────────────────────────────────

fn banners_from(params: &[(String, String)]) -> Vec<Banner> {
    params
        .iter()
        .filter(|(_, v)| !v.trim().is_empty())
        .filter_map(|(k, v)| match k.as_str() {
            "error" => Some(Banner { level: "error", message: v.clone() }),
            "notice" => Some(Banner { level: "notice", message: v.clone() }),
            _ => None,
        })
        .collect()
}

fn filter_options(schema: &Schema, current: &StatusFilter) -> Vec<SelectOption> {
    let mut options = vec![
        SelectOption {
            value: FILTER_ALL.to_string(),
            label: "(All)".to_string(),
            selected: current.is_all(),
        },
        SelectOption {
            value: FILTER_BLANK.to_string(),
            label: "(Blank)".to_string(),
            selected: *current == StatusFilter::Blank,
        },
    ];
    for status in &schema.statuses {
        let filter = StatusFilter::parse(status);
        options.push(SelectOption {
            value: filter.as_param().to_string(),
            label: status.clone(),
            selected: filter == *current,
        });
    }
    options
}

/// Status choices for the edit form. A stored status outside the vocabulary
/// is offered as its own (selected) option so saving keeps it.
fn edit_options(schema: &Schema, current: &str) -> Vec<SelectOption> {
    let (current, legacy) = match schema.canonical_status(current) {
        Ok(canonical) => (canonical, None),
        Err(_) => (current.to_string(), Some(current.to_string())),
    };
    std::iter::once(String::new())
        .chain(legacy)
        .chain(schema.statuses.iter().cloned())
        .map(|status| SelectOption {
            label: if status.is_empty() { "(Blank)".to_string() } else { status.clone() },
            selected: status == current,
            value: status,
        })
        .collect()
}

/// Fields that keep the rest of the view when the filter form is submitted.
fn hidden_fields(view: &ViewState) -> Vec<HiddenField> {
    let query = view
        .clone()
        .apply(ViewAction::ClearFilters)
        .apply(ViewAction::CloseEditor);
    let mut hidden = Vec::new();
    if query.direction != Default::default() {
        hidden.push(HiddenField { name: "sort", value: query.direction.as_param().to_string() });
    }
    if !query.expanded.is_empty() {
        let joined = query.expanded.iter().map(String::as_str).collect::<Vec<_>>().join(",");
        hidden.push(HiddenField { name: "expanded", value: joined });
    }
    hidden
}

fn export_href(view: &ViewState) -> String {
    let filters = ViewState {
        status: view.status.clone(),
        search: view.search.clone(),
        ..Default::default()
    };
    let query = filters.to_query();
    if query.is_empty() {
        "/export.csv".to_string()
    } else {
        format!("/export.csv?{}", query)
    }
}

/// Link target for a publication id: URLs as-is, bare PubMed ids to PubMed.
fn publication_href(id: &str) -> Option<String> {
    let id = id.trim();
    if id.starts_with("http://") || id.starts_with("https://") {
        Some(id.to_string())
    } else if !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()) {
        Some(format!("{}/{}/", PUBMED_BASE, id))
    } else {
        None
    }
}

fn predictions(schema: &Schema, record: &Record) -> Vec<PredictionView> {
    schema
        .predictions
        .iter()
        .filter_map(|channel| record.prediction(&channel.name))
        .filter(|p| !p.is_empty())
        .map(|p| PredictionView {
            channel: p.channel.clone(),
            label: p.label_display().to_string(),
            score: p.score_display(),
        })
        .collect()
}

fn member_view(record: &Record, schema: &Schema, thumbnails: &ThumbnailSource) -> MemberView {
    let mut fields = Vec::new();
    let mut links = Vec::new();
    for spec in schema.fields.iter().filter(|f| f.on_detail) {
        let value = record.field(&spec.key);
        match spec.kind {
            FieldKind::Link => {
                if !value.is_empty() {
                    links.push(LinkView { label: spec.label.clone(), href: value.to_string() });
                }
            }
            _ => fields.push(FieldView {
                label: spec.label.clone(),
                value: if value.is_empty() { "N/A".to_string() } else { value.to_string() },
                href: None,
            }),
        }
    }
    if let Some(href) = publication_href(record.publication()) {
        links.push(LinkView { label: "Publication".to_string(), href });
    }

    MemberView {
        id: record.id.clone(),
        structure_id: record.structure_id.clone(),
        release_day: record.release_day().unwrap_or("N/A").to_string(),
        thumbnail: thumbnails.url(&record.structure_id),
        fields,
        predictions: predictions(schema, record),
        links,
    }
}

fn card_view(group: &Group, schema: &Schema, view: &ViewState, thumbnails: &ThumbnailSource) -> CardView {
    let first = group.first();
    let key = group.publication_id.clone();
    let expanded = view.is_expanded(&key);

    let summaries = schema
        .fields
        .iter()
        .filter(|f| f.on_card)
        .map(|spec| {
            let value = group.summary(spec);
            let href = (spec.kind == FieldKind::Link && !value.is_empty()).then(|| value.clone());
            FieldView { label: spec.label.clone(), value, href }
        })
        .collect();

    CardView {
        publication_href: publication_href(&key),
        structures: group
            .structure_ids()
            .into_iter()
            .map(|id| LinkView { label: id.to_string(), href: entry_page_url(id) })
            .collect(),
        structure_id: first.structure_id.clone(),
        first_id: first.id.clone(),
        release_dates: group.release_dates(),
        summaries,
        predictions: predictions(schema, first),
        thumbnail: thumbnails.url(&first.structure_id),
        status: first.status.clone(),
        memo: first.memo.clone(),
        status_options: edit_options(schema, &first.status),
        size: group.len(),
        expandable: group.len() > 1,
        expanded,
        toggle_href: view.href_after(ViewAction::ToggleExpanded(key.clone())),
        editing: view.is_editing(&key),
        edit_href: view.href_after(ViewAction::OpenEditor(key.clone())),
        close_href: view.href_after(ViewAction::CloseEditor),
        members: if expanded {
            group.members().iter().map(|r| member_view(r, schema, thumbnails)).collect()
        } else {
            Vec::new()
        },
        publication_id: key,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publication_href() {
        assert_eq!(
            publication_href("https://pubmed.ncbi.nlm.nih.gov/1/").as_deref(),
            Some("https://pubmed.ncbi.nlm.nih.gov/1/")
        );
        assert_eq!(
            publication_href("12345").as_deref(),
            Some("https://pubmed.ncbi.nlm.nih.gov/12345/")
        );
        assert_eq!(publication_href("doi:10.1/x"), None);
    }

    #[test]
    fn test_filter_options_mark_current() {
        let schema = Schema::usc_backup();
        let options = filter_options(&schema, &StatusFilter::parse("already in"));
        assert_eq!(options.len(), 2 + schema.statuses.len());
        let selected: Vec<&str> = options.iter().filter(|o| o.selected).map(|o| o.label.as_str()).collect();
        assert_eq!(selected, vec!["Already In"]);
        assert_eq!(options[0].value, FILTER_ALL);
    }

    #[test]
    fn test_edit_options_use_canonical_casing() {
        let schema = Schema::usc_backup();
        let options = edit_options(&schema, " yes ");
        let selected: Vec<&str> = options.iter().filter(|o| o.selected).map(|o| o.value.as_str()).collect();
        assert_eq!(selected, vec!["Yes"]);
        assert_eq!(options[0].label, "(Blank)");

        let legacy = edit_options(&schema, "Pending");
        let selected: Vec<&str> = legacy.iter().filter(|o| o.selected).map(|o| o.value.as_str()).collect();
        assert_eq!(selected, vec!["Pending"]);
        assert_eq!(legacy.len(), schema.statuses.len() + 2);
    }

    #[test]
    fn test_export_href_keeps_filters_only() {
        let view = ViewState::from_query("status=no&q=ab&sort=asc&expanded=1&edit=1");
        assert_eq!(export_href(&view), "/export.csv?status=no&q=ab");
        assert_eq!(export_href(&ViewState::default()), "/export.csv");
    }

    #[test]
    fn test_member_view_splits_links_and_fields() {
        let schema = Schema::usc_backup();
        let record = Record::new("7", "1ABC", Some("https://pubmed/9"))
            .with_field("PDB", "https://www.rcsb.org/structure/1ABC")
            .with_release_date("2020-02-02 00:00:00");
        let member = member_view(&record, &schema, &ThumbnailSource::default());

        assert_eq!(member.release_day, "2020-02-02");
        let labels: Vec<&str> = member.links.iter().map(|l| l.label.as_str()).collect();
        assert_eq!(labels, vec!["PDB Link", "Publication"]);
        assert_eq!(member.fields.len(), 1);
        assert_eq!(member.fields[0].value, "N/A");
    }
}
