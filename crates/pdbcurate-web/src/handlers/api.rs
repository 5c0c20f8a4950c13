//! JSON API: groups, forced refresh, structure coordinates, health.

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use pdbcurate_curation::{group_records, visible_groups, ViewState};
use serde_json::{json, Value};

use super::current_snapshot;
use crate::error::ApiResult;
use crate::state::SharedState;

/// Visible groups for the same query parameters as the browser page.
pub async fn api_groups(
    State(state): State<SharedState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Json<Value> {
    let view = ViewState::from_pairs(params);
    let (snapshot, fetch_error) = current_snapshot(&state).await;

    let grouping = group_records(&snapshot.records);
    let groups = visible_groups(&grouping, &view.group_query());

    Json(json!({
        "token": snapshot.token,
        "fetched_at": snapshot.fetched_at,
        "warning": fetch_error,
        "total_groups": grouping.len(),
        "ungrouped": grouping.ungrouped(),
        "groups": groups,
    }))
}

pub async fn api_refresh(State(state): State<SharedState>) -> ApiResult<Json<Value>> {
    let outcome = state.refresh().await?;
    Ok(Json(json!({
        "records": outcome.records,
        "token": outcome.token,
        "applied": outcome.applied,
    })))
}

/// PDB coordinates for the 3D viewer.
pub async fn api_structure(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let text = state.fetcher.read_pdb(&id).await?;
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], text))
}

pub async fn health(State(state): State<SharedState>) -> Json<Value> {
    let snapshot = state.store.snapshot().await;
    Json(json!({
        "status": "ok",
        "dataset": state.schema.name,
        "table": state.schema.table,
        "loaded": snapshot.is_loaded(),
        "records": snapshot.records.len(),
        "token": snapshot.token,
    }))
}
