//! CSV download.

use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use pdbcurate_curation::{export_csv, export_records, ViewState};
use tracing::{info, warn};

use super::current_snapshot;
use crate::error::ApiResult;
use crate::state::SharedState;

pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

pub async fn export_download(
    State(state): State<SharedState>,
    Query(params): Query<Vec<(String, String)>>,
) -> ApiResult<Response> {
    let view = ViewState::from_pairs(params);
    let (snapshot, fetch_error) = current_snapshot(&state).await;
    if let Some(message) = fetch_error {
        warn!(%message, "Exporting without fresh data");
    }

    let schema = state.schema.as_ref();
    let records = export_records(&snapshot.records, schema, &view.group_query());
    let rows = records.len();
    let body = export_csv(records, schema)?;

    info!(rows, filename = %schema.export.filename, "CSV exported");
    let disposition = format!(
        "attachment; filename=\"{}\"",
        schema.export.filename.replace('"', "")
    );
    Ok((
        [
            (header::CONTENT_TYPE, CSV_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}
