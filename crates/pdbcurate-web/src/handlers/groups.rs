//! Group edit endpoint.

use axum::extract::{Form, State};
use axum::response::Redirect;
use pdbcurate_curation::{ViewAction, ViewState};
use pdbcurate_db::DbError;
use serde::Deserialize;
use tracing::{info, warn};
use url::form_urlencoded;

use crate::state::{AppEvent, SharedState};

#[derive(Debug, Deserialize)]
pub struct UpdateForm {
    pub publication_id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub memo: String,
    /// Query string of the page the form was submitted from.
    #[serde(default)]
    pub view: String,
}

/// `href` with one extra banner parameter.
fn with_banner(view: &ViewState, key: &str, message: &str) -> String {
    let mut query = view.to_query();
    let banner = form_urlencoded::Serializer::new(String::new())
        .append_pair(key, message)
        .finish();
    if !query.is_empty() {
        query.push('&');
    }
    query.push_str(&banner);
    format!("/?{}", query)
}

/// Apply status/memo to every record of a publication, then go back to the
/// page with a notice or an error banner.
pub async fn update_group(
    State(state): State<SharedState>,
    Form(form): Form<UpdateForm>,
) -> Redirect {
    let publication_id = form.publication_id.trim();
    let view = ViewState::from_query(&form.view).apply(ViewAction::CloseEditor);
    let token_before = state.store.snapshot().await.token;

    match state.store.update_group(publication_id, &form.status, &form.memo).await {
        Ok(outcome) => {
            info!(publication_id, records = outcome.updated.len(), "Group saved");
            state.publish(AppEvent::GroupUpdated {
                publication_id: outcome.publication_id.clone(),
                status: outcome.status.clone(),
                records: outcome.updated.len(),
            });
            let mut message = format!(
                "Saved status \"{}\" for {} record(s) of {}.",
                if outcome.status.is_empty() { "(Blank)" } else { outcome.status.as_str() },
                outcome.updated.len(),
                outcome.publication_id
            );
            match outcome.refresh {
                Some(refresh) if refresh.applied => {
                    state.publish(AppEvent::RecordsRefreshed {
                        token: refresh.token,
                        records: refresh.records,
                    });
                }
                Some(_) => {}
                None => message.push_str(" Reloading the records failed; the list may be out of date."),
            }
            Redirect::to(&with_banner(&view, "notice", &message))
        }
        Err(e) => {
            warn!(publication_id, error = %e, "Group update failed");
            if matches!(e, DbError::PartialUpdate { .. }) {
                // Only announce the refetch after the partial write if it landed.
                let snapshot = state.store.snapshot().await;
                if snapshot.token > token_before {
                    state.publish(AppEvent::RecordsRefreshed {
                        token: snapshot.token,
                        records: snapshot.records.len(),
                    });
                }
            }
            state.publish(AppEvent::UpdateFailed {
                publication_id: publication_id.to_string(),
                message: e.to_string(),
            });
            Redirect::to(&with_banner(&view, "error", &e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_banner_appends_encoded_message() {
        let view = ViewState::from_query("sort=asc");
        assert_eq!(
            with_banner(&view, "notice", "Saved & done"),
            "/?sort=asc&notice=Saved+%26+done"
        );
        assert_eq!(with_banner(&ViewState::default(), "error", "x"), "/?error=x");
    }
}
