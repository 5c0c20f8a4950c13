//! PostgREST (Supabase) client.
//!
//! API: {base}/rest/v1/{table}
//! - reads:   GET   ?select=a,b&order=col.desc
//! - updates: PATCH ?{key}=eq.{value}
//! - upserts: POST  ?on_conflict=a,b  with `Prefer: resolution=merge-duplicates`

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tracing::{debug, instrument};

use crate::backend::{OrderBy, RecordBackend, Row};
use crate::error::{DbError, Result};

const REST_PREFIX: &str = "rest/v1";
const USER_AGENT:  &str = "pdbcurate/0.1";

pub struct PostgrestBackend {
    client: Client,
    base_url: String,
    api_key: SecretString,
}

impl PostgrestBackend {
    pub fn new(base_url: &str, api_key: SecretString, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(DbError::InvalidQuery("backend url is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { client, base_url, api_key })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}/{}", self.base_url, REST_PREFIX, table)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        let key = self.api_key.expose_secret();
        builder.header("apikey", key).bearer_auth(key)
    }
}

/// Turn a non-2xx response into `DbError::Backend`, keeping PostgREST's
/// `message` when the body carries one.
async fn check(resp: Response, table: &str) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v["message"].as_str().map(String::from))
        .unwrap_or(body);

    if status == reqwest::StatusCode::NOT_FOUND && message.contains(table) {
        return Err(DbError::TableNotFound(table.to_string()));
    }

    Err(DbError::Backend { status: status.as_u16(), message })
}

#[async_trait]
impl RecordBackend for PostgrestBackend {
    #[instrument(skip(self, columns))]
    async fn select(
        &self,
        table: &str,
        columns: &[String],
        order: Option<&OrderBy>,
    ) -> Result<Vec<Row>> {
        let mut params = vec![("select".to_string(), columns.join(","))];
        if let Some(order) = order {
            let dir = if order.ascending { "asc" } else { "desc" };
            params.push(("order".to_string(), format!("{}.{}", order.column, dir)));
        }

        let resp = self
            .authorized(self.client.get(self.table_url(table)))
            .query(&params)
            .send()
            .await?;
        let rows: Vec<Row> = check(resp, table).await?.json().await?;

        debug!(table, rows = rows.len(), "PostgREST select");
        Ok(rows)
    }

    #[instrument(skip(self, patch))]
    async fn update(&self, table: &str, key_column: &str, key: &str, patch: &Row) -> Result<()> {
        let resp = self
            .authorized(self.client.patch(self.table_url(table)))
            .query(&[(key_column, format!("eq.{}", key))])
            .header("Prefer", "return=minimal")
            .json(patch)
            .send()
            .await?;
        check(resp, table).await?;
        Ok(())
    }

    #[instrument(skip(self, row))]
    async fn upsert(&self, table: &str, conflict_columns: &[String], row: &Row) -> Result<()> {
        let resp = self
            .authorized(self.client.post(self.table_url(table)))
            .query(&[("on_conflict", conflict_columns.join(","))])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&[row])
            .send()
            .await?;
        check(resp, table).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::{Query, State},
        http::{HeaderMap, StatusCode},
        routing::get,
        Json, Router,
    };
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Seen {
        requests: Mutex<Vec<(String, HashMap<String, String>, Option<String>, Option<Value>)>>,
    }

    async fn record(
        seen: &Seen,
        method: &str,
        params: HashMap<String, String>,
        headers: &HeaderMap,
        body: Option<Value>,
    ) {
        let prefer = headers.get("prefer").and_then(|v| v.to_str().ok()).map(String::from);
        seen.requests.lock().unwrap().push((method.to_string(), params, prefer, body));
    }

    async fn spawn_mock() -> (String, Arc<Seen>) {
        let seen = Arc::new(Seen::default());
        let app = Router::new()
            .route(
                "/rest/v1/pdb_USC_backup",
                get(|State(seen): State<Arc<Seen>>, headers: HeaderMap, Query(p): Query<HashMap<String, String>>| async move {
                    assert_eq!(headers.get("apikey").unwrap(), "secret-key");
                    assert_eq!(headers.get("authorization").unwrap(), "Bearer secret-key");
                    record(&seen, "GET", p, &headers, None).await;
                    Json(json!([{ "ID": 1, "structureid": "1CRN" }]))
                })
                .patch(|State(seen): State<Arc<Seen>>, headers: HeaderMap, Query(p): Query<HashMap<String, String>>, Json(body): Json<Value>| async move {
                    record(&seen, "PATCH", p, &headers, Some(body)).await;
                    StatusCode::NO_CONTENT
                })
                .post(|State(seen): State<Arc<Seen>>, headers: HeaderMap, Query(p): Query<HashMap<String, String>>, Json(body): Json<Value>| async move {
                    record(&seen, "POST", p, &headers, Some(body)).await;
                    (
                        StatusCode::CONFLICT,
                        Json(json!({ "code": "23505", "message": "duplicate key value" })),
                    )
                }),
            )
            .with_state(seen.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}/", addr), seen)
    }

    fn backend(url: &str) -> PostgrestBackend {
        PostgrestBackend::new(url, SecretString::from("secret-key"), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_select_sends_projection_and_order() {
        let (url, seen) = spawn_mock().await;
        let rows = backend(&url)
            .select(
                "pdb_USC_backup",
                &["ID".to_string(), "structureid".to_string()],
                Some(&OrderBy::desc("releaseDate")),
            )
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["structureid"], "1CRN");
        let requests = seen.requests.lock().unwrap();
        let (_, params, _, _) = &requests[0];
        assert_eq!(params["select"], "ID,structureid");
        assert_eq!(params["order"], "releaseDate.desc");
    }

    #[tokio::test]
    async fn test_update_filters_by_primary_key() {
        let (url, seen) = spawn_mock().await;
        let mut patch = Row::new();
        patch.insert("Status".to_string(), json!("Yes"));
        backend(&url).update("pdb_USC_backup", "ID", "42", &patch).await.unwrap();

        let requests = seen.requests.lock().unwrap();
        let (method, params, prefer, body) = &requests[0];
        assert_eq!(method, "PATCH");
        assert_eq!(params["ID"], "eq.42");
        assert_eq!(prefer.as_deref(), Some("return=minimal"));
        assert_eq!(body.as_ref().unwrap()["Status"], "Yes");
    }

    #[tokio::test]
    async fn test_upsert_error_keeps_backend_message() {
        let (url, seen) = spawn_mock().await;
        let mut row = Row::new();
        row.insert("pubmed_id".to_string(), json!("1"));
        let err = backend(&url)
            .upsert("pdb_USC_backup", &["pubmed_id".to_string(), "pdb_id".to_string()], &row)
            .await
            .unwrap_err();

        match err {
            DbError::Backend { status, message } => {
                assert_eq!(status, 409);
                assert_eq!(message, "duplicate key value");
            }
            other => panic!("unexpected error: {other}"),
        }
        let requests = seen.requests.lock().unwrap();
        let (_, params, prefer, body) = &requests[0];
        assert_eq!(params["on_conflict"], "pubmed_id,pdb_id");
        assert_eq!(prefer.as_deref(), Some("resolution=merge-duplicates,return=minimal"));
        assert!(body.as_ref().unwrap().is_array());
    }

    #[test]
    fn test_empty_url_rejected() {
        let result = PostgrestBackend::new("  ", SecretString::from("k"), Duration::from_secs(1));
        assert!(matches!(result, Err(DbError::InvalidQuery(_))));
    }
}
