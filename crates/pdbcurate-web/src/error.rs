//! HTTP error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pdbcurate_common::CurateError;
use pdbcurate_db::DbError;
use pdbcurate_structure::StructureError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Curate(#[from] CurateError),

    #[error(transparent)]
    Structure(#[from] StructureError),

    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Db(DbError::GroupNotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Db(DbError::Record(CurateError::InvalidStatus(_)))
            | ApiError::Curate(CurateError::InvalidStatus(_)) => StatusCode::BAD_REQUEST,
            ApiError::Db(_) => StatusCode::BAD_GATEWAY,
            ApiError::Curate(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Structure(StructureError::InvalidId(_))
            | ApiError::Structure(StructureError::UnknownScheme(_)) => StatusCode::BAD_REQUEST,
            ApiError::Structure(StructureError::Io(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Structure(_) => StatusCode::BAD_GATEWAY,
            ApiError::Template(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
