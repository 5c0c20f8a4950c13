//! Embedded static assets.

use axum::http::header;
use axum::response::IntoResponse;

use crate::templates::{APP_JS, MAIN_CSS};

pub async fn app_js() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/javascript; charset=utf-8")], APP_JS)
}

pub async fn main_css() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css; charset=utf-8")], MAIN_CSS)
}
