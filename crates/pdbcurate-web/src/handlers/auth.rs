//! Login gate pages.

use axum::extract::{Form, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum_extra::headers::Cookie;
use axum_extra::TypedHeader;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::error::ApiResult;
use crate::session::{cleared_cookie, session_cookie, SESSION_COOKIE};
use crate::state::SharedState;

pub const INCORRECT_PASSWORD: &str = "Incorrect password";

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub password: String,
}

fn render_gate(state: &SharedState, error: Option<&str>) -> ApiResult<Html<String>> {
    let html = state.templates.render(
        "login.html",
        json!({ "title": state.schema.name, "error": error }),
    )?;
    Ok(Html(html))
}

pub async fn login_page(State(state): State<SharedState>) -> ApiResult<Response> {
    if state.gate.is_open() {
        return Ok(Redirect::to("/").into_response());
    }
    Ok(render_gate(&state, None)?.into_response())
}

pub async fn login_submit(
    State(state): State<SharedState>,
    Form(form): Form<LoginForm>,
) -> ApiResult<Response> {
    if !state.gate.verify(&form.password) {
        warn!("Rejected login attempt");
        let page = render_gate(&state, Some(INCORRECT_PASSWORD))?;
        return Ok((StatusCode::UNAUTHORIZED, page).into_response());
    }

    let id = state.gate.login().await;
    info!("Curator logged in");
    Ok((
        StatusCode::SEE_OTHER,
        [(header::LOCATION, "/".to_string()), (header::SET_COOKIE, session_cookie(id))],
    )
        .into_response())
}

pub async fn logout(
    State(state): State<SharedState>,
    cookie: Option<TypedHeader<Cookie>>,
) -> Response {
    if let Some(token) = cookie.as_ref().and_then(|TypedHeader(c)| c.get(SESSION_COOKIE)) {
        state.gate.logout(token).await;
    }
    (
        StatusCode::SEE_OTHER,
        [(header::LOCATION, "/login".to_string()), (header::SET_COOKIE, cleared_cookie())],
    )
        .into_response()
}
