//! Axum router: maps all URL paths to handlers.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

use crate::handlers::{
    api::{api_groups, api_refresh, api_structure, health},
    assets::{app_js, main_css},
    auth::{login_page, login_submit, logout},
    browser::browser_page,
    export::export_download,
    groups::update_group,
};
use crate::session::require_session;
use crate::sse::sse_handler;
use crate::state::SharedState;

/// Build and return the full Axum router.
pub fn build_router(state: SharedState) -> Router {
    let gated = Router::new()
        // Pages
        .route("/",              get(browser_page))
        .route("/groups/update", post(update_group))
        .route("/export.csv",    get(export_download))
        .route("/logout",        post(logout))

        // SSE streaming
        .route("/api/events", get(sse_handler))

        // API endpoints
        .route("/api/groups",         get(api_groups))
        .route("/api/refresh",        post(api_refresh))
        .route("/api/structure/{id}", get(api_structure))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session));

    Router::new()
        .route("/login",          get(login_page).post(login_submit))
        .route("/health",         get(health))
        .route("/static/app.js",  get(app_js))
        .route("/static/main.css", get(main_css))
        .merge(gated)

        // Middleware
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
