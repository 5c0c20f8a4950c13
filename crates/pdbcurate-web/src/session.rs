//! Shared-secret access gate.
//!
//! A correct password yields a random session id stored in memory and handed
//! to the browser as a cookie. Sessions are lost on restart and expire
//! after [`SESSION_TTL`].

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use axum_extra::headers::Cookie;
use axum_extra::TypedHeader;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::state::SharedState;

pub const SESSION_COOKIE: &str = "pdbcurate_session";
pub const SESSION_TTL: Duration = Duration::from_secs(12 * 60 * 60);

pub struct AccessGate {
    password: Option<SecretString>,
    /// Session id to issue time.
    sessions: RwLock<HashMap<Uuid, Instant>>,
    ttl: Duration,
}

impl AccessGate {
    pub fn new(password: Option<SecretString>) -> Self {
        Self {
            password,
            sessions: RwLock::new(HashMap::new()),
            ttl: SESSION_TTL,
        }
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// True when no shared secret is configured.
    pub fn is_open(&self) -> bool {
        self.password.is_none()
    }

    pub fn verify(&self, attempt: &str) -> bool {
        match &self.password {
            Some(secret) => secret.expose_secret() == attempt,
            None => true,
        }
    }

    /// Open a session, dropping any that have expired.
    pub async fn login(&self) -> Uuid {
        let id = Uuid::new_v4();
        let (sessions, expired) = {
            let mut sessions = self.sessions.write().await;
            let before = sessions.len();
            sessions.retain(|_, issued| issued.elapsed() < self.ttl);
            let expired = before - sessions.len();
            sessions.insert(id, Instant::now());
            (sessions.len(), expired)
        };
        info!(sessions, expired, "Session opened");
        id
    }

    pub async fn is_valid(&self, token: &str) -> bool {
        let Ok(id) = Uuid::parse_str(token) else {
            return false;
        };
        match self.sessions.read().await.get(&id) {
            Some(issued) => issued.elapsed() < self.ttl,
            None => false,
        }
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn logout(&self, token: &str) {
        if let Ok(id) = Uuid::parse_str(token) {
            self.sessions.write().await.remove(&id);
        }
    }

    /// Does this request carry a live session (or is the gate open)?
    pub async fn admits(&self, cookie: Option<&Cookie>) -> bool {
        if self.is_open() {
            return true;
        }
        match cookie.and_then(|c| c.get(SESSION_COOKIE)) {
            Some(token) => self.is_valid(token).await,
            None => false,
        }
    }
}

pub fn session_cookie(id: Uuid) -> String {
    format!("{}={}; HttpOnly; SameSite=Lax; Path=/", SESSION_COOKIE, id)
}

pub fn cleared_cookie() -> String {
    format!("{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0", SESSION_COOKIE)
}

/// Middleware for every gated route: pages redirect to `/login`, API calls
/// get a 401.
pub async fn require_session(
    State(state): State<SharedState>,
    cookie: Option<TypedHeader<Cookie>>,
    request: Request,
    next: Next,
) -> Response {
    let cookie = cookie.map(|TypedHeader(c)| c);
    if state.gate.admits(cookie.as_ref()).await {
        return next.run(request).await;
    }

    let path = request.uri().path();
    debug!(path, "Rejecting request without a session");
    if path.starts_with("/api/") {
        (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Not authenticated" }))).into_response()
    } else {
        Redirect::to("/login").into_response()
    }
}
