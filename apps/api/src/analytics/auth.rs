//! Admin gate for the analytics reporting routes.
//!
//! The key is accepted from the `X-Admin-Key` header or a `key` query
//! parameter. Stateless: every request carries it.

use axum::{
    extract::{Query, Request, State},
    http::{HeaderMap, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::errors::AppError;
use crate::state::AppState;

pub const ADMIN_KEY_HEADER: &str = "x-admin-key";

#[derive(Debug, Deserialize)]
struct AdminKeyQuery {
    key: Option<String>,
}

pub async fn require_admin(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if presented_key_matches(req.headers(), req.uri(), &state.config.admin_key) {
        next.run(req).await
    } else {
        tracing::warn!(path = %req.uri().path(), "Rejected analytics request without admin key");
        AppError::Unauthorized.into_response()
    }
}

fn presented_key_matches(headers: &HeaderMap, uri: &Uri, expected: &str) -> bool {
    let header_ok = headers
        .get(ADMIN_KEY_HEADER)
        .and_then(|h| h.to_str().ok())
        .is_some_and(|v| v == expected);
    if header_ok {
        return true;
    }

    // Percent-decoded, `+` as space.
    Query::<AdminKeyQuery>::try_from_uri(uri)
        .ok()
        .and_then(|Query(q)| q.key)
        .is_some_and(|key| key == expected)
}
