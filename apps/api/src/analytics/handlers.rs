use std::net::SocketAddr;

use axum::{
    body::Bytes,
    extract::{ConnectInfo, State},
    http::{header, HeaderMap},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analytics::events::{record_event, ClientInfo, EventInput};
use crate::analytics::models::{AnalyticsStats, EventRequest};
use crate::analytics::query::{clamp_limit, guard_select_query, run_readonly_query, QueryResult};
use crate::analytics::stats::fetch_stats;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct EventResponse {
    pub ok: bool,
    pub session_id: Uuid,
}

/// POST /api/analytics/event
///
/// The body is read as raw JSON whatever its content type, so
/// `navigator.sendBeacon` (text/plain) works.
pub async fn handle_event(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<EventResponse>, AppError> {
    let req = parse_event_body(&body)?;
    let client = client_info(&headers, connect_info.map(|ConnectInfo(addr)| addr));
    let input = EventInput::from_request(req, &client)?;

    let pool = state.db()?;
    let session_id = record_event(pool, &state.geo, &input, &client).await?;

    Ok(Json(EventResponse {
        ok: true,
        session_id,
    }))
}

/// GET /api/analytics/stats (admin)
pub async fn handle_stats(State(state): State<AppState>) -> Result<Json<AnalyticsStats>, AppError> {
    let stats = fetch_stats(state.db()?).await?;
    Ok(Json(stats))
}

#[derive(Debug, Default, Deserialize)]
pub struct QueryRequest {
    pub sql: Option<String>,
    pub limit: Option<i64>,
}

/// POST /api/analytics/query (admin)
pub async fn handle_query(
    State(state): State<AppState>,
    body: Option<Json<QueryRequest>>,
) -> Result<Json<QueryResult>, AppError> {
    let req = body.map(|Json(r)| r).unwrap_or_default();
    let guarded = guard_select_query(req.sql.as_deref().unwrap_or(""), clamp_limit(req.limit))?;

    let result = run_readonly_query(state.db()?, &guarded).await?;
    Ok(Json(result))
}

fn parse_event_body(body: &[u8]) -> Result<EventRequest, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(EventRequest::default());
    }
    serde_json::from_slice(body).map_err(|e| AppError::Validation(format!("bad json: {e}")))
}

fn client_info(headers: &HeaderMap, peer: Option<SocketAddr>) -> ClientInfo {
    let text = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    ClientInfo {
        forwarded_for: text("x-forwarded-for"),
        peer: peer.map(|addr| addr.ip()),
        user_agent: text(header::USER_AGENT.as_str()),
        referrer: text(header::REFERER.as_str()),
    }
}
