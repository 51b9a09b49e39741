//! Event ingestion: user upsert, session rollover and metric updates,
//! all in one transaction.

use std::net::IpAddr;

use serde_json::{Map, Value};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;
use uuid::Uuid;

use crate::analytics::geo::GeoResolver;
use crate::analytics::models::{AnalyticsEvent, EventRequest, Geo, SessionRow};
use crate::errors::AppError;

/// Longest user agent / referrer kept on a session.
const MAX_CLIENT_TEXT_CHARS: usize = 250;

/// Where the request came from, as seen by the HTTP layer.
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    pub forwarded_for: Option<String>,
    pub peer: Option<IpAddr>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
}

/// A validated event ready to be stored.
#[derive(Debug, Clone)]
pub struct EventInput {
    pub device_id: String,
    pub event: AnalyticsEvent,
    pub payload: Map<String, Value>,
    pub geo: Option<Geo>,
    pub user_agent: String,
    pub referrer: String,
}

impl EventInput {
    /// Body fields win over request headers for user agent and referrer.
    pub fn from_request(req: EventRequest, client: &ClientInfo) -> Result<Self, AppError> {
        let device_id = req.device_id.as_deref().unwrap_or("").trim().to_string();
        let event = req.event.as_deref().unwrap_or("").trim().to_string();
        if device_id.is_empty() || event.is_empty() {
            return Err(AppError::Validation(
                "device_id y event son requeridos".to_string(),
            ));
        }

        let pick = |body: Option<String>, header: &Option<String>| {
            let text = body
                .filter(|s| !s.is_empty())
                .or_else(|| header.clone())
                .unwrap_or_default();
            truncate_chars(&text, MAX_CLIENT_TEXT_CHARS)
        };

        Ok(Self {
            device_id,
            event: AnalyticsEvent::parse(&event),
            payload: req.payload.unwrap_or_default(),
            geo: req.geo,
            user_agent: pick(req.user_agent, &client.user_agent),
            referrer: pick(req.referrer, &client.referrer),
        })
    }

    /// Non-negative integer `time_to_first_prompt_ms`, if any.
    fn time_to_first_prompt_ms(&self) -> Option<i64> {
        self.payload
            .get("time_to_first_prompt_ms")
            .and_then(Value::as_i64)
            .filter(|ms| *ms >= 0)
    }

    /// Positive integer `delta_ms`, if any.
    fn heartbeat_delta_ms(&self) -> Option<i64> {
        self.payload
            .get("delta_ms")
            .and_then(Value::as_i64)
            .filter(|ms| *ms > 0)
    }

    fn prompt_json(&self) -> Value {
        match self.payload.get("prompt_initial_json") {
            Some(Value::Null) | None => Value::Object(Map::new()),
            Some(value) => value.clone(),
        }
    }
}

/// Records one event and returns the session it was attributed to.
pub async fn record_event(
    pool: &PgPool,
    geo: &GeoResolver,
    input: &EventInput,
    client: &ClientInfo,
) -> Result<Uuid, AppError> {
    let mut tx = pool.begin().await?;

    let user_id = upsert_user(&mut tx, &input.device_id).await?;

    let latest: Option<SessionRow> = sqlx::query_as(
        "SELECT * FROM sessions WHERE user_id = $1 ORDER BY started_at DESC LIMIT 1",
    )
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?;

    let session_id = match latest {
        Some(session)
            if session.ended_at.is_none() && input.event != AnalyticsEvent::InitSession =>
        {
            ensure_metrics_row(&mut tx, session.id).await?;
            session.id
        }
        _ => {
            let location = match &input.geo {
                Some(g) if g.has_country() => g.clone(),
                _ => {
                    geo.resolve(client.forwarded_for.as_deref(), client.peer)
                        .await
                }
            };
            start_session(&mut tx, user_id, &location, input).await?
        }
    };

    apply_event(&mut tx, session_id, input).await?;

    tx.commit().await?;
    debug!(%session_id, event = ?input.event, "analytics event recorded");
    Ok(session_id)
}

async fn upsert_user(tx: &mut Transaction<'_, Postgres>, device_id: &str) -> Result<Uuid, AppError> {
    let id: Uuid = sqlx::query_scalar(
        "INSERT INTO users (id, device_id) VALUES ($1, $2)
         ON CONFLICT (device_id) DO UPDATE SET device_id = EXCLUDED.device_id
         RETURNING id",
    )
    .bind(Uuid::new_v4())
    .bind(device_id)
    .fetch_one(&mut **tx)
    .await?;
    Ok(id)
}

async fn start_session(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    location: &Geo,
    input: &EventInput,
) -> Result<Uuid, AppError> {
    let session_id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO sessions (id, user_id, country, city, user_agent, referrer)
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(session_id)
    .bind(user_id)
    .bind(location.country.as_deref())
    .bind(location.city.as_deref())
    .bind(&input.user_agent)
    .bind(&input.referrer)
    .execute(&mut **tx)
    .await?;

    ensure_metrics_row(tx, session_id).await?;
    Ok(session_id)
}

async fn ensure_metrics_row(tx: &mut Transaction<'_, Postgres>, session_id: Uuid) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO session_metrics (session_id) VALUES ($1)
         ON CONFLICT (session_id) DO NOTHING",
    )
    .bind(session_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn apply_event(
    tx: &mut Transaction<'_, Postgres>,
    session_id: Uuid,
    input: &EventInput,
) -> Result<(), AppError> {
    match &input.event {
        AnalyticsEvent::EndSession => {
            sqlx::query("UPDATE sessions SET ended_at = now() WHERE id = $1")
                .bind(session_id)
                .execute(&mut **tx)
                .await?;
        }
        AnalyticsEvent::PromptCreated => {
            sqlx::query(
                "INSERT INTO prompts (id, session_id, prompt_initial_json) VALUES ($1, $2, $3)",
            )
            .bind(Uuid::new_v4())
            .bind(session_id)
            .bind(input.prompt_json())
            .execute(&mut **tx)
            .await?;

            // first prompt time is only set once
            sqlx::query(
                "UPDATE session_metrics
                 SET prompts_initial_count = prompts_initial_count + 1,
                     time_to_first_prompt_ms = CASE
                         WHEN time_to_first_prompt_ms = 0 AND $2::BIGINT IS NOT NULL THEN $2
                         ELSE time_to_first_prompt_ms
                     END
                 WHERE session_id = $1",
            )
            .bind(session_id)
            .bind(input.time_to_first_prompt_ms())
            .execute(&mut **tx)
            .await?;
        }
        AnalyticsEvent::Heartbeat => {
            if let Some(delta) = input.heartbeat_delta_ms() {
                sqlx::query(
                    "UPDATE session_metrics SET time_on_page_ms = time_on_page_ms + $2
                     WHERE session_id = $1",
                )
                .bind(session_id)
                .bind(delta)
                .execute(&mut **tx)
                .await?;
            }
        }
        event => {
            if let Some(column) = event.counter_column() {
                // column names come from a closed set, never from the request
                let sql = format!(
                    "UPDATE session_metrics SET {column} = {column} + 1 WHERE session_id = $1"
                );
                sqlx::query(&sql)
                    .bind(session_id)
                    .execute(&mut **tx)
                    .await?;
            }
        }
    }
    Ok(())
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
