use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SessionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub ip_hash: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
}

/// Resolved or client-reported location of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geo {
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
}

impl Geo {
    pub fn has_country(&self) -> bool {
        self.country.as_deref().is_some_and(|c| !c.trim().is_empty())
    }
}

/// Client-side usage event names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalyticsEvent {
    InitSession,
    EndSession,
    PromptCreated,
    WrongAnswer,
    ImproveClick,
    ClipboardCopy,
    NewPromptClick,
    Heartbeat,
    /// Recorded against the session without touching any counter.
    Other(String),
}

impl AnalyticsEvent {
    pub fn parse(name: &str) -> Self {
        match name {
            "init_session" => AnalyticsEvent::InitSession,
            "end_session" => AnalyticsEvent::EndSession,
            "prompt_created" => AnalyticsEvent::PromptCreated,
            "wrong_answer" => AnalyticsEvent::WrongAnswer,
            "improve_click" => AnalyticsEvent::ImproveClick,
            "clipboard_copy" => AnalyticsEvent::ClipboardCopy,
            "new_prompt_click" => AnalyticsEvent::NewPromptClick,
            "heartbeat" => AnalyticsEvent::Heartbeat,
            other => AnalyticsEvent::Other(other.to_string()),
        }
    }

    /// Metrics column a counter event increments.
    pub fn counter_column(&self) -> Option<&'static str> {
        match self {
            AnalyticsEvent::WrongAnswer => Some("wrong_answer_count"),
            AnalyticsEvent::ImproveClick => Some("improve_clicks_count"),
            AnalyticsEvent::ClipboardCopy => Some("clipboard_copy_count"),
            AnalyticsEvent::NewPromptClick => Some("new_prompt_clicks_count"),
            _ => None,
        }
    }
}

/// POST /api/analytics/event body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventRequest {
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub event: Option<String>,
    #[serde(default)]
    pub payload: Option<Map<String, Value>>,
    #[serde(default)]
    pub geo: Option<Geo>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub referrer: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CountryCount {
    pub country: Option<String>,
    pub n: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsStats {
    pub ok: bool,
    pub total_sessions: i64,
    pub avg_seconds_on_page: Option<f64>,
    pub avg_seconds_to_first: Option<f64>,
    pub pct_improved: Option<f64>,
    pub top_countries: Vec<CountryCount>,
}
