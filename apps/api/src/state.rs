use sqlx::PgPool;

use crate::analytics::geo::GeoResolver;
use crate::config::Config;
use crate::errors::AppError;
use crate::llm_client::LlmGateway;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Every model call goes through here. Backends are fixed at startup.
    pub llm: LlmGateway,
    /// `None` when DATABASE_URL is unset; analytics routes then answer 503.
    pub db: Option<PgPool>,
    pub geo: GeoResolver,
}

impl AppState {
    pub fn db(&self) -> Result<&PgPool, AppError> {
        self.db.as_ref().ok_or(AppError::AnalyticsDisabled)
    }
}
