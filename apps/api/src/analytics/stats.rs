use sqlx::PgPool;

use crate::analytics::models::{AnalyticsStats, CountryCount};
use crate::errors::AppError;

/// How many countries the dashboard lists.
const TOP_COUNTRIES: i64 = 5;

/// Dashboard aggregates over all sessions.
///
/// Averages are `None` when there is nothing to average. Sessions without a
/// recorded first prompt are left out of the time-to-first-prompt average.
pub async fn fetch_stats(pool: &PgPool) -> Result<AnalyticsStats, AppError> {
    let total_sessions: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions")
        .fetch_one(pool)
        .await?;

    let (avg_seconds_on_page, avg_seconds_to_first, pct_improved): (
        Option<f64>,
        Option<f64>,
        Option<f64>,
    ) = sqlx::query_as(
        "SELECT
            (AVG(sm.time_on_page_ms) / 1000.0)::FLOAT8,
            (AVG(NULLIF(sm.time_to_first_prompt_ms, 0)) / 1000.0)::FLOAT8,
            (100.0 * SUM(CASE WHEN sm.improve_clicks_count > 0 THEN 1 ELSE 0 END)
                / NULLIF(COUNT(*), 0))::FLOAT8
         FROM session_metrics sm",
    )
    .fetch_one(pool)
    .await?;

    let top_countries: Vec<CountryCount> = sqlx::query_as(
        "SELECT s.country, COUNT(*) AS n
         FROM sessions s
         GROUP BY s.country
         ORDER BY n DESC
         LIMIT $1",
    )
    .bind(TOP_COUNTRIES)
    .fetch_all(pool)
    .await?;

    Ok(AnalyticsStats {
        ok: true,
        total_sessions,
        avg_seconds_on_page,
        avg_seconds_to_first,
        pct_improved,
        top_countries,
    })
}
