//! Analytics schema initialization.

use anyhow::Context;
use sqlx::PgPool;
use tracing::info;

/// Creates the analytics tables if they don't exist. Called once at startup.
pub async fn init_analytics_schema(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS users (
            id UUID PRIMARY KEY,
            device_id VARCHAR(128) NOT NULL UNIQUE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create users table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS sessions (
            id UUID PRIMARY KEY,
            user_id UUID NOT NULL REFERENCES users(id),
            started_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            ended_at TIMESTAMPTZ,
            ip_hash VARCHAR(128),
            country VARCHAR(64),
            city VARCHAR(64),
            user_agent VARCHAR(256),
            referrer VARCHAR(256)
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create sessions table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS session_metrics (
            session_id UUID PRIMARY KEY REFERENCES sessions(id),
            prompts_initial_count INTEGER NOT NULL DEFAULT 0,
            wrong_answer_count INTEGER NOT NULL DEFAULT 0,
            improve_clicks_count INTEGER NOT NULL DEFAULT 0,
            time_on_page_ms BIGINT NOT NULL DEFAULT 0,
            time_to_first_prompt_ms BIGINT NOT NULL DEFAULT 0,
            clipboard_copy_count INTEGER NOT NULL DEFAULT 0,
            new_prompt_clicks_count INTEGER NOT NULL DEFAULT 0
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create session_metrics table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS prompts (
            id UUID PRIMARY KEY,
            session_id UUID NOT NULL REFERENCES sessions(id),
            prompt_initial_json JSONB NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create prompts table")?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_sessions_user_started
         ON sessions(user_id, started_at DESC)",
    )
    .execute(pool)
    .await
    .context("Failed to create idx_sessions_user_started")?;

    info!("Analytics schema ready");
    Ok(())
}
