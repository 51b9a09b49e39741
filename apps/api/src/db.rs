use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::analytics::schema::init_analytics_schema;

/// Creates the PostgreSQL pool and makes sure the analytics tables exist.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    init_analytics_schema(&pool).await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}
