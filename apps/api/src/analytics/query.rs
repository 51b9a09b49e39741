//! Read-only ad-hoc SQL for the admin dashboard.
//!
//! The guard is textual and conservative: one statement, starting with
//! SELECT, no write or DDL keyword anywhere as a whole word. Row limits are
//! always enforced.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::{Column, Executor, PgPool};
use thiserror::Error;

use crate::errors::AppError;

pub const MAX_QUERY_ROWS: i64 = 100;

static FORBIDDEN_KEYWORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:INSERT|UPDATE|DELETE|DROP|ALTER|CREATE|TRUNCATE|REINDEX|VACUUM|PRAGMA|ATTACH|DETACH|COPY|GRANT|REVOKE)\b",
    )
    .unwrap()
});

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryRejection {
    #[error("sql required")]
    Empty,
    #[error("only SELECT is allowed")]
    NotSelect,
    #[error("multiple statements are not allowed")]
    MultipleStatements,
    #[error("keyword not allowed")]
    ForbiddenKeyword,
}

impl From<QueryRejection> for AppError {
    fn from(e: QueryRejection) -> Self {
        AppError::Validation(e.to_string())
    }
}

/// A statement that passed the guard, with its LIMIT in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardedQuery(String);

impl GuardedQuery {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Clamps a requested row limit to `1..=100`; missing means 100.
pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(MAX_QUERY_ROWS).clamp(1, MAX_QUERY_ROWS)
}

pub fn guard_select_query(sql: &str, limit: i64) -> Result<GuardedQuery, QueryRejection> {
    let sql = sql.trim();
    if sql.is_empty() {
        return Err(QueryRejection::Empty);
    }

    let upper = sql.to_uppercase();
    if !upper.starts_with("SELECT") {
        return Err(QueryRejection::NotSelect);
    }
    if sql.contains(';') {
        return Err(QueryRejection::MultipleStatements);
    }
    if FORBIDDEN_KEYWORDS.is_match(sql) {
        return Err(QueryRejection::ForbiddenKeyword);
    }

    if upper.contains("LIMIT") {
        Ok(GuardedQuery(sql.to_string()))
    } else {
        Ok(GuardedQuery(format!("{sql} LIMIT {limit}")))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub ok: bool,
    pub columns: Vec<String>,
    /// Every non-null value stringified; column order follows `columns`.
    pub rows: Vec<Map<String, Value>>,
}

/// Runs a guarded query. Database errors in the user's SQL are reported as
/// validation errors.
pub async fn run_readonly_query(pool: &PgPool, query: &GuardedQuery) -> Result<QueryResult, AppError> {
    let described = pool
        .describe(query.as_str())
        .await
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let columns: Vec<String> = described
        .columns()
        .iter()
        .map(|c| c.name().to_string())
        .collect();

    let wrapped = format!(
        "SELECT row_to_json(q)::text FROM ({}) AS q",
        query.as_str()
    );
    let raw_rows: Vec<String> = sqlx::query_scalar(&wrapped)
        .fetch_all(pool)
        .await
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let rows = raw_rows
        .iter()
        .map(|raw| {
            let object: Map<String, Value> = serde_json::from_str(raw).unwrap_or_default();
            columns
                .iter()
                .map(|col| {
                    let value = object.get(col).map(stringify).unwrap_or(Value::Null);
                    (col.clone(), value)
                })
                .collect()
        })
        .collect();

    Ok(QueryResult {
        ok: true,
        columns,
        rows,
    })
}

fn stringify(value: &Value) -> Value {
    match value {
        Value::Null => Value::Null,
        Value::String(s) => Value::String(s.clone()),
        other => Value::String(other.to_string()),
    }
}
