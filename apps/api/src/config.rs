use std::time::Duration;

use anyhow::{Context, Result};

use crate::llm_client::gemini::DEFAULT_BASE_URL;

const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_ADMIN_KEY: &str = "Bootcamp1";

/// Application configuration loaded from environment variables.
/// Every variable has a default; only malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub rust_log: String,
    /// Analytics is disabled when unset.
    pub database_url: Option<String>,
    pub admin_key: String,

    pub ollama_enabled: bool,
    pub ollama_host: String,
    pub ollama_model: String,

    pub gemini_api_key: Option<String>,
    pub gemini_base_url: String,
    pub gemini_text_model: String,
    pub gemini_validator_model: String,
    pub gemini_improver_model: String,

    pub llm_timeout: Duration,
    pub geo_timeout: Duration,
    /// Demo mode answers every GeoIP lookup with a fixed location.
    pub demo_mode: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key → value source. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let var_or = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_string());

        let admin_key = match var("ADMIN_KEY") {
            Some(key) => key,
            None => {
                tracing::warn!("ADMIN_KEY not set, using the built-in default");
                DEFAULT_ADMIN_KEY.to_string()
            }
        };

        let llm_timeout_secs = var_or("LLM_TIMEOUT_SECS", "60")
            .parse::<u64>()
            .context("LLM_TIMEOUT_SECS must be a whole number of seconds")?;
        let geo_timeout_secs = var_or("GEO_TIMEOUT", "2.0")
            .parse::<f64>()
            .ok()
            .filter(|s| s.is_finite() && *s >= 0.0)
            .context("GEO_TIMEOUT must be a non-negative number of seconds")?;

        Ok(Config {
            host: var_or("HOST", "0.0.0.0"),
            port: var_or("PORT", "5000")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: var_or("RUST_LOG", "info"),
            database_url: var("DATABASE_URL"),
            admin_key,
            ollama_enabled: parse_flag(var("OLLAMA_ENABLED").as_deref(), false),
            ollama_host: var_or("OLLAMA_HOST", "http://localhost:11434"),
            ollama_model: var_or("LLM_MODEL", "mistral"),
            gemini_api_key: var("GEMINI_API_KEY").or_else(|| var("GEMINI_APIKEY")),
            gemini_base_url: var_or("GEMINI_BASE_URL", DEFAULT_BASE_URL),
            gemini_text_model: var_or("GEMINI_TEXT_MODEL", DEFAULT_GEMINI_MODEL),
            gemini_validator_model: var_or("GEMINI_VALIDATOR_MODEL", DEFAULT_GEMINI_MODEL),
            gemini_improver_model: var_or("GEMINI_IMPROVER_MODEL", DEFAULT_GEMINI_MODEL),
            llm_timeout: Duration::from_secs(llm_timeout_secs),
            geo_timeout: Duration::from_secs_f64(geo_timeout_secs),
            demo_mode: parse_flag(var("BOOTCAMP_MODE").as_deref(), false),
        })
    }
}

fn parse_flag(value: Option<&str>, default: bool) -> bool {
    match value.map(str::to_lowercase).as_deref() {
        Some("1" | "true" | "yes" | "on") => true,
        Some(_) => false,
        None => default,
    }
}
