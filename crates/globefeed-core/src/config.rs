use thiserror::Error;

use crate::app_config::{AppConfig, Environment};

/// Errors raised while loading configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for env var {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Built-in finance feeds used when `GLOBEFEED_RSS_FEEDS` is unset.
const DEFAULT_RSS_FEEDS: &[&str] = &[
    "https://feeds.content.dowjones.io/public/rss/mw_topstories",
    "https://www.cnbc.com/id/100003114/device/rss/rss.html",
    "https://feeds.a.dj.com/rss/RSSMarketsMain.xml",
];

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the
/// process, without touching `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// The core parsing/validation logic, decoupled from the actual environment so
/// it can be tested with a pure `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    // The LLM key is the only hard requirement: every other upstream can
    // degrade to an empty contribution, event synthesis cannot.
    let llm_api_key = require("GLOBEFEED_LLM_API_KEY")?;

    let env = parse_environment(&or_default("GLOBEFEED_ENV", "development"));
    let bind_addr = parse_addr("GLOBEFEED_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("GLOBEFEED_LOG_LEVEL", "info");

    let rss_feeds: Vec<String> = match lookup("GLOBEFEED_RSS_FEEDS") {
        Ok(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToOwned::to_owned)
            .collect(),
        Err(_) => DEFAULT_RSS_FEEDS.iter().map(ToString::to_string).collect(),
    };

    let forum_base_url = or_default("GLOBEFEED_FORUM_BASE_URL", "https://www.reddit.com");
    let forum_community = or_default("GLOBEFEED_FORUM_COMMUNITY", "wallstreetbets");
    let linkagg_base_url = or_default(
        "GLOBEFEED_LINKAGG_BASE_URL",
        "https://hacker-news.firebaseio.com/v0",
    );
    let provider_base_url = or_default(
        "GLOBEFEED_PROVIDER_BASE_URL",
        "https://api.marketaux.com/v1",
    );
    let provider_api_key = lookup("GLOBEFEED_PROVIDER_API_KEY").ok();

    let llm_base_url = or_default(
        "GLOBEFEED_LLM_BASE_URL",
        "https://generativelanguage.googleapis.com",
    );
    let llm_model = or_default("GLOBEFEED_LLM_MODEL", "gemini-2.0-flash");

    let cache_ttl_secs = parse_u64("GLOBEFEED_CACHE_TTL_SECS", "60")?;
    let request_timeout_secs = parse_u64("GLOBEFEED_REQUEST_TIMEOUT_SECS", "10")?;
    let llm_max_retries = parse_u32("GLOBEFEED_LLM_MAX_RETRIES", "2")?;
    let llm_retry_backoff_ms = parse_u64("GLOBEFEED_LLM_RETRY_BACKOFF_MS", "500")?;

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        rss_feeds,
        forum_base_url,
        forum_community,
        linkagg_base_url,
        provider_base_url,
        provider_api_key,
        llm_base_url,
        llm_model,
        llm_api_key,
        cache_ttl_secs,
        request_timeout_secs,
        llm_max_retries,
        llm_retry_backoff_ms,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}
