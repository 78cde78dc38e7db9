use std::env::VarError;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::app_config::{AppConfig, FeedSource};
use crate::policy::StockPolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read schema file {path}: {source}")]
    SchemaFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse schema file: {0}")]
    SchemaFileParse(#[source] serde_yaml::Error),

    #[error("schema validation failed: {0}")]
    Validation(String),
}

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

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Like [`load_app_config`], but reads the feed from `path` regardless of
/// `HIPO_FEED_URL` / `HIPO_FEED_PATH`.
///
/// # Errors
///
/// Returns `ConfigError` if any other env value is invalid.
pub fn load_app_config_with_feed_file(path: &Path) -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    build_app_config(with_feed_file(|key| std::env::var(key), path))
}

/// Wraps `lookup` so the feed source always resolves to `path`.
fn with_feed_file<F>(lookup: F, path: &Path) -> impl Fn(&str) -> Result<String, VarError>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    let path = path.display().to_string();
    move |key| match key {
        "HIPO_FEED_URL" => Err(VarError::NotPresent),
        "HIPO_FEED_PATH" => Ok(path.clone()),
        other => lookup(other),
    }
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so tests can feed a `HashMap`.
pub(crate) fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.trim().parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.trim().parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let feed_source = match (lookup("HIPO_FEED_URL"), lookup("HIPO_FEED_PATH")) {
        (Ok(url), _) if !url.trim().is_empty() => FeedSource::Url(url.trim().to_string()),
        (_, Ok(path)) if !path.trim().is_empty() => FeedSource::File(PathBuf::from(path.trim())),
        _ => return Err(ConfigError::MissingEnvVar("HIPO_FEED_URL".to_string())),
    };

    let log_level = or_default("HIPO_LOG_LEVEL", "info");
    let schema_path = lookup("HIPO_SCHEMA_PATH")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from);

    let cache_ttl_secs = parse_u64("HIPO_CACHE_TTL_SECS", "600")?;

    let raw_policy = or_default("HIPO_STOCK_POLICY", "suppress-stale");
    let stock_policy =
        StockPolicy::parse(&raw_policy).ok_or_else(|| ConfigError::InvalidEnvVar {
            var: "HIPO_STOCK_POLICY".to_string(),
            reason: format!(
                "unknown policy '{raw_policy}'; expected suppress-stale, latest-record, \
                 require-delivery or declaration-only"
            ),
        })?;

    let alert_threshold_days = i64::from(parse_u32("HIPO_ALERT_THRESHOLD_DAYS", "30")?);

    let fetch_timeout_secs = parse_u64("HIPO_FETCH_TIMEOUT_SECS", "30")?;
    let fetch_user_agent = or_default("HIPO_FETCH_USER_AGENT", "hipo/0.1 (delivery-dashboard)");
    let fetch_max_retries = parse_u32("HIPO_FETCH_MAX_RETRIES", "2")?;
    let fetch_retry_backoff_base_secs = parse_u64("HIPO_FETCH_RETRY_BACKOFF_BASE_SECS", "1")?;

    Ok(AppConfig {
        feed_source,
        log_level,
        schema_path,
        cache_ttl_secs,
        stock_policy,
        alert_threshold_days,
        fetch_timeout_secs,
        fetch_user_agent,
        fetch_max_retries,
        fetch_retry_backoff_base_secs,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
