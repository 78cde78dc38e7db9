use std::path::PathBuf;

use crate::policy::StockPolicy;

/// Where the delivery spreadsheet is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedSource {
    /// Published CSV export, e.g. a Google Sheets `output=csv` link.
    Url(String),
    /// Local CSV file.
    File(PathBuf),
}

impl std::fmt::Display for FeedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedSource::Url(url) => f.write_str(url),
            FeedSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub feed_source: FeedSource,
    pub log_level: String,
    /// Optional YAML override of the built-in column aliases.
    pub schema_path: Option<PathBuf>,
    /// 0 disables caching.
    pub cache_ttl_secs: u64,
    pub stock_policy: StockPolicy,
    pub alert_threshold_days: i64,
    pub fetch_timeout_secs: u64,
    pub fetch_user_agent: String,
    pub fetch_max_retries: u32,
    pub fetch_retry_backoff_base_secs: u64,
}
