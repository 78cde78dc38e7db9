//! Download of the published delivery spreadsheet.

use std::time::Duration;

use hipo_core::FeedSource;
use reqwest::Client;

use crate::error::FetchError;
use crate::rate_limit::retry_with_backoff;

/// HTTP client for a published CSV export.
///
/// Rate limiting (429), not-found (404) and other non-2xx responses map to
/// typed [`FetchError`]s. Network errors, 429 and 5xx are retried with
/// exponential backoff up to `max_retries` additional attempts.
pub struct FeedClient {
    client: Client,
    max_retries: u32,
    backoff_base_secs: u64,
}

impl FeedClient {
    /// Creates a `FeedClient` with a request timeout, `User-Agent` and retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            max_retries,
            backoff_base_secs,
        })
    }

    /// Fetches the feed body from a URL.
    ///
    /// # Errors
    ///
    /// - [`FetchError::InvalidUrl`] if `url` does not parse.
    /// - [`FetchError::RateLimited`] on 429 after all retries.
    /// - [`FetchError::NotFound`] on 404 (not retried).
    /// - [`FetchError::UnexpectedStatus`] on any other non-2xx (5xx retried).
    /// - [`FetchError::Http`] on network/TLS failure after all retries.
    pub async fn fetch_csv(&self, url: &str) -> Result<String, FetchError> {
        let parsed = reqwest::Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_owned(),
            reason: e.to_string(),
        })?;

        retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            let parsed = parsed.clone();
            async move {
                let response = self
                    .client
                    .get(parsed.as_str())
                    .header(reqwest::header::ACCEPT, "text/csv,text/plain;q=0.9,*/*;q=0.8")
                    .header(reqwest::header::CACHE_CONTROL, "no-cache")
                    .send()
                    .await?;
                let status = response.status();
                let url = parsed.to_string();

                if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    let retry_after_secs = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.parse::<u64>().ok())
                        .unwrap_or(60);
                    return Err(FetchError::RateLimited {
                        url,
                        retry_after_secs,
                    });
                }

                if status == reqwest::StatusCode::NOT_FOUND {
                    return Err(FetchError::NotFound { url });
                }

                if !status.is_success() {
                    return Err(FetchError::UnexpectedStatus {
                        status: status.as_u16(),
                        url,
                    });
                }

                Ok(response.text().await?)
            }
        })
        .await
    }

    /// Reads the feed from wherever `source` points.
    ///
    /// # Errors
    ///
    /// Any [`FetchError`] from [`FeedClient::fetch_csv`], or
    /// [`FetchError::FileIo`] for an unreadable local file.
    pub async fn fetch_source(&self, source: &FeedSource) -> Result<String, FetchError> {
        match source {
            FeedSource::Url(url) => self.fetch_csv(url).await,
            FeedSource::File(path) => {
                tokio::fs::read_to_string(path)
                    .await
                    .map_err(|e| FetchError::FileIo {
                        path: path.display().to_string(),
                        source: e,
                    })
            }
        }
    }
}
