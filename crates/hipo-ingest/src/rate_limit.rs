//! Retry with exponential backoff for feed downloads.
//!
//! Spreadsheet exports (Google Sheets in particular) answer with 429 or a
//! transient 5xx under load; those are retried. Everything else is returned
//! to the caller on the first attempt.

use std::future::Future;
use std::time::Duration;

use crate::error::FetchError;

/// Returns `true` if `err` represents a transient condition worth retrying.
///
/// Retriable: [`FetchError::RateLimited`], [`FetchError::Http`] (network
/// failure, timeout) and [`FetchError::UnexpectedStatus`] with a 5xx code.
fn is_retriable(err: &FetchError) -> bool {
    match err {
        FetchError::RateLimited { .. } | FetchError::Http(_) => true,
        FetchError::UnexpectedStatus { status, .. } => (500..600).contains(status),
        FetchError::NotFound { .. } | FetchError::InvalidUrl { .. } | FetchError::FileIo { .. } => {
            false
        }
    }
}

/// Executes `operation`, retrying transient failures.
///
/// The wait before retry `n` (1-based) is `backoff_base_secs * 2^(n-1)`
/// seconds. With `max_retries = 2` the operation runs at most 3 times; the
/// last error is returned once retries are exhausted.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    mut operation: F,
) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut attempt = 0u32;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if !is_retriable(&err) || attempt >= max_retries {
            return Err(err);
        }

        let delay_secs = backoff_base_secs.saturating_mul(1u64 << attempt.min(62));
        tracing::warn!(
            attempt,
            max_retries,
            delay_secs,
            error = %err,
            "transient feed fetch error, retrying after backoff"
        );
        tokio::time::sleep(Duration::from_secs(delay_secs)).await;
        attempt += 1;
    }
}
