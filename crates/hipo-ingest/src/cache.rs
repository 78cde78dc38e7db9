//! Time-bounded cache of the loaded feed.
//!
//! One cached [`LoadedFeed`] plus the instant it was fetched. The caller
//! supplies `now`, so expiry is testable without sleeping.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use hipo_core::{FeedSource, SchemaMapping};

use crate::client::FeedClient;
use crate::error::IngestError;
use crate::load::{load_feed, LoadedFeed};

/// Anything that can produce a fresh [`LoadedFeed`].
pub trait FeedLoader {
    fn load(&self) -> impl Future<Output = Result<LoadedFeed, IngestError>> + Send;
}

/// Fetches the configured source and normalizes it with the schema mapping.
pub struct FeedReader {
    client: FeedClient,
    source: FeedSource,
    mapping: SchemaMapping,
}

impl FeedReader {
    #[must_use]
    pub fn new(client: FeedClient, source: FeedSource, mapping: SchemaMapping) -> Self {
        Self {
            client,
            source,
            mapping,
        }
    }

    #[must_use]
    pub fn source(&self) -> &FeedSource {
        &self.source
    }
}

impl FeedLoader for FeedReader {
    fn load(&self) -> impl Future<Output = Result<LoadedFeed, IngestError>> + Send {
        async move {
            let body = self
                .client
                .fetch_source(&self.source)
                .await
                .map_err(|source| IngestError::SourceUnavailable {
                    feed: self.source.to_string(),
                    source,
                })?;
            tracing::debug!(feed = %self.source, bytes = body.len(), "fetched delivery feed");
            load_feed(body.as_bytes(), &self.mapping)
        }
    }
}

struct CacheEntry {
    fetched_at: DateTime<Utc>,
    feed: Arc<LoadedFeed>,
}

/// Holds at most one loaded feed for `ttl`.
pub struct FeedCache<L> {
    loader: L,
    ttl: TimeDelta,
    entry: Option<CacheEntry>,
}

impl<L: FeedLoader> FeedCache<L> {
    /// A `ttl_secs` of 0 disables caching: every call loads afresh.
    #[must_use]
    pub fn new(loader: L, ttl_secs: u64) -> Self {
        let ttl = i64::try_from(ttl_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or_else(TimeDelta::max_value);
        Self {
            loader,
            ttl,
            entry: None,
        }
    }

    /// Returns the cached feed if it was fetched less than `ttl` before
    /// `now`, otherwise loads, caches and returns a fresh one.
    ///
    /// A cache entry stamped in the future (clock moved backwards) counts as
    /// expired.
    ///
    /// # Errors
    ///
    /// Propagates the loader's [`IngestError`]. A failed reload discards the
    /// previous entry; an expired feed is never served.
    pub async fn get_or_fetch(
        &mut self,
        now: DateTime<Utc>,
    ) -> Result<Arc<LoadedFeed>, IngestError> {
        if let Some(entry) = &self.entry {
            let age = now - entry.fetched_at;
            if age >= TimeDelta::zero() && age < self.ttl {
                tracing::debug!(age_secs = age.num_seconds(), "serving cached delivery feed");
                return Ok(Arc::clone(&entry.feed));
            }
        }

        self.entry = None;
        let feed = Arc::new(self.loader.load().await?);
        self.entry = Some(CacheEntry {
            fetched_at: now,
            feed: Arc::clone(&feed),
        });
        Ok(feed)
    }

    /// Drops the cached entry so the next call reloads.
    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    #[must_use]
    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.entry.as_ref().map(|e| e.fetched_at)
    }
}
