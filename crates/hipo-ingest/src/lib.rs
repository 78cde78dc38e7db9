//! Feed ingestion: download, CSV decoding, schema resolution, row
//! normalization and the time-bounded feed cache.

pub mod cache;
pub mod client;
pub mod error;
pub mod load;
pub mod normalize;
pub mod parse;

mod rate_limit;

pub use cache::{FeedCache, FeedLoader, FeedReader};
pub use client::FeedClient;
pub use error::{FetchError, IngestError, IssueKind, ParseIssue};
pub use load::{load_feed, LoadedFeed};
pub use normalize::{normalize_row, NormalizedRow};
