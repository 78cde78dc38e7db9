use hipo_core::{Field, SchemaError};
use thiserror::Error;

/// Failure to obtain the raw feed bytes.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate limited by {url} (retry after {retry_after_secs}s)")]
    RateLimited { url: String, retry_after_secs: u64 },

    #[error("feed not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("invalid feed URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("failed to read {path}: {source}")]
    FileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Fatal errors for one pipeline run. Nothing is rendered when any of these
/// is returned.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("delivery feed {feed} is unavailable: {source}")]
    SourceUnavailable {
        feed: String,
        #[source]
        source: FetchError,
    },

    #[error("malformed CSV feed: {0}")]
    MalformedFeed(#[source] csv::Error),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// What went wrong with a single field of a single row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IssueKind {
    MissingLocation,
    UnparsableDate,
    MissingCoordinates,
    UnparsableCoordinates,
    CoordinatesOutOfRange,
    NonNumeric,
    NegativeCount,
    UnparsablePeriod,
}

impl std::fmt::Display for IssueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            IssueKind::MissingLocation => "missing location",
            IssueKind::UnparsableDate => "unparsable date",
            IssueKind::MissingCoordinates => "missing coordinates",
            IssueKind::UnparsableCoordinates => "unparsable coordinates",
            IssueKind::CoordinatesOutOfRange => "coordinates out of range",
            IssueKind::NonNumeric => "non-numeric count",
            IssueKind::NegativeCount => "negative count",
            IssueKind::UnparsablePeriod => "unparsable year/month",
        };
        f.write_str(text)
    }
}

/// Non-fatal per-row warning. The row is degraded (field nulled or zeroed)
/// or, for [`IssueKind::MissingLocation`], skipped; the run continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {kind} in column '{field}' (value {value:?})")]
pub struct ParseIssue {
    pub line: usize,
    pub field: Field,
    pub value: String,
    pub kind: IssueKind,
}
