//! Error taxonomy for the search worker.
//!
//! Every failure surfaced to a client is one of a small set of categories;
//! the HTTP boundary maps each category to a status code and a short
//! message. Full detail (source chains, upstream bodies) stays server-side
//! in the logs.
//!
//! | Variant | HTTP | Recovery |
//! |---------|------|----------|
//! | `Validation` | 400 | never retried |
//! | `NotFound` | 404 | skipped at the indexer level |
//! | `SourceUnavailable` | 500 | stale cache generation served if present |
//! | `Transport` | 500 | propagated |
//! | `Cache` | 500 | propagated |
//! | `Config` | 500 | fail fast before any work |

use thiserror::Error;

/// The error type for all folio-search operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or rejected request input (query too short, bad filter).
    #[error("validation error: {0}")]
    Validation(String),

    /// A single source object is missing from the blob store.
    #[error("not found: {0}")]
    NotFound(String),

    /// The blob-store listing itself failed; the whole index pass is lost.
    #[error("content source unavailable: {0}")]
    SourceUnavailable(String),

    /// HTTP transport failure talking to an upstream store.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// KV cache read or write failed.
    #[error("cache error: {0}")]
    Cache(String),

    /// JSON (de)serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Missing or invalid configuration, including absent credentials.
    #[error("configuration error: {0}")]
    Config(String),

    /// Uncategorized internal failure.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Category identifier used in logs.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound(_) => "not_found",
            Self::SourceUnavailable(_) => "source_unavailable",
            Self::Transport(_) => "transport",
            Self::Cache(_) => "cache",
            Self::Serialization(_) => "serialization",
            Self::Config(_) => "config",
            Self::Other(_) => "other",
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
