// src/error.rs
//! Error taxonomy for the headline pipeline.
//!
//! Only `SiteNotSupported` and `QueueUnavailable` ever reach an HTTP caller; everything
//! else happens inside a chain that already answered its request and is logged there.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Client asked for a site we have no extraction rule for.
    #[error("{site} not supported. it needs to be one of {}", supported.join(", "))]
    SiteNotSupported {
        site: String,
        supported: Vec<String>,
    },

    /// Homepage could not be retrieved (after retries).
    #[error("fetching {site} failed: {reason}")]
    FetchFailed { site: String, reason: String },

    /// Per-headline and non-fatal: text normalized to nothing.
    #[error("classification skipped for {text:?}: no tokens after preprocessing")]
    ClassificationSkipped { text: String },

    #[error("webhook delivery failed: {reason}")]
    NotifyFailed { reason: String },

    #[error("loading classifier model from {path} failed: {reason}")]
    ModelLoad { path: String, reason: String },

    #[error("news store error: {0}")]
    Store(String),

    #[error("chain queue unavailable: {0}")]
    QueueUnavailable(String),

    #[error("chain for {site} exceeded its {secs}s deadline")]
    DeadlineExceeded { site: String, secs: u64 },
}

impl From<sqlx::Error> for PipelineError {
    fn from(e: sqlx::Error) -> Self {
        PipelineError::Store(e.to_string())
    }
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
