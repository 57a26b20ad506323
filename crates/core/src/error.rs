//! # Errors
//!
//! The pipeline itself has no fallible arithmetic; everything here comes from
//! configuration, rendering, or a worker task that did not finish cleanly.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SieveError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("sampling percentage must be a finite value within 0..=100, got {0}")]
    InvalidSampling(f64),

    #[error("unsupported output format '{0}' (expected text, csv, json or md)")]
    UnknownFormat(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A generator or filter task panicked or was aborted.
    #[error("pipeline worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),

    /// The candidate stream ended before the bound was reached.
    #[error("pipeline closed after {found} of {wanted} primes")]
    PipelineClosed { found: usize, wanted: usize },
}

pub type Result<T> = std::result::Result<T, SieveError>;
