//! # Sieve Events
//!
//! Progress notifications a caller can subscribe to while a run is in flight.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of sieve event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SieveEventKind {
    /// A filter stage was spliced onto the tail of the chain
    StageSpawned { index: usize, prime: u64 },
    /// A discovered prime was selected for reporting
    PrimeSampled { index: usize, prime: u64 },
    /// The driver reached its bound and broadcast shutdown
    ShutdownRequested { stages: usize },
    /// Every worker has been joined
    Completed { primes: usize, samples: usize },
}

/// An event emitted by the driver
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SieveEvent {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: SieveEventKind,
}

impl SieveEvent {
    pub fn new(kind: SieveEventKind) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
        }
    }
}
