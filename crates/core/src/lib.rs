//! # Sieve Core
//!
//! A daisy-chained concurrent prime sieve: a generator task feeds candidates
//! into a chain of filter tasks, one per discovered prime, and a driver
//! splices a new filter onto the tail every time a prime falls out.
//!
//! ## Architecture
//!
//! - `pipeline/` - Generator, Filter and the driver that assembles them
//! - `sampling` - Index-based selection of which primes get reported
//! - `eratosthenes` - Sequential bitset sieve, used for value bounds and cross-checks
//! - `report` - Text, CSV, JSON and Markdown rendering of a run
//! - `config` - Layered run configuration
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sieve_core::{Bound, Sieve, SieveConfig};
//!
//! let config = SieveConfig {
//!     bound: Bound::Count(10),
//!     ..SieveConfig::default()
//! };
//! let outcome = Sieve::new(config)?.run().await?;
//! assert_eq!(outcome.primes, vec![2, 3, 5, 7, 11, 13, 17, 19, 23, 29]);
//! ```

pub mod config;
pub mod eratosthenes;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod sampling;

pub use config::{Bound, ConfigOverrides, SieveConfig};
pub use eratosthenes::{isqrt, prime_count, Eratosthenes};
pub use error::{Result, SieveError};
pub use pipeline::{
    Sieve, SieveEvent, SieveEventKind, SieveOutcome, StageDescriptor, StageExit, StageReport,
    StageState, StageTable,
};
pub use report::{OutputFormat, RunSummary};
pub use sampling::{PrimeSample, Sampler};
