//! # Daisy-Chain Pipeline
//!
//! ```text
//! Generator → Filter(2) → Filter(3) → Filter(5) → ... → driver
//! ```
//!
//! Every worker is its own tokio task. Values only move left to right, each
//! channel has exactly one writer and one reader, and no stage shares memory
//! with another.

pub mod driver;
pub mod events;
pub mod filter;
pub mod generator;
pub mod shutdown;
pub mod stage;

pub use driver::{Sieve, SieveOutcome};
pub use events::{SieveEvent, SieveEventKind};
pub use filter::{passes, spawn_filter};
pub use generator::{spawn_generator, FIRST_CANDIDATE};
pub use shutdown::{Shutdown, ShutdownSignal};
pub use stage::{StageDescriptor, StageExit, StageReport, StageRole, StageState, StageTable};
