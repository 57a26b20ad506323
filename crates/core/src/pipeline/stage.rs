//! # Pipeline Stages
//!
//! Bookkeeping for the filter chain. The channels carry the data; this table
//! records the topology so a finished run can be inspected.

use serde::{Deserialize, Serialize};

/// Lifecycle of a single filter stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StageState {
    /// Consuming and conditionally forwarding
    #[default]
    Active,
    /// Shutdown was broadcast, the task is unwinding
    Draining,
    /// The task has been joined
    Stopped,
}

impl StageState {
    fn can_transition(self, next: StageState) -> bool {
        matches!(
            (self, next),
            (StageState::Active, StageState::Draining)
                | (StageState::Active, StageState::Stopped)
                | (StageState::Draining, StageState::Stopped)
        )
    }
}

/// One filter stage, keyed by the prime it strikes out
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDescriptor {
    /// Position in the chain, starting at 0
    pub index: usize,
    /// Divisor applied by this stage
    pub prime: u64,
    /// Stage feeding this one; `None` means the generator
    pub upstream: Option<usize>,
    pub state: StageState,
}

/// Ordered arena of stages with index-based linkage
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StageTable {
    stages: Vec<StageDescriptor>,
}

impl StageTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage for `prime` at the tail of the chain and return its index
    pub fn push(&mut self, prime: u64) -> usize {
        let index = self.stages.len();
        let upstream = index.checked_sub(1);
        self.stages.push(StageDescriptor {
            index,
            prime,
            upstream,
            state: StageState::Active,
        });
        index
    }

    pub fn get(&self, index: usize) -> Option<&StageDescriptor> {
        self.stages.get(index)
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StageDescriptor> {
        self.stages.iter()
    }

    /// Divisors in chain order
    pub fn primes(&self) -> Vec<u64> {
        self.stages.iter().map(|s| s.prime).collect()
    }

    pub fn tail(&self) -> Option<&StageDescriptor> {
        self.stages.last()
    }

    /// Move every active stage to `Draining`
    pub fn begin_draining(&mut self) {
        for stage in &mut self.stages {
            if stage.state.can_transition(StageState::Draining) {
                stage.state = StageState::Draining;
            }
        }
    }

    /// Record that the stage's task has been joined.
    ///
    /// Returns false if the index is unknown or the stage was already stopped.
    pub fn mark_stopped(&mut self, index: usize) -> bool {
        match self.stages.get_mut(index) {
            Some(stage) if stage.state.can_transition(StageState::Stopped) => {
                stage.state = StageState::Stopped;
                true
            }
            _ => false,
        }
    }

    pub fn all_stopped(&self) -> bool {
        self.stages.iter().all(|s| s.state == StageState::Stopped)
    }
}

/// Why a worker stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageExit {
    /// The shutdown signal fired
    Cancelled,
    /// The inbound channel was closed
    UpstreamClosed,
    /// The outbound receiver was dropped
    DownstreamClosed,
    /// The generator ran out of representable candidates
    Exhausted,
}

/// Which worker a report belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum StageRole {
    Generator,
    Filter { index: usize, prime: u64 },
}

/// Traffic counters returned by a worker when its task ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageReport {
    #[serde(flatten)]
    pub role: StageRole,
    pub received: u64,
    pub forwarded: u64,
    pub dropped: u64,
    pub exit: StageExit,
}

impl StageReport {
    pub(crate) fn new(role: StageRole) -> Self {
        Self {
            role,
            received: 0,
            forwarded: 0,
            dropped: 0,
            // Overwritten by `finish`
            exit: StageExit::Cancelled,
        }
    }

    pub(crate) fn finish(mut self, exit: StageExit) -> Self {
        self.exit = exit;
        self
    }
}
