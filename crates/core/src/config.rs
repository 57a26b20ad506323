//! # Run Configuration
//!
//! Defaults, then an optional JSON file, then explicit overrides (CLI flags).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::{Result, SieveError};
use crate::report::OutputFormat;
use crate::sampling::validate_percent;

/// Environment variable naming a JSON config file
pub const CONFIG_ENV_VAR: &str = "SIEVE_CONFIG";

pub const DEFAULT_COUNT: usize = 1000;
pub const DEFAULT_SAMPLING_PERCENT: f64 = 5.0;
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1;

/// Largest accepted value bound. Sizing a run takes one bit per candidate,
/// so this caps the bitset at 125 MB.
pub const MAX_VALUE_BOUND: u64 = 1_000_000_000;

/// Check a value bound and convert it to a bitset limit
pub fn check_max_value(max: u64) -> Result<usize> {
    if max > MAX_VALUE_BOUND {
        return Err(SieveError::InvalidConfig(format!(
            "max value {} exceeds the supported limit of {}",
            max, MAX_VALUE_BOUND
        )));
    }
    usize::try_from(max).map_err(|_| {
        SieveError::InvalidConfig(format!("max value {} exceeds address space", max))
    })
}

/// When the driver stops
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bound {
    /// The first `n` primes
    Count(usize),
    /// Every prime `<= v`
    MaxValue(u64),
}

impl Default for Bound {
    fn default() -> Self {
        Bound::Count(DEFAULT_COUNT)
    }
}

/// Configuration for a sieve run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SieveConfig {
    pub bound: Bound,
    /// Share of discovered primes to report, in percent
    pub sampling_percent: f64,
    /// Buffer size of every inter-stage channel (1 is the closest to rendezvous)
    pub channel_capacity: usize,
    pub format: OutputFormat,
}

impl Default for SieveConfig {
    fn default() -> Self {
        Self {
            bound: Bound::default(),
            sampling_percent: DEFAULT_SAMPLING_PERCENT,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            format: OutputFormat::Text,
        }
    }
}

/// Partial configuration; `Some` fields win over the base config
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bound: Option<Bound>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sampling_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_capacity: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<OutputFormat>,
}

impl SieveConfig {
    /// Load a config file. Missing fields take their defaults.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).await.map_err(|e| {
            SieveError::InvalidConfig(format!("failed to read {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&content)?;
        tracing::debug!(path = %path.display(), "Loaded sieve config");
        Ok(config)
    }

    /// Load the file named by `SIEVE_CONFIG`, if set
    pub async fn from_env() -> Result<Option<Self>> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::load(PathBuf::from(path)).await.map(Some),
            None => Ok(None),
        }
    }

    pub fn apply(&mut self, overrides: ConfigOverrides) {
        if let Some(bound) = overrides.bound {
            self.bound = bound;
        }
        if let Some(percent) = overrides.sampling_percent {
            self.sampling_percent = percent;
        }
        if let Some(capacity) = overrides.channel_capacity {
            self.channel_capacity = capacity;
        }
        if let Some(format) = overrides.format {
            self.format = format;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.bound == Bound::Count(0) {
            return Err(SieveError::InvalidConfig(
                "prime count must be at least 1".to_string(),
            ));
        }
        if let Bound::MaxValue(max) = self.bound {
            check_max_value(max)?;
        }
        if self.channel_capacity == 0 {
            return Err(SieveError::InvalidConfig(
                "channel capacity must be at least 1".to_string(),
            ));
        }
        validate_percent(self.sampling_percent)
    }
}
