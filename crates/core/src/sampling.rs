//! # Sampling
//!
//! Decides which discovered primes get reported. Selection is by discovery
//! index: for `total` primes and `percent`, exactly
//! `floor(total * percent / 100)` indices are chosen, evenly spaced and
//! ending no later than `total`. The percentage is resolved to hundredths of
//! a percent and the count is computed in integers, so values such as 18.4%
//! are not shaved by binary rounding.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SieveError};

/// A reported prime and its 1-based discovery index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimeSample {
    pub index: usize,
    pub prime: u64,
}

/// Reject percentages outside `0..=100` and non-finite values
pub fn validate_percent(percent: f64) -> Result<()> {
    if percent.is_finite() && (0.0..=100.0).contains(&percent) {
        Ok(())
    } else {
        Err(SieveError::InvalidSampling(percent))
    }
}

#[derive(Debug, Clone)]
pub struct Sampler {
    sample_count: usize,
    stride: usize,
    emitted: usize,
}

impl Sampler {
    pub fn new(total: usize, percent: f64) -> Result<Self> {
        validate_percent(percent)?;

        // percent is within 0..=100, so this is within 0..=10_000
        let hundredths = (percent * 100.0).round() as u128;
        let sample_count = (total as u128 * hundredths / 10_000) as usize;
        let sample_count = sample_count.min(total);
        let stride = if sample_count == 0 {
            0
        } else {
            (total / sample_count).max(1)
        };

        Ok(Self {
            sample_count,
            stride,
            emitted: 0,
        })
    }

    /// Whether the prime at 1-based `index` should be reported.
    ///
    /// Must be called once per index, in order.
    pub fn should_report(&mut self, index: usize) -> bool {
        if self.stride == 0 || self.emitted >= self.sample_count {
            return false;
        }
        if index % self.stride == 0 {
            self.emitted += 1;
            true
        } else {
            false
        }
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// Distance between reported indices; 0 when nothing is reported
    pub fn stride(&self) -> usize {
        self.stride
    }
}
