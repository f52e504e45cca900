//! Randomized exponential backoff
//!
//! `delay = min(base * 2^attempt, max)`, jittered by ±20% so retries from
//! different items do not line up.

use autoseo_core::RetryConfig;
use rand::Rng;
use std::time::Duration;

/// Fraction of the delay applied as random jitter in either direction
pub const JITTER_RATIO: f64 = 0.2;

/// Window used when backing off after a whole-cycle failure
pub const CYCLE_BACKOFF_WINDOW: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    base: Duration,
    max: Duration,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max: max.max(base),
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            Duration::from_millis(config.base_delay_ms),
            Duration::from_millis(config.max_delay_ms),
        )
    }

    /// Un-jittered delay for an attempt, capped at the maximum
    pub fn ceiling(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.min(31));
        self.base.saturating_mul(factor).min(self.max)
    }

    /// Jittered delay for an attempt
    pub fn delay(&self, attempt: u32) -> Duration {
        let ceiling = self.ceiling(attempt);
        let jitter = rand::thread_rng().gen_range(-JITTER_RATIO..=JITTER_RATIO);
        ceiling.mul_f64(1.0 + jitter)
    }

    /// Delay after an uncaught phase failure, keyed by cycle count
    pub fn cycle_delay(&self, cycle: u64) -> Duration {
        self.delay((cycle % CYCLE_BACKOFF_WINDOW) as u32)
    }

    pub fn max(&self) -> Duration {
        self.max
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}
