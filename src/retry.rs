// src/retry.rs
//! Exponential backoff with jitter, shared by the fetch and webhook stages.
//!
//! delay(attempt) = min(base * 2^(attempt-1), max) + jitter(0..=jitter_ms)

use rand::{rng, Rng};
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    pub max_retries: u8,
    pub base: Duration,
    pub max: Duration,
    pub jitter_ms: u64,
}

impl Backoff {
    pub fn new(max_retries: u8, base: Duration) -> Self {
        Self {
            max_retries,
            base,
            max: Duration::from_secs(30),
            jitter_ms: 250,
        }
    }

    pub fn without_jitter(mut self) -> Self {
        self.jitter_ms = 0;
        self
    }

    /// Delay before retry number `attempt` (1-based).
    pub fn delay(&self, attempt: u8) -> Duration {
        let shift = u32::from(attempt.saturating_sub(1)).min(16);
        let delay = self.base.saturating_mul(1u32 << shift).min(self.max);
        if self.jitter_ms == 0 {
            return delay;
        }
        delay + Duration::from_millis(rng().random_range(0..=self.jitter_ms))
    }

    pub fn should_retry(&self, attempt: u8) -> bool {
        attempt <= self.max_retries
    }
}
