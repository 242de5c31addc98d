use backoff::backoff::Backoff;
use std::time::Duration;

use crate::error::LedgerError;

/// Decides whether a failed call should move traffic to the next endpoint.
pub type RateLimitPredicate = fn(&LedgerError) -> bool;

/// Retry policy configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total invocations allowed, including the first one
    pub max_attempts: u32,
    /// Delay after the first failure; later delays scale linearly
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn to_linear_backoff(&self) -> LinearBackoff {
        LinearBackoff {
            base_delay: self.base_delay,
            max_attempts: self.max_attempts.max(1),
            attempt: 0,
        }
    }
}

/// Backoff that waits `base_delay * attempt` after each failed attempt and
/// gives up once `max_attempts` attempts have been spent.
#[derive(Debug, Clone)]
pub struct LinearBackoff {
    base_delay: Duration,
    max_attempts: u32,
    attempt: u32,
}

impl LinearBackoff {
    /// Attempts consumed so far
    pub fn attempts(&self) -> u32 {
        self.attempt
    }
}

impl Backoff for LinearBackoff {
    fn reset(&mut self) {
        self.attempt = 0;
    }

    fn next_backoff(&mut self) -> Option<Duration> {
        self.attempt += 1;
        if self.attempt >= self.max_attempts {
            return None;
        }
        Some(self.base_delay * self.attempt)
    }
}

/// Default rate-limit detection.
///
/// Matches the typed classification as well as the raw `429` and
/// `Too many requests` markers that public Solana nodes put in error text.
pub fn is_rate_limited(err: &LedgerError) -> bool {
    if matches!(err, LedgerError::RateLimited(_)) {
        return true;
    }
    let text = err.to_string();
    text.contains("429") || text.contains("Too many requests")
}
