//! Capped exponential backoff for collect retries.

use std::time::Duration;

/// Exponential backoff policy.
///
/// Delays double per failed attempt, capped at a maximum, until `max_retries` is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    max_retries: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl Backoff {
    /// Create a new policy with a 1 second base delay capped at 8 seconds.
    ///
    /// # Arguments
    ///
    /// * `max_retries` - Maximum number of retry attempts
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(8),
        }
    }

    pub fn with_delays(mut self, base_delay: Duration, max_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self.max_delay = max_delay;
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Delay before retry number `n_past_retries + 1`, or `None` once retries are exhausted.
    pub fn next_delay(&self, n_past_retries: u32) -> Option<Duration> {
        if n_past_retries >= self.max_retries {
            None
        } else {
            Some(self.exponential_delay(n_past_retries))
        }
    }

    fn exponential_delay(&self, n_attempts: u32) -> Duration {
        let delay = self.base_delay.as_secs_f64() * 2_f64.powi(n_attempts as i32);
        Duration::from_secs_f64(delay.min(self.max_delay.as_secs_f64()))
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(3)
    }
}
