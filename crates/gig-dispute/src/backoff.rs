//! Bounded exponential backoff for gateway polling.
//!
//! The retry budget is an explicit, caller-supplied policy rather than a
//! constant buried in the polling loop.

use std::time::Duration;

/// An explicit polling budget: at most `max_attempts` polls, with the
/// delay after attempt `n` being `base_delay * multiplier^n`.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    /// Maximum number of polls before giving up.
    pub max_attempts: u32,
    /// Delay after the first attempt.
    pub base_delay: Duration,
    /// Growth factor between consecutive delays.
    pub multiplier: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 6,
            base_delay: Duration::from_millis(500),
            multiplier: 2,
        }
    }
}

impl BackoffPolicy {
    /// The delay to sleep after attempt `attempt` (zero-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(self.multiplier.saturating_pow(attempt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delays_grow_by_the_multiplier() {
        let policy = BackoffPolicy {
            max_attempts: 4,
            base_delay: Duration::from_millis(100),
            multiplier: 3,
        };
        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(300));
        assert_eq!(policy.delay_for(2), Duration::from_millis(900));
    }

    #[test]
    fn default_matches_the_observed_polling_budget() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.max_attempts, 6);
        assert!(policy.delay_for(1) > policy.delay_for(0));
    }

    #[test]
    fn huge_attempts_saturate_instead_of_overflowing() {
        let policy = BackoffPolicy::default();
        let _ = policy.delay_for(u32::MAX);
    }
}
