//! Retry policy for tool server calls.

use std::time::Duration;

use crate::error::Error;
use crate::Result;

/// How many times to try a call, how long to wait between tries, and how
/// long a single try may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    timeout: Duration,
}

impl RetryPolicy {
    /// Create a policy. `max_attempts` counts the first try and must be at
    /// least 1.
    pub fn new(max_attempts: u32, base_delay: Duration, timeout: Duration) -> Result<Self> {
        if max_attempts == 0 {
            return Err(Error::Config("max_attempts must be at least 1".to_string()));
        }
        Ok(Self {
            max_attempts,
            base_delay,
            timeout,
        })
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Delay before retry `retry` (0-indexed): `base_delay * 2^retry`.
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(retry))
    }

    /// Every delay the policy can produce, in order. There is one fewer
    /// delay than attempts: nothing is waited after the final attempt.
    pub fn schedule(&self) -> Vec<Duration> {
        (0..self.max_attempts - 1).map(|k| self.delay_for(k)).collect()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            timeout: Duration::from_secs(30),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_doubles() {
        let policy = RetryPolicy::new(4, Duration::from_millis(500), Duration::from_secs(5)).unwrap();
        assert_eq!(
            policy.schedule(),
            vec![
                Duration::from_millis(500),
                Duration::from_secs(1),
                Duration::from_secs(2),
            ]
        );
    }

    #[test]
    fn test_three_attempts_wait_three_seconds_total() {
        let policy = RetryPolicy::default();
        let total: Duration = policy.schedule().iter().sum();
        assert_eq!(total, Duration::from_secs(3));
    }

    #[test]
    fn test_single_attempt_never_waits() {
        let policy = RetryPolicy::new(1, Duration::from_secs(1), Duration::from_secs(1)).unwrap();
        assert!(policy.schedule().is_empty());
    }

    #[test]
    fn test_zero_attempts_rejected() {
        assert!(RetryPolicy::new(0, Duration::ZERO, Duration::ZERO).is_err());
    }

    #[test]
    fn test_delay_saturates() {
        let policy = RetryPolicy::new(2, Duration::from_secs(1), Duration::from_secs(1)).unwrap();
        assert_eq!(policy.delay_for(200), Duration::from_secs(1).saturating_mul(u32::MAX));
    }
}
