#![forbid(unsafe_code)]

//! Exponential back-off policy for retried producers.
//!
//! # Schedule
//!
//! Attempts are numbered from 0. After a failure at attempt `a`, the next
//! attempt waits
//!
//! ```text
//! delay(a) = min(base_delay * 2^a, max_delay)
//! ```
//!
//! The failure at attempt `max_retries` is final, so a producer runs at most
//! `max_retries + 1` times.

use std::time::Duration;

use crate::error::{ConfigError, Result};

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 5;
/// Default delay before the first retry.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(200);
/// Default cap on any single delay.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(6000);

/// Retry configuration.
///
/// Always valid once constructed: `base_delay > 0` and
/// `max_delay >= base_delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawRetryPolicy"))]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl RetryPolicy {
    /// Build a policy, rejecting a zero base delay or a cap below it.
    pub fn new(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Result<Self> {
        if base_delay.is_zero() {
            return Err(ConfigError::ZeroBaseDelay);
        }
        if max_delay < base_delay {
            return Err(ConfigError::MaxDelayBelowBase {
                base_delay,
                max_delay,
            });
        }
        Ok(Self {
            max_retries,
            base_delay,
            max_delay,
        })
    }

    /// Same delays, different retry count.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    #[must_use]
    pub const fn base_delay(&self) -> Duration {
        self.base_delay
    }

    #[must_use]
    pub const fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// Total number of producer invocations this policy allows.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Whether a failure at `attempt` should be followed by another try.
    #[must_use]
    pub const fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }

    /// Delay to wait after a failure at `attempt` (0-based).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let multiplier = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(multiplier)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

/// Unvalidated wire shape; deserialization goes through [`RetryPolicy::new`].
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawRetryPolicy {
    max_retries: u32,
    base_delay: Duration,
    max_delay: Duration,
}

#[cfg(feature = "serde")]
impl TryFrom<RawRetryPolicy> for RetryPolicy {
    type Error = ConfigError;

    fn try_from(raw: RawRetryPolicy) -> Result<Self> {
        Self::new(raw.max_retries, raw.base_delay, raw.max_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries(), 5);
        assert_eq!(policy.base_delay(), ms(200));
        assert_eq!(policy.max_delay(), ms(6000));
        assert_eq!(policy.max_attempts(), 6);
    }

    #[test]
    fn default_schedule_doubles_then_caps() {
        let policy = RetryPolicy::default();
        let delays: Vec<_> = (0..6).map(|a| policy.delay_for(a)).collect();
        assert_eq!(
            delays,
            vec![ms(200), ms(400), ms(800), ms(1600), ms(3200), ms(6000)]
        );
    }

    #[test]
    fn huge_attempt_saturates_at_cap() {
        let policy = RetryPolicy::new(u32::MAX, ms(1), ms(5)).unwrap();
        assert_eq!(policy.delay_for(40), ms(5));
        assert_eq!(policy.delay_for(u32::MAX), ms(5));
        assert_eq!(policy.max_attempts(), u32::MAX);
    }

    #[test]
    fn should_retry_stops_at_max() {
        let policy = RetryPolicy::new(2, ms(1), ms(5)).unwrap();
        assert!(policy.should_retry(0));
        assert!(policy.should_retry(1));
        assert!(!policy.should_retry(2));
    }

    #[test]
    fn zero_retries_means_single_attempt() {
        let policy = RetryPolicy::default().with_max_retries(0);
        assert_eq!(policy.max_attempts(), 1);
        assert!(!policy.should_retry(0));
    }

    #[test]
    fn rejects_zero_base_delay() {
        assert_eq!(
            RetryPolicy::new(1, Duration::ZERO, ms(5)),
            Err(ConfigError::ZeroBaseDelay)
        );
    }

    #[test]
    fn rejects_cap_below_base() {
        assert_eq!(
            RetryPolicy::new(1, ms(10), ms(5)),
            Err(ConfigError::MaxDelayBelowBase {
                base_delay: ms(10),
                max_delay: ms(5),
            })
        );
    }

    #[test]
    fn equal_base_and_cap_is_valid() {
        let policy = RetryPolicy::new(3, ms(7), ms(7)).unwrap();
        assert_eq!(policy.delay_for(0), ms(7));
        assert_eq!(policy.delay_for(3), ms(7));
    }
}
