//! Retry policy: decides release delays.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Backoff used when a handler fails and the job is released.
///
/// The remote service schedules in whole seconds, so delays are rounded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Delay after the first failed attempt.
    pub base_delay_secs: u64,

    /// Backoff multiplier for exponential backoff.
    pub multiplier: f64,

    /// Upper bound for any single delay.
    pub max_delay_secs: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay_secs: 2,
            multiplier: 2.0,
            max_delay_secs: 900,
        }
    }
}

impl RetryPolicy {
    /// No delay at all; the job is visible again immediately.
    pub fn immediate() -> Self {
        Self {
            base_delay_secs: 0,
            multiplier: 1.0,
            max_delay_secs: 0,
        }
    }

    /// Delay before the next attempt.
    ///
    /// `attempts` is the attempt that just failed (1-indexed):
    /// delay = base_delay * multiplier^(attempts - 1), capped at max_delay.
    ///
    /// Example with base=2s, multiplier=2.0:
    /// - attempt 1: 2s
    /// - attempt 2: 4s
    /// - attempt 3: 8s
    pub fn next_delay(&self, attempts: u64) -> Duration {
        let exponent = i32::try_from(attempts.saturating_sub(1)).unwrap_or(i32::MAX);
        let secs = self.base_delay_secs as f64 * self.multiplier.powi(exponent);
        let max = self.max_delay_secs as f64;
        // NaN / inf はすべて上限に寄せる
        let secs = if secs.is_finite() { secs.clamp(0.0, max) } else { max };
        Duration::from_secs(secs.round() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn default_policy_has_reasonable_values() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.base_delay_secs, 2);
        assert_eq!(policy.multiplier, 2.0);
        assert_eq!(policy.max_delay_secs, 900);
    }

    #[rstest]
    #[case(0, 2)]
    #[case(1, 2)]
    #[case(2, 4)]
    #[case(3, 8)]
    #[case(10, 900)]
    #[case(u32::MAX as u64, 900)]
    #[case(u64::MAX, 900)]
    fn exponential_backoff_is_capped(#[case] attempts: u64, #[case] expected_secs: u64) {
        let policy = RetryPolicy::default();
        assert_eq!(policy.next_delay(attempts), Duration::from_secs(expected_secs));
    }

    #[test]
    fn immediate_policy_never_waits() {
        let policy = RetryPolicy::immediate();
        assert_eq!(policy.next_delay(1), Duration::ZERO);
        assert_eq!(policy.next_delay(50), Duration::ZERO);
    }
}
