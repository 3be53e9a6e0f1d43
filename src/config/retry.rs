// ABOUTME: Bounds for the port-conflict retry loop and the readiness poll.
// ABOUTME: Both default to generous finite limits; None restores unbounded retrying.

use serde::Deserialize;
use std::time::Duration;

/// How many times a container start may be retried after a port conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total start attempts, including the first. `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: Some(32),
        }
    }
}

impl RetryPolicy {
    pub fn unbounded() -> Self {
        Self { max_attempts: None }
    }

    pub fn attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: Some(max_attempts),
        }
    }

    /// True once `made` attempts leave no budget for another one.
    pub fn exhausted(&self, made: u32) -> bool {
        self.max_attempts.is_some_and(|max| made >= max)
    }
}

/// Polling cadence and deadline for readiness probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReadinessPolicy {
    #[serde(with = "humantime_serde")]
    pub interval: Duration,

    /// Give up after this long. `None` polls until the probe answers or
    /// the container stops.
    #[serde(with = "humantime_serde")]
    pub deadline: Option<Duration>,
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(100),
            deadline: Some(Duration::from_secs(120)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_retry_allows_32_attempts() {
        let policy = RetryPolicy::default();
        assert!(!policy.exhausted(31));
        assert!(policy.exhausted(32));
    }

    #[test]
    fn unbounded_never_exhausts() {
        assert!(!RetryPolicy::unbounded().exhausted(u32::MAX));
    }

    #[test]
    fn readiness_parses_humantime() {
        let policy: ReadinessPolicy =
            serde_yaml::from_str("interval: 250ms\ndeadline: 3m\n").unwrap();
        assert_eq!(policy.interval, Duration::from_millis(250));
        assert_eq!(policy.deadline, Some(Duration::from_secs(180)));
    }

    #[test]
    fn readiness_deadline_can_be_disabled() {
        let policy: ReadinessPolicy = serde_yaml::from_str("deadline: null\n").unwrap();
        assert_eq!(policy.deadline, None);
        assert_eq!(policy.interval, Duration::from_millis(100));
    }
}
