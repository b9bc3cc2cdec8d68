//! Exponential reconnect backoff

use chat_common::ReconnectConfig;
use std::time::Duration;

/// Bounds for the reconnect delay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Delay before the first reconnect attempt
    pub initial: Duration,
    /// Upper bound the delay doubles towards
    pub max: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::from(ReconnectConfig::default())
    }
}

impl From<ReconnectConfig> for BackoffPolicy {
    fn from(config: ReconnectConfig) -> Self {
        Self {
            initial: config.initial_backoff(),
            max: config.max_backoff(),
        }
    }
}

impl BackoffPolicy {
    #[must_use]
    pub const fn new(initial: Duration, max: Duration) -> Self {
        Self { initial, max }
    }

    /// Delay before the `attempt`-th consecutive reconnect (1-based)
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.initial
            .saturating_mul(1_u32 << exponent)
            .min(self.max)
    }
}

/// Running backoff state
///
/// Each [`next_delay`](Self::next_delay) returns the current delay and
/// doubles it for the following call, capped at the policy maximum.
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: BackoffPolicy,
    current: Duration,
}

impl Backoff {
    #[must_use]
    pub fn new(policy: BackoffPolicy) -> Self {
        Self {
            policy,
            current: policy.initial.min(policy.max),
        }
    }

    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = self.current.saturating_mul(2).min(self.policy.max);
        delay
    }

    /// Delay the next attempt would wait
    #[must_use]
    pub fn current(&self) -> Duration {
        self.current
    }

    /// Return to the initial delay after a successful open
    pub fn reset(&mut self) {
        self.current = self.policy.initial.min(self.policy.max);
    }
}
