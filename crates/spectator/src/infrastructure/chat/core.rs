//! Runtime-free pieces of the chat client: reconnect policy and backoff math.

use std::time::Duration;

use duelview_shared::{NetLimits, NET_LIMITS};

const BACKOFF_MULTIPLIER: f64 = 2.0;

/// How the chat client retries a lost connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub max_attempts: u32,
}

impl From<NetLimits> for ReconnectPolicy {
    fn from(limits: NetLimits) -> Self {
        Self {
            initial_delay: Duration::from_millis(limits.reconnect_delay_initial_ms),
            max_delay: Duration::from_millis(limits.reconnect_delay_max_ms),
            max_attempts: limits.reconnect_attempts,
        }
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        NET_LIMITS.into()
    }
}

/// Exponential backoff state for one reconnect sequence.
#[derive(Debug, Clone, Copy)]
pub struct BackoffState {
    policy: ReconnectPolicy,
    attempts: u32,
    delay: Duration,
}

impl BackoffState {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            policy,
            attempts: 0,
            delay: policy.initial_delay,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn max_attempts(&self) -> u32 {
        self.policy.max_attempts
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempts >= self.policy.max_attempts
    }

    /// Advance to the next attempt.
    ///
    /// Returns the delay to wait *before* performing this attempt, or `None`
    /// once every attempt has been used.
    pub fn next_delay_and_advance(&mut self) -> Option<Duration> {
        if self.is_exhausted() {
            return None;
        }

        let current = self.delay;
        self.attempts += 1;
        let grown_ms = (self.delay.as_millis() as f64 * BACKOFF_MULTIPLIER)
            .min(self.policy.max_delay.as_millis() as f64) as u64;
        self.delay = Duration::from_millis(grown_ms);
        Some(current)
    }
}
