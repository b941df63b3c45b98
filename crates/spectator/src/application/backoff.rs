//! Poll interval backoff.
//!
//! Runtime-agnostic: the poller owns the timer and asks this type how long to
//! wait. Jitter is supplied by the caller so tests can pin it.

use std::time::Duration;

/// Smallest interval an escalation may produce, whatever the base.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Configuration for the poll schedule
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollConfig {
    /// Interval between polls while the endpoint is healthy
    pub base_interval: Duration,
    /// Ceiling for the backed-off interval
    pub max_interval: Duration,
    /// Multiplier applied on every rate-limit or server error (must be > 1)
    pub backoff_factor: f64,
    /// Upper bound of the random delay added on each escalation
    pub max_jitter: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            base_interval: Duration::from_millis(2_000),
            max_interval: Duration::from_millis(30_000),
            backoff_factor: 2.0,
            max_jitter: Duration::from_millis(250),
        }
    }
}

/// Current poll interval with capped multiplicative growth.
#[derive(Debug, Clone, Copy)]
pub struct PollBackoff {
    config: PollConfig,
    current: Duration,
}

impl PollBackoff {
    pub fn new(config: PollConfig) -> Self {
        Self {
            config,
            current: config.base_interval,
        }
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    pub fn current(&self) -> Duration {
        self.current
    }

    fn ceiling(&self) -> Duration {
        self.config
            .max_interval
            .max(self.config.base_interval)
            .max(MIN_POLL_INTERVAL)
    }

    pub fn is_backed_off(&self) -> bool {
        self.current > self.config.base_interval
    }

    /// Back to the base interval after a successful poll.
    pub fn reset(&mut self) {
        self.current = self.config.base_interval;
    }

    /// Grow the interval after a rate-limit or server error.
    ///
    /// `jitter` is added after multiplying; `retry_after` (from the server)
    /// acts as a floor. The result never exceeds the ceiling and, below the
    /// ceiling, is always longer than the current interval.
    pub fn escalate(&mut self, jitter: Duration, retry_after: Option<Duration>) -> Duration {
        let current_ms = self.current.as_millis() as f64;
        let floor_ms = self.config.base_interval.max(MIN_POLL_INTERVAL).as_millis() as f64;
        let grown_ms = (current_ms * self.config.backoff_factor)
            .ceil()
            .max(current_ms + 1.0)
            .max(floor_ms)
            .min(self.ceiling().as_millis() as f64) as u64;
        let mut next = Duration::from_millis(grown_ms).saturating_add(jitter);
        if let Some(floor) = retry_after {
            next = next.max(floor);
        }
        self.current = next.min(self.ceiling());
        self.current
    }
}
