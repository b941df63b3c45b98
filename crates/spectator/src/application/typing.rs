//! Typing indicator throttle.
//!
//! Time is passed in by the caller so the throttle stays deterministic.

use std::time::{Duration, Instant};

use duelview_shared::NET_LIMITS;

/// Typing signal to send to the room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypingSignal {
    Start,
    Stop,
}

impl TypingSignal {
    pub fn is_typing(self) -> bool {
        self == TypingSignal::Start
    }
}

#[derive(Debug, Clone)]
pub struct TypingThrottle {
    min_interval: Duration,
    idle_stop: Duration,
    last_start: Option<Instant>,
    last_input: Option<Instant>,
    active: bool,
}

impl Default for TypingThrottle {
    fn default() -> Self {
        Self::new(
            Duration::from_millis(NET_LIMITS.typing_min_interval_ms),
            Duration::from_millis(NET_LIMITS.typing_idle_stop_ms),
        )
    }
}

impl TypingThrottle {
    pub fn new(min_interval: Duration, idle_stop: Duration) -> Self {
        Self {
            min_interval,
            idle_stop,
            last_start: None,
            last_input: None,
            active: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Record input activity. Returns `Start` at most once per min interval.
    pub fn on_input(&mut self, now: Instant) -> Option<TypingSignal> {
        self.last_input = Some(now);
        let due = match self.last_start {
            Some(at) => now.saturating_duration_since(at) >= self.min_interval,
            None => true,
        };
        if !due {
            return None;
        }
        self.last_start = Some(now);
        self.active = true;
        Some(TypingSignal::Start)
    }

    /// When the idle stop should fire, if typing is active.
    pub fn idle_deadline(&self) -> Option<Instant> {
        match (self.active, self.last_input) {
            (true, Some(at)) => Some(at + self.idle_stop),
            _ => None,
        }
    }

    /// Emit a single `Stop` once input has been idle long enough.
    pub fn on_tick(&mut self, now: Instant) -> Option<TypingSignal> {
        let deadline = self.idle_deadline()?;
        if now < deadline {
            return None;
        }
        Some(self.stop())
    }

    /// A message was sent; stop typing immediately if active.
    pub fn on_send(&mut self) -> Option<TypingSignal> {
        self.active.then(|| self.stop())
    }

    fn stop(&mut self) -> TypingSignal {
        self.active = false;
        self.last_start = None;
        TypingSignal::Stop
    }
}
