//! Network pacing limits shared by the chat transport and room logic.

/// Pacing constants for reconnects and typing notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetLimits {
    /// Ceiling for the reconnect delay.
    pub reconnect_delay_max_ms: u64,
    /// First reconnect delay; doubles on every attempt.
    pub reconnect_delay_initial_ms: u64,
    pub reconnect_attempts: u32,
    /// Emit `typing: true` at most this often.
    pub typing_min_interval_ms: u64,
    /// Emit a single `typing: false` after this much idle time.
    pub typing_idle_stop_ms: u64,
    /// Longest chat message the client will send, in characters.
    pub max_message_chars: usize,
}

pub const NET_LIMITS: NetLimits = NetLimits {
    reconnect_delay_max_ms: 20_000,
    reconnect_delay_initial_ms: 1_000,
    reconnect_attempts: 10,
    typing_min_interval_ms: 2_000,
    typing_idle_stop_ms: 1_600,
    max_message_chars: 500,
};

impl Default for NetLimits {
    fn default() -> Self {
        NET_LIMITS
    }
}
