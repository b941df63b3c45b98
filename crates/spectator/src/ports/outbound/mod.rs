//! Outbound ports (application → infrastructure).

pub mod chat_port;
pub mod duel_state_port;
pub mod platform;
pub mod view_sink_port;

pub use chat_port::{ChatConnectionPort, ChatTransportError, ConnectionState};
pub use duel_state_port::{DuelStatePort, FetchError, FetchOutcome};
pub use platform::{storage_keys, RandomProvider, StorageProvider};
pub use view_sink_port::{PollStatus, ViewSinkPort};

#[cfg(test)]
pub use chat_port::MockChatConnectionPort;
#[cfg(test)]
pub use duel_state_port::MockDuelStatePort;
#[cfg(test)]
pub use view_sink_port::MockViewSinkPort;
