//! Chat Connection Port - outgoing side of the room socket.

use duelview_shared::ClientEvent;

/// Connection state of the chat room socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// Not connected to the server
    #[default]
    Disconnected,
    /// Attempting to establish connection
    Connecting,
    /// Successfully connected and joined
    Connected,
    /// Connection lost, attempting to reconnect
    Reconnecting,
    /// Connection failed (max retries exceeded)
    Failed,
}

impl ConnectionState {
    /// Convert to u8 for atomic storage.
    pub fn to_u8(self) -> u8 {
        match self {
            ConnectionState::Disconnected => 0,
            ConnectionState::Connecting => 1,
            ConnectionState::Connected => 2,
            ConnectionState::Reconnecting => 3,
            ConnectionState::Failed => 4,
        }
    }

    /// Convert from u8 (atomic storage).
    pub fn from_u8(v: u8) -> Self {
        match v {
            1 => ConnectionState::Connecting,
            2 => ConnectionState::Connected,
            3 => ConnectionState::Reconnecting,
            4 => ConnectionState::Failed,
            _ => ConnectionState::Disconnected,
        }
    }

    pub fn is_connected(self) -> bool {
        self == ConnectionState::Connected
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatTransportError {
    #[error("Not connected")]
    NotConnected,

    #[error("Chat writer closed")]
    ChannelClosed,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ChatConnectionPort: Send + Sync {
    /// Queue an event for the room socket.
    async fn send(&self, event: ClientEvent) -> Result<(), ChatTransportError>;
}
