//! Chat room state and outgoing message handling.
//!
//! `ChatRoom` folds server events into what the viewer sees and validates
//! what the viewer types. `ChatOutbox` sends it, pacing typing notifications
//! through [`TypingThrottle`].

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Local};
use duelview_shared::{ChatLine, ClientEvent, DuelResult, JoinRoom, ServerEvent, NET_LIMITS};

use crate::application::typing::{TypingSignal, TypingThrottle};
use crate::ports::outbound::{ChatConnectionPort, ChatTransportError, ConnectionState};

/// Oldest lines are dropped past this many.
pub const MAX_LOG_LINES: usize = 300;

const DEFAULT_SENDER_NAME: &str = "Spectator";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    #[error("Message is empty")]
    EmptyMessage,

    #[error("Message is too long ({length} characters, max {max})")]
    MessageTooLong { length: usize, max: usize },

    #[error("Chat is not connected")]
    NotConnected,

    #[error(transparent)]
    Transport(#[from] ChatTransportError),
}

/// One rendered chat line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEntry {
    pub user_id: Option<String>,
    pub name: String,
    pub text: String,
    /// Milliseconds since the Unix epoch
    pub ts: Option<i64>,
    /// Sent by this viewer
    pub is_me: bool,
}

impl ChatEntry {
    fn from_line(line: &ChatLine, viewer_id: &str) -> Self {
        let name = line
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_SENDER_NAME)
            .to_string();
        Self {
            user_id: line.user_id.clone(),
            name,
            text: line.text.clone(),
            ts: line.ts,
            is_me: line.user_id.as_deref() == Some(viewer_id),
        }
    }

    /// Sender label, tagged for the viewer's own lines.
    pub fn sender_label(&self) -> String {
        if self.is_me {
            format!("{} (You)", self.name)
        } else {
            self.name.clone()
        }
    }

    /// `HH:MM` in local time; lines without a timestamp use the current time.
    pub fn time_label(&self) -> String {
        let at = self
            .ts
            .and_then(DateTime::from_timestamp_millis)
            .map(|utc| utc.with_timezone(&Local))
            .unwrap_or_else(Local::now);
        at.format("%H:%M").to_string()
    }
}

impl fmt::Display for ChatEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.time_label(), self.sender_label(), self.text)
    }
}

/// What changed after applying a server event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomUpdate {
    LogReplaced,
    Appended,
    Typing,
    Presence,
    DuelResult,
    Ignored,
}

pub struct ChatRoom {
    room_id: String,
    viewer_id: String,
    viewer_name: String,
    log: VecDeque<ChatEntry>,
    typing_users: usize,
    presence: Option<u32>,
    result: Option<DuelResult>,
    connection: ConnectionState,
}

impl ChatRoom {
    pub fn new(
        room_id: impl Into<String>,
        viewer_id: impl Into<String>,
        viewer_name: impl Into<String>,
    ) -> Self {
        Self {
            room_id: room_id.into(),
            viewer_id: viewer_id.into(),
            viewer_name: viewer_name.into(),
            log: VecDeque::new(),
            typing_users: 0,
            presence: None,
            result: None,
            connection: ConnectionState::Disconnected,
        }
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    /// Event sent on every (re)connect.
    pub fn join_event(&self) -> ClientEvent {
        ClientEvent::JoinRoom(JoinRoom {
            room_id: self.room_id.clone(),
            user_id: self.viewer_id.clone(),
            name: self.viewer_name.clone(),
        })
    }

    pub fn log(&self) -> impl Iterator<Item = &ChatEntry> {
        self.log.iter()
    }

    pub fn last_entry(&self) -> Option<&ChatEntry> {
        self.log.back()
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn set_connection(&mut self, state: ConnectionState) {
        if state != self.connection {
            tracing::debug!(room = %self.room_id, from = ?self.connection, to = ?state, "Chat connection state changed");
        }
        self.connection = state;
        if !state.is_connected() {
            self.typing_users = 0;
        }
    }

    pub fn apply(&mut self, event: &ServerEvent) -> RoomUpdate {
        match event {
            ServerEvent::History { messages } => {
                self.log.clear();
                let skip = messages.len().saturating_sub(MAX_LOG_LINES);
                for line in messages.iter().skip(skip) {
                    self.log.push_back(ChatEntry::from_line(line, &self.viewer_id));
                }
                RoomUpdate::LogReplaced
            }
            ServerEvent::Message(line) => {
                self.log.push_back(ChatEntry::from_line(line, &self.viewer_id));
                while self.log.len() > MAX_LOG_LINES {
                    self.log.pop_front();
                }
                RoomUpdate::Appended
            }
            ServerEvent::Typing { users } => {
                self.typing_users = users.len();
                RoomUpdate::Typing
            }
            ServerEvent::Presence { count } => {
                self.presence = Some(*count);
                RoomUpdate::Presence
            }
            ServerEvent::DuelResult(result) => {
                self.result = Some(result.clone());
                RoomUpdate::DuelResult
            }
            ServerEvent::Unknown(name) => {
                tracing::debug!(event = %name, "Ignoring unknown chat event");
                RoomUpdate::Ignored
            }
        }
    }

    /// `"{n} typing…"`, or nothing while nobody types.
    pub fn typing_text(&self) -> Option<String> {
        (self.typing_users > 0).then(|| format!("{} typing…", self.typing_users))
    }

    pub fn presence_text(&self) -> Option<String> {
        self.presence.map(|count| format!("{count} online"))
    }

    pub fn result_text(&self) -> Option<String> {
        let result = self.result.as_ref()?;
        let winner = match (result.winner_slot(), result.winner.as_deref()) {
            (Some(slot), _) => slot.to_string(),
            (None, Some(name)) if !name.trim().is_empty() => name.trim().to_string(),
            _ => return Some("Duel over".to_string()),
        };
        Some(match result.reason.as_deref() {
            Some(reason) if !reason.trim().is_empty() => {
                format!("Duel over: {winner} wins ({})", reason.trim())
            }
            _ => format!("Duel over: {winner} wins"),
        })
    }

    /// Validate outgoing text and wrap it for the socket.
    pub fn compose(&self, text: &str) -> Result<ClientEvent, ChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        let length = text.chars().count();
        if length > NET_LIMITS.max_message_chars {
            return Err(ChatError::MessageTooLong {
                length,
                max: NET_LIMITS.max_message_chars,
            });
        }
        if !self.connection.is_connected() {
            return Err(ChatError::NotConnected);
        }
        Ok(ClientEvent::ChatMessage(text.to_string()))
    }
}

/// Sends what the viewer types.
pub struct ChatOutbox {
    port: Arc<dyn ChatConnectionPort>,
    throttle: TypingThrottle,
}

impl ChatOutbox {
    pub fn new(port: Arc<dyn ChatConnectionPort>) -> Self {
        Self::with_throttle(port, TypingThrottle::default())
    }

    pub fn with_throttle(port: Arc<dyn ChatConnectionPort>, throttle: TypingThrottle) -> Self {
        Self { port, throttle }
    }

    /// When [`ChatOutbox::tick`] next has something to do.
    pub fn idle_deadline(&self) -> Option<Instant> {
        self.throttle.idle_deadline()
    }

    /// The viewer is typing. Nothing is sent while disconnected.
    pub async fn input(&mut self, connection: ConnectionState, now: Instant) -> Result<(), ChatError> {
        if !connection.is_connected() {
            return Ok(());
        }
        match self.throttle.on_input(now) {
            Some(signal) => self.signal(signal).await,
            None => Ok(()),
        }
    }

    /// Emit the idle stop once it is due.
    pub async fn tick(&mut self, now: Instant) -> Result<(), ChatError> {
        match self.throttle.on_tick(now) {
            Some(signal) => self.signal(signal).await,
            None => Ok(()),
        }
    }

    /// Send a message built by [`ChatRoom::compose`], then clear the typing
    /// indicator.
    pub async fn submit(&mut self, message: ClientEvent) -> Result<(), ChatError> {
        self.port.send(message).await?;
        if let Some(signal) = self.throttle.on_send() {
            self.signal(signal).await?;
        }
        Ok(())
    }

    async fn signal(&self, signal: TypingSignal) -> Result<(), ChatError> {
        self.port
            .send(ClientEvent::Typing(signal.is_typing()))
            .await
            .map_err(ChatError::from)
    }
}
