//! Chat event envelopes exchanged over the room WebSocket.
//!
//! Every frame is a JSON object `{"event": <name>, "data": <payload>}`.
//!
//! ## Versioning Policy
//!
//! - New variants can be added at the end (forward compatible)
//! - Renaming variants is a breaking change
//! - Unknown server events parse to `ServerEvent::Unknown` instead of failing

use duelview_domain::PlayerSlot;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// Client Events (Spectator → Room)
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoom {
    pub room_id: String,
    pub user_id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Sent on every (re)connect
    JoinRoom(JoinRoom),
    /// Outgoing chat text
    ChatMessage(String),
    /// Typing indicator toggle
    Typing(bool),
}

// =============================================================================
// Server Events (Room → Spectator)
// =============================================================================

/// A single chat message as broadcast by the room.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatLine {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub text: String,
    /// Milliseconds since the Unix epoch
    #[serde(default)]
    pub ts: Option<i64>,
}

/// Match-end notification.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuelResult {
    /// Seat alias or display name of the winner
    #[serde(default)]
    pub winner: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl DuelResult {
    pub fn winner_slot(&self) -> Option<PlayerSlot> {
        self.winner.as_deref().and_then(PlayerSlot::from_alias)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Room backlog, replayed after joining
    History {
        #[serde(default)]
        messages: Vec<ChatLine>,
    },
    Message(ChatLine),
    Typing {
        #[serde(default)]
        users: Vec<String>,
    },
    Presence {
        #[serde(default)]
        count: u32,
    },
    DuelResult(DuelResult),

    /// Any event this client does not understand
    #[serde(skip)]
    Unknown(String),
}

const KNOWN_SERVER_EVENTS: &[&str] = &["history", "message", "typing", "presence", "duel_result"];

#[derive(Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    data: Value,
}

impl ServerEvent {
    /// Parse a frame, mapping unrecognized event names to `Unknown`.
    ///
    /// A missing or `null` payload is treated as an empty object so events
    /// whose fields all have defaults still parse.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let Envelope { event, data } = serde_json::from_str(text)?;
        if !KNOWN_SERVER_EVENTS.contains(&event.as_str()) {
            return Ok(ServerEvent::Unknown(event));
        }
        let data = if data.is_null() {
            Value::Object(Default::default())
        } else {
            data
        };
        serde_json::from_value(serde_json::json!({ "event": event, "data": data }))
    }

    pub fn name(&self) -> &str {
        match self {
            ServerEvent::History { .. } => "history",
            ServerEvent::Message(_) => "message",
            ServerEvent::Typing { .. } => "typing",
            ServerEvent::Presence { .. } => "presence",
            ServerEvent::DuelResult(_) => "duel_result",
            ServerEvent::Unknown(name) => name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn client_events_use_event_data_envelope() {
        let join = ClientEvent::JoinRoom(JoinRoom {
            room_id: "duel-1".into(),
            user_id: "u-1".into(),
            name: "Nyx".into(),
        });
        assert_eq!(
            serde_json::to_value(&join).unwrap(),
            json!({"event": "join_room", "data": {"roomId": "duel-1", "userId": "u-1", "name": "Nyx"}})
        );
        assert_eq!(
            serde_json::to_value(ClientEvent::Typing(true)).unwrap(),
            json!({"event": "typing", "data": true})
        );
        assert_eq!(
            serde_json::to_value(ClientEvent::ChatMessage("gg".into())).unwrap(),
            json!({"event": "chat_message", "data": "gg"})
        );
    }

    #[test]
    fn parses_known_server_events() {
        let msg = ServerEvent::parse(
            r#"{"event":"message","data":{"userId":"u-2","name":"Vex","text":"hi","ts":1700000000000}}"#,
        )
        .unwrap();
        assert_eq!(
            msg,
            ServerEvent::Message(ChatLine {
                user_id: Some("u-2".into()),
                name: Some("Vex".into()),
                text: "hi".into(),
                ts: Some(1_700_000_000_000),
            })
        );

        let presence = ServerEvent::parse(r#"{"event":"presence","data":{"count":4}}"#).unwrap();
        assert_eq!(presence, ServerEvent::Presence { count: 4 });
    }

    #[test]
    fn missing_payload_uses_defaults() {
        let history = ServerEvent::parse(r#"{"event":"history"}"#).unwrap();
        assert_eq!(history, ServerEvent::History { messages: vec![] });
    }

    #[test]
    fn unknown_events_do_not_fail() {
        let event = ServerEvent::parse(r#"{"event":"confetti","data":[1,2]}"#).unwrap();
        assert_eq!(event, ServerEvent::Unknown("confetti".into()));
        assert_eq!(event.name(), "confetti");
    }

    #[test]
    fn duel_result_maps_winner_alias() {
        let event = ServerEvent::parse(r#"{"event":"duel_result","data":{"winner":"p2"}}"#).unwrap();
        match event {
            ServerEvent::DuelResult(result) => {
                assert_eq!(result.winner_slot(), Some(PlayerSlot::Player2))
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
