//! Player slot identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DomainError;

/// One of the two seats in a duel.
///
/// Serialized as `"player1"` / `"player2"`, which is how the duel server and
/// the rendered turn indicator name them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerSlot {
    #[default]
    Player1,
    Player2,
}

impl PlayerSlot {
    pub const ALL: [PlayerSlot; 2] = [PlayerSlot::Player1, PlayerSlot::Player2];

    pub fn as_str(self) -> &'static str {
        match self {
            PlayerSlot::Player1 => "player1",
            PlayerSlot::Player2 => "player2",
        }
    }

    /// Zero-based seat index (positional `players` arrays use this order).
    pub fn index(self) -> usize {
        match self {
            PlayerSlot::Player1 => 0,
            PlayerSlot::Player2 => 1,
        }
    }

    pub fn other(self) -> Self {
        match self {
            PlayerSlot::Player1 => PlayerSlot::Player2,
            PlayerSlot::Player2 => PlayerSlot::Player1,
        }
    }

    /// Lenient alias lookup used while reading untrusted payloads.
    ///
    /// Accepts the canonical names, short `p1`/`p2` forms, bare seat numbers,
    /// spaced variants and the challenger/opponent role names.
    pub fn from_alias(raw: &str) -> Option<Self> {
        let lowered = raw.trim().to_ascii_lowercase();
        match lowered.as_str() {
            "player1" | "player 1" | "player_1" | "p1" | "1" | "challenger" => {
                Some(PlayerSlot::Player1)
            }
            "player2" | "player 2" | "player_2" | "p2" | "2" | "opponent" => {
                Some(PlayerSlot::Player2)
            }
            _ => None,
        }
    }

    /// Coerce a JSON value (string alias or seat number) into a slot.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Self::from_alias(s),
            Value::Number(n) => match n.as_i64() {
                Some(1) => Some(PlayerSlot::Player1),
                Some(2) => Some(PlayerSlot::Player2),
                _ => None,
            },
            _ => None,
        }
    }
}

impl fmt::Display for PlayerSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlayerSlot {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_alias(s).ok_or_else(|| DomainError::unknown_slot(s))
    }
}
