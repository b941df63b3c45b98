//! Canonical duel view model.
//!
//! This is the only shape the renderer and the last-known-good cache ever see.
//! It round-trips through serde so a snapshot can be persisted between runs.

use serde::{Deserialize, Serialize};

use crate::card::{CardFace, CardIdentity};
use crate::names::default_name;
use crate::slot::PlayerSlot;

/// Hit points assumed when the payload carries none (or garbage).
pub const DEFAULT_HP: i32 = 200;

/// A card on the battlefield, as referenced by the duel payload.
///
/// The reference is kept verbatim; the numeric identity is extracted on demand
/// at render time.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardRef {
    /// Raw reference text (`"045"`, `"045_FireDragon"`, `"7"` ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default)]
    pub face_down: bool,
    #[serde(default)]
    pub face_up: bool,
    #[serde(default)]
    pub fired: bool,
}

impl CardRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: Some(reference.into()),
            ..Default::default()
        }
    }

    pub fn identity(&self) -> Option<CardIdentity> {
        self.reference.as_deref().and_then(CardIdentity::extract)
    }

    pub fn face(&self) -> CardFace {
        CardFace::resolve(self)
    }
}

/// One player's half of the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub name: String,
    pub hp: i32,
    pub field: Vec<CardRef>,
    pub hand_count: u32,
    pub deck_count: u32,
    pub discard_count: u32,
}

impl PlayerView {
    /// Defaults for a seat the payload said nothing about.
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hp: DEFAULT_HP,
            field: Vec::new(),
            hand_count: 0,
            deck_count: 0,
            discard_count: 0,
        }
    }

    pub fn is_defeated(&self) -> bool {
        self.hp <= 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Players {
    pub player1: PlayerView,
    pub player2: PlayerView,
}

impl Players {
    pub fn get(&self, slot: PlayerSlot) -> &PlayerView {
        match slot {
            PlayerSlot::Player1 => &self.player1,
            PlayerSlot::Player2 => &self.player2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuelViewModel {
    pub current_player: PlayerSlot,
    pub spectator_count: u32,
    pub players: Players,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<PlayerSlot>,
}

impl Default for DuelViewModel {
    /// What an empty payload normalizes to.
    fn default() -> Self {
        Self {
            current_player: PlayerSlot::default(),
            spectator_count: 0,
            players: Players {
                player1: PlayerView::empty(default_name(PlayerSlot::Player1)),
                player2: PlayerView::empty(default_name(PlayerSlot::Player2)),
            },
            winner: None,
        }
    }
}

impl DuelViewModel {
    pub fn player(&self, slot: PlayerSlot) -> &PlayerView {
        self.players.get(slot)
    }

    pub fn is_finished(&self) -> bool {
        self.winner.is_some()
    }
}
