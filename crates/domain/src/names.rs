//! Display-name resolution with sticky memory.
//!
//! Duel servers frequently fall back to placeholder names ("Player 1",
//! "Challenger") on some polls and send the real name on others. Once a real
//! name has been seen for a seat it sticks for the rest of the session so the
//! header never flickers back to a placeholder.

use serde::{Deserialize, Serialize};

use crate::slot::PlayerSlot;

/// Names that carry no information about who is actually seated.
const GENERIC_NAMES: &[&str] = &[
    "",
    "player",
    "player 1",
    "player1",
    "challenger",
    "player 2",
    "player2",
    "opponent",
];

/// Case-insensitive placeholder check.
pub fn is_generic_name(name: &str) -> bool {
    let lowered = name.trim().to_ascii_lowercase();
    GENERIC_NAMES.contains(&lowered.as_str())
}

/// Fallback name shown when nothing better is known.
pub fn default_name(slot: PlayerSlot) -> &'static str {
    match slot {
        PlayerSlot::Player1 => "Challenger",
        PlayerSlot::Player2 => "Opponent",
    }
}

/// Names supplied out-of-band (configuration, launch parameters).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameHints {
    pub player1: Option<String>,
    pub player2: Option<String>,
}

impl NameHints {
    pub fn get(&self, slot: PlayerSlot) -> Option<&str> {
        match slot {
            PlayerSlot::Player1 => self.player1.as_deref(),
            PlayerSlot::Player2 => self.player2.as_deref(),
        }
    }
}

/// Per-session memory of the first real name seen for each seat.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameMemory {
    sticky: [Option<String>; 2],
}

impl NameMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sticky(&self, slot: PlayerSlot) -> Option<&str> {
        self.sticky[slot.index()].as_deref()
    }

    /// Record an observed name. Only the first non-generic name is kept.
    pub fn observe(&mut self, slot: PlayerSlot, name: &str) {
        let entry = &mut self.sticky[slot.index()];
        if entry.is_none() && !is_generic_name(name) {
            *entry = Some(name.trim().to_string());
        }
    }

    /// Pick the display name for a seat.
    ///
    /// A non-generic explicit name is shown as-is. Otherwise the chain is
    /// sticky name, then a non-generic hint, then the seat default.
    pub fn resolve(&mut self, slot: PlayerSlot, explicit: Option<&str>, hints: &NameHints) -> String {
        if let Some(name) = explicit.map(str::trim).filter(|n| !is_generic_name(n)) {
            self.observe(slot, name);
            return name.to_string();
        }

        if let Some(sticky) = self.sticky(slot) {
            return sticky.to_string();
        }

        if let Some(hint) = hints.get(slot).map(str::trim).filter(|n| !is_generic_name(n)) {
            return hint.to_string();
        }

        default_name(slot).to_string()
    }
}
