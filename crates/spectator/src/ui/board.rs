//! Text board frame built from a view model.

use std::fmt;

use duelview_domain::{CardRef, DuelViewModel, PlayerSlot, PlayerView};

use super::card_art::CardArt;

/// A card tile: label plus image candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardTile {
    /// Three-digit code, empty when the card is hidden or has no identity
    pub label: String,
    pub face_down: bool,
    pub images: Vec<String>,
}

impl CardTile {
    fn from_card(card: &CardRef, art: &CardArt) -> Self {
        let face = card.face();
        let label = match face {
            duelview_domain::CardFace::Up(identity) => identity.code(),
            _ => String::new(),
        };
        Self {
            label,
            face_down: face.is_face_down(),
            images: art.images_for(face),
        }
    }
}

impl fmt::Display for CardTile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.face_down, self.label.as_str()) {
            (true, _) => f.write_str("[###]"),
            (false, "") => f.write_str("[ ? ]"),
            (false, label) => write!(f, "[{label}]"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerPanel {
    pub slot: PlayerSlot,
    pub name: String,
    pub hp_line: String,
    pub tiles: Vec<CardTile>,
    pub hand_count: u32,
    pub deck_count: u32,
    pub discard_count: u32,
    pub is_current: bool,
}

impl PlayerPanel {
    fn new(slot: PlayerSlot, player: &PlayerView, is_current: bool, art: &CardArt) -> Self {
        Self {
            slot,
            name: player.name.clone(),
            hp_line: format!("HP: {}", player.hp),
            tiles: player
                .field
                .iter()
                .map(|card| CardTile::from_card(card, art))
                .collect(),
            hand_count: player.hand_count,
            deck_count: player.deck_count,
            discard_count: player.discard_count,
            is_current,
        }
    }
}

impl fmt::Display for PlayerPanel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = if self.is_current { ">" } else { " " };
        writeln!(f, "{marker} {} ({})  {}", self.name, self.slot, self.hp_line)?;
        if self.tiles.is_empty() {
            writeln!(f, "    (no cards in play)")?;
        } else {
            let row: Vec<String> = self.tiles.iter().map(ToString::to_string).collect();
            writeln!(f, "    {}", row.join(" "))?;
        }
        write!(
            f,
            "    Hand: {}  Deck: {}  Discard: {}",
            self.hand_count, self.deck_count, self.discard_count
        )
    }
}

/// Everything the terminal needs to draw one duel state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardFrame {
    pub turn_line: String,
    pub spectators_line: String,
    pub winner_banner: Option<String>,
    pub players: [PlayerPanel; 2],
}

impl BoardFrame {
    pub fn from_view(view: &DuelViewModel, art: &CardArt) -> Self {
        let panel = |slot: PlayerSlot| {
            PlayerPanel::new(slot, view.player(slot), view.current_player == slot, art)
        };
        Self {
            turn_line: format!("Current Turn: {}", view.current_player),
            spectators_line: format!("Spectators Watching: {}", view.spectator_count),
            winner_banner: view
                .winner
                .map(|slot| format!("{} wins!", view.player(slot).name)),
            players: [panel(PlayerSlot::Player1), panel(PlayerSlot::Player2)],
        }
    }
}

impl fmt::Display for BoardFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}    {}", self.turn_line, self.spectators_line)?;
        if let Some(banner) = &self.winner_banner {
            writeln!(f, "*** {banner} ***")?;
        }
        writeln!(f, "{}", self.players[0])?;
        write!(f, "{}", self.players[1])
    }
}
