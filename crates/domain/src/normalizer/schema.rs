//! Declarative field mapping for duel state payloads.
//!
//! Every logical field of the view model owns an ordered list of key paths.
//! Lookup walks the list and the first path that yields a usable value wins,
//! so supporting a new payload shape means adding a path here rather than a
//! branch in the normalizer.

use serde_json::Value;

/// One step into a JSON document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathSeg {
    Key(&'static str),
    Index(usize),
}

pub type KeyPath = &'static [PathSeg];

/// Ordered alternatives for one logical field.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub field: &'static str,
    pub paths: &'static [KeyPath],
}

use PathSeg::{Index, Key};

// =============================================================================
// Duel-level fields
// =============================================================================

pub const CURRENT_PLAYER: FieldRule = FieldRule {
    field: "currentPlayer",
    paths: &[
        &[Key("currentPlayer")],
        &[Key("turn"), Key("current")],
        &[Key("turn"), Key("player")],
        &[Key("activePlayer")],
        &[Key("whoseTurn")],
    ],
};

pub const PLAYER1: FieldRule = FieldRule {
    field: "players.player1",
    paths: &[
        &[Key("players"), Key("player1")],
        &[Key("players"), Key("p1")],
        &[Key("challenger")],
        &[Key("players"), Index(0)],
        &[Key("player1")],
        &[Key("p1")],
    ],
};

pub const PLAYER2: FieldRule = FieldRule {
    field: "players.player2",
    paths: &[
        &[Key("players"), Key("player2")],
        &[Key("players"), Key("p2")],
        &[Key("opponent")],
        &[Key("players"), Index(1)],
        &[Key("player2")],
        &[Key("p2")],
    ],
};

pub const SPECTATOR_COUNT: FieldRule = FieldRule {
    field: "spectatorCount",
    paths: &[&[Key("spectatorCount")], &[Key("watching")]],
};

pub const SPECTATORS: FieldRule = FieldRule {
    field: "spectators",
    paths: &[&[Key("spectators")]],
};

pub const WINNER: FieldRule = FieldRule {
    field: "winner",
    paths: &[&[Key("winner")], &[Key("result"), Key("winner")]],
};

// =============================================================================
// Player-level fields (paths are relative to the player object)
// =============================================================================

pub const PLAYER_NAME: FieldRule = FieldRule {
    field: "name",
    paths: &[
        &[Key("discordName")],
        &[Key("displayName")],
        &[Key("name")],
        &[Key("username")],
    ],
};

pub const PLAYER_ID: FieldRule = FieldRule {
    field: "id",
    paths: &[&[Key("id")], &[Key("userId")]],
};

pub const HP: FieldRule = FieldRule {
    field: "hp",
    paths: &[&[Key("hp")], &[Key("HP")], &[Key("health")], &[Key("life")]],
};

pub const FIELD: FieldRule = FieldRule {
    field: "field",
    paths: &[
        &[Key("field")],
        &[Key("battlefield")],
        &[Key("board")],
        &[Key("inPlay")],
        &[Key("cards")],
    ],
};

pub const HAND_COUNT: FieldRule = FieldRule {
    field: "handCount",
    paths: &[&[Key("handCount")], &[Key("handSize")]],
};

pub const HAND: FieldRule = FieldRule {
    field: "hand",
    paths: &[&[Key("hand")], &[Key("cardsInHand")]],
};

pub const DECK_COUNT: FieldRule = FieldRule {
    field: "deckCount",
    paths: &[&[Key("deckCount")], &[Key("deckSize")]],
};

pub const DECK: FieldRule = FieldRule {
    field: "deck",
    paths: &[&[Key("deck")], &[Key("library")]],
};

pub const DISCARD_COUNT: FieldRule = FieldRule {
    field: "discardCount",
    paths: &[&[Key("discardCount")], &[Key("graveyardCount")]],
};

pub const DISCARD: FieldRule = FieldRule {
    field: "discardPile",
    paths: &[&[Key("discardPile")], &[Key("discard")], &[Key("graveyard")]],
};

// =============================================================================
// Card-level fields (paths are relative to a card object)
// =============================================================================

pub const CARD_ID: FieldRule = FieldRule {
    field: "cardId",
    paths: &[
        &[Key("cardId")],
        &[Key("card_id")],
        &[Key("id")],
        &[Key("code")],
        &[Key("image")],
    ],
};

pub const CARD_FACE_DOWN: FieldRule = FieldRule {
    field: "isFaceDown",
    paths: &[&[Key("isFaceDown")], &[Key("faceDown")], &[Key("facedown")]],
};

pub const CARD_FACE_UP: FieldRule = FieldRule {
    field: "isFaceUp",
    paths: &[&[Key("isFaceUp")], &[Key("faceUp")], &[Key("revealed")]],
};

pub const CARD_FIRED: FieldRule = FieldRule {
    field: "fired",
    paths: &[&[Key("fired")], &[Key("isFired")], &[Key("triggered")]],
};

// =============================================================================
// Lookup
// =============================================================================

/// Follow a single path. Missing keys, wrong container types and `null`
/// leaves all resolve to `None`.
pub fn resolve_path<'a>(root: &'a Value, path: KeyPath) -> Option<&'a Value> {
    let mut current = root;
    for seg in path {
        current = match seg {
            Key(key) => current.as_object()?.get(*key)?,
            Index(i) => current.as_array()?.get(*i)?,
        };
    }
    if current.is_null() {
        None
    } else {
        Some(current)
    }
}

impl FieldRule {
    /// First non-null value along the rule's paths.
    pub fn first_present<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        self.paths.iter().find_map(|path| resolve_path(root, path))
    }

    /// First value along the rule's paths that `convert` accepts.
    pub fn first_match<'a, T>(
        &self,
        root: &'a Value,
        mut convert: impl FnMut(&'a Value) -> Option<T>,
    ) -> Option<T> {
        self.paths
            .iter()
            .filter_map(|path| resolve_path(root, path))
            .find_map(|value| convert(value))
    }
}
