//! Duel state normalizer.
//!
//! Folds an arbitrarily shaped duel payload into a [`DuelViewModel`]. The
//! function is total: anything missing or malformed falls back to a default.
//! The only state it touches is the caller-owned [`NameMemory`].

pub mod coerce;
pub mod schema;

use serde_json::Value;

use crate::names::{is_generic_name, NameHints, NameMemory};
use crate::slot::PlayerSlot;
use crate::view_model::{CardRef, DuelViewModel, PlayerView, Players, DEFAULT_HP};

use coerce::{as_count, as_flag, as_hp, as_text, seq_len};

/// Normalize a raw duel payload.
pub fn normalize(raw: &Value, memory: &mut NameMemory, hints: &NameHints) -> DuelViewModel {
    let current_player = schema::CURRENT_PLAYER
        .first_match(raw, PlayerSlot::from_value)
        .unwrap_or_default();

    let spectator_count = schema::SPECTATOR_COUNT
        .first_match(raw, as_count)
        .or_else(|| schema::SPECTATORS.first_match(raw, seq_len))
        .unwrap_or(0);

    let raw_p1 = schema::PLAYER1.first_match(raw, as_object);
    let raw_p2 = schema::PLAYER2.first_match(raw, as_object);

    let players = Players {
        player1: normalize_player(PlayerSlot::Player1, raw_p1, memory, hints),
        player2: normalize_player(PlayerSlot::Player2, raw_p2, memory, hints),
    };

    let winner = schema::WINNER
        .first_match(raw, |v| winner_from_value(v, [raw_p1, raw_p2], &players))
        .or_else(|| derive_winner(&players));

    DuelViewModel {
        current_player,
        spectator_count,
        players,
        winner,
    }
}

fn as_object(value: &Value) -> Option<&Value> {
    value.is_object().then_some(value)
}

fn normalize_player(
    slot: PlayerSlot,
    raw: Option<&Value>,
    memory: &mut NameMemory,
    hints: &NameHints,
) -> PlayerView {
    let Some(raw) = raw else {
        let name = memory.resolve(slot, None, hints);
        return PlayerView::empty(name);
    };

    // A placeholder in one name field must not hide a real name in another.
    let explicit_name = schema::PLAYER_NAME
        .first_match(raw, |v| as_text(v).filter(|n| !is_generic_name(n)));
    let name = memory.resolve(slot, explicit_name.as_deref(), hints);

    let hp = schema::HP
        .first_present(raw)
        .and_then(as_hp)
        .unwrap_or(DEFAULT_HP);

    let field = schema::FIELD
        .first_present(raw)
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(card_ref).collect())
        .unwrap_or_default();

    let hand_count = schema::HAND_COUNT
        .first_match(raw, as_count)
        .or_else(|| schema::HAND.first_match(raw, seq_len))
        .unwrap_or(0);
    let deck_count = schema::DECK_COUNT
        .first_match(raw, as_count)
        .or_else(|| schema::DECK.first_match(raw, seq_len))
        .unwrap_or(0);
    let discard_count = schema::DISCARD_COUNT
        .first_match(raw, as_count)
        .or_else(|| schema::DISCARD.first_match(raw, seq_len))
        .unwrap_or(0);

    PlayerView {
        name,
        hp,
        field,
        hand_count,
        deck_count,
        discard_count,
    }
}

/// Coerce one battlefield entry. Nulls (empty zones) and other junk are skipped.
fn card_ref(value: &Value) -> Option<CardRef> {
    match value {
        Value::Number(_) | Value::String(_) => as_text(value).map(CardRef::new),
        Value::Object(_) => Some(CardRef {
            reference: schema::CARD_ID.first_match(value, as_text),
            face_down: schema::CARD_FACE_DOWN.first_match(value, as_flag).unwrap_or(false),
            face_up: schema::CARD_FACE_UP.first_match(value, as_flag).unwrap_or(false),
            fired: schema::CARD_FIRED.first_match(value, as_flag).unwrap_or(false),
        }),
        _ => None,
    }
}

/// Interpret an explicit winner field: a slot alias, a player id, or a
/// player's (non-placeholder) display name.
fn winner_from_value(
    value: &Value,
    raw_players: [Option<&Value>; 2],
    players: &Players,
) -> Option<PlayerSlot> {
    if let Some(slot) = PlayerSlot::from_value(value) {
        return Some(slot);
    }

    let text = as_text(value)?;
    PlayerSlot::ALL.into_iter().find(|slot| {
        let id_matches = raw_players[slot.index()]
            .and_then(|raw| schema::PLAYER_ID.first_match(raw, as_text))
            .is_some_and(|id| id == text);
        let name = &players.get(*slot).name;
        let name_matches = !is_generic_name(name) && name.eq_ignore_ascii_case(&text);
        id_matches || name_matches
    })
}

/// Winner implied by hit points alone.
///
/// A simultaneous knockout goes to player one.
fn derive_winner(players: &Players) -> Option<PlayerSlot> {
    match (players.player1.is_defeated(), players.player2.is_defeated()) {
        (true, false) => Some(PlayerSlot::Player2),
        (false, true) => Some(PlayerSlot::Player1),
        (true, true) => Some(PlayerSlot::Player1),
        (false, false) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(raw: Value) -> DuelViewModel {
        normalize(&raw, &mut NameMemory::new(), &NameHints::default())
    }

    #[test]
    fn empty_payload_yields_defaults() {
        let view = run(json!({}));

        assert_eq!(view.current_player, PlayerSlot::Player1);
        assert_eq!(view.spectator_count, 0);
        assert_eq!(view.winner, None);
        for slot in PlayerSlot::ALL {
            let p = view.player(slot);
            assert_eq!(p.hp, 200);
            assert!(p.field.is_empty());
            assert_eq!((p.hand_count, p.deck_count, p.discard_count), (0, 0, 0));
            assert!(!p.name.is_empty());
        }
        assert_eq!(view.players.player1.name, "Challenger");
        assert_eq!(view.players.player2.name, "Opponent");
    }

    #[test]
    fn non_object_payloads_are_tolerated() {
        for raw in [json!(null), json!([]), json!("oops"), json!(12)] {
            let view = run(raw);
            assert_eq!(view.players.player1.hp, DEFAULT_HP);
            assert_eq!(view.winner, None);
        }
    }

    #[test]
    fn knocked_out_player_loses() {
        let view = run(json!({"players": {"player1": {"hp": 0}, "player2": {"hp": 150}}}));
        assert_eq!(view.winner, Some(PlayerSlot::Player2));
    }

    #[test]
    fn double_knockout_goes_to_player_one() {
        let view = run(json!({"players": {"player1": {"hp": -5}, "player2": {"hp": 0}}}));
        assert_eq!(view.winner, Some(PlayerSlot::Player1));
    }

    #[test]
    fn explicit_winner_beats_derivation() {
        let view = run(json!({
            "winner": "p2",
            "players": {"player1": {"hp": 50}, "player2": {"hp": 0}}
        }));
        assert_eq!(view.winner, Some(PlayerSlot::Player2));
    }

    #[test]
    fn explicit_winner_may_name_a_player_id_or_name() {
        let by_id = run(json!({
            "result": {"winner": "u-42"},
            "challenger": {"userId": "u-42"},
            "opponent": {"userId": "u-7"}
        }));
        assert_eq!(by_id.winner, Some(PlayerSlot::Player1));

        let by_name = run(json!({
            "winner": "vex",
            "players": [{"name": "Nyx"}, {"name": "Vex"}]
        }));
        assert_eq!(by_name.winner, Some(PlayerSlot::Player2));
    }

    #[test]
    fn current_player_follows_resolution_order() {
        assert_eq!(run(json!({"turn": {"player": "p2"}})).current_player, PlayerSlot::Player2);
        assert_eq!(
            run(json!({"currentPlayer": "player1", "whoseTurn": "player2"})).current_player,
            PlayerSlot::Player1
        );
        assert_eq!(
            run(json!({"currentPlayer": "???", "activePlayer": 2})).current_player,
            PlayerSlot::Player2
        );
    }

    #[test]
    fn alternate_player_shapes_are_found() {
        let positional = run(json!({"players": [{"hp": 10}, {"hp": 20}]}));
        assert_eq!(positional.players.player1.hp, 10);
        assert_eq!(positional.players.player2.hp, 20);

        let roles = run(json!({"challenger": {"health": 33}, "opponent": {"life": "44"}}));
        assert_eq!(roles.players.player1.hp, 33);
        assert_eq!(roles.players.player2.hp, 44);

        let bare = run(json!({"p1": {"HP": 1}, "player2": {"hp": 2}}));
        assert_eq!(bare.players.player1.hp, 1);
        assert_eq!(bare.players.player2.hp, 2);
    }

    #[test]
    fn invalid_hp_falls_back_to_default() {
        let view = run(json!({"players": {"player1": {"hp": "lots", "health": 5}}}));
        assert_eq!(view.players.player1.hp, DEFAULT_HP);
    }

    #[test]
    fn counts_prefer_explicit_fields_then_sequence_length() {
        let view = run(json!({
            "players": {
                "player1": {"handCount": 4, "hand": [1, 2], "deck": [1, 2, 3], "graveyard": [9]},
                "player2": {"handSize": -1, "cardsInHand": [1], "deckSize": "12"}
            }
        }));
        let p1 = &view.players.player1;
        assert_eq!((p1.hand_count, p1.deck_count, p1.discard_count), (4, 3, 1));
        let p2 = &view.players.player2;
        assert_eq!((p2.hand_count, p2.deck_count, p2.discard_count), (0, 12, 0));
    }

    #[test]
    fn battlefield_accepts_mixed_card_references() {
        let view = run(json!({
            "players": {"player1": {"battlefield": [
                7,
                "045_FireDragon",
                {"cardId": "210", "isFaceDown": true, "fired": "true"},
                null
            ]}}
        }));
        let field = &view.players.player1.field;
        assert_eq!(field.len(), 3);
        assert_eq!(field[0].reference.as_deref(), Some("7"));
        assert_eq!(field[1].reference.as_deref(), Some("045_FireDragon"));
        assert!(field[2].face_down);
        assert!(field[2].fired);
    }

    #[test]
    fn non_sequence_field_is_empty() {
        let view = run(json!({"players": {"player1": {"field": {"slot": 1}, "board": [1]}}}));
        assert!(view.players.player1.field.is_empty());
    }

    #[test]
    fn spectator_count_from_number_or_list() {
        assert_eq!(run(json!({"spectatorCount": 5})).spectator_count, 5);
        assert_eq!(run(json!({"spectators": ["a", "b"]})).spectator_count, 2);
        assert_eq!(run(json!({"watching": 9, "spectators": []})).spectator_count, 9);
    }

    #[test]
    fn sticky_names_persist_across_polls() {
        let mut memory = NameMemory::new();
        let hints = NameHints::default();

        let first = normalize(
            &json!({"players": {"player1": {"discordName": "Nyx"}}}),
            &mut memory,
            &hints,
        );
        assert_eq!(first.players.player1.name, "Nyx");

        let second = normalize(
            &json!({"players": {"player1": {"name": "Player 1"}}}),
            &mut memory,
            &hints,
        );
        assert_eq!(second.players.player1.name, "Nyx");

        let third = normalize(&json!({}), &mut memory, &hints);
        assert_eq!(third.players.player1.name, "Nyx");
        assert_eq!(third.players.player2.name, "Opponent");
    }

    #[test]
    fn hints_fill_in_missing_names() {
        let hints = NameHints {
            player1: None,
            player2: Some("Vex".into()),
        };
        let view = normalize(&json!({}), &mut NameMemory::new(), &hints);
        assert_eq!(view.players.player2.name, "Vex");
    }

    #[test]
    fn real_name_in_a_later_field_beats_a_placeholder() {
        let view = run(json!({
            "players": {"player1": {"discordName": "Player 1", "name": "Nyx"}}
        }));
        assert_eq!(view.players.player1.name, "Nyx");
    }

    #[test]
    fn all_placeholder_names_fall_back_to_default() {
        let view = run(json!({
            "players": {"player2": {"discordName": "Player 2", "username": "opponent"}}
        }));
        assert_eq!(view.players.player2.name, "Opponent");
    }
}
