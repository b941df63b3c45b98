//! Card identity extraction and face resolution.
//!
//! Card references arrive as bare numbers (`7`), padded codes (`"007"`) or
//! art file stems with a descriptive suffix (`"045_FireDragon"`). The first
//! free-standing run of one to three digits is the card's identity.

use std::fmt;
use std::ops::RangeInclusive;
use std::sync::LazyLock;

use regex_lite::Regex;

use crate::error::DomainError;
use crate::view_model::CardRef;

/// Identities reserved for trap cards. A trap stays face-down until fired.
pub const TRAP_CARD_IDS: RangeInclusive<u16> = 201..=250;

// A 1-3 digit run that is not part of a longer digit run.
static CARD_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^0-9])([0-9]{1,3})(?:[^0-9]|$)").expect("valid regex")
});

/// Numeric card identity, rendered as a zero-padded three digit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CardIdentity(u16);

impl CardIdentity {
    /// Extract the leading numeric token from a card reference.
    pub fn extract(reference: &str) -> Option<Self> {
        let caps = CARD_ID_RE.captures(reference)?;
        let digits = caps.get(1)?.as_str();
        digits.parse::<u16>().ok().map(CardIdentity)
    }

    /// Strict variant of [`CardIdentity::extract`].
    pub fn parse(reference: &str) -> Result<Self, DomainError> {
        Self::extract(reference).ok_or_else(|| DomainError::no_card_identity(reference))
    }

    pub fn number(self) -> u16 {
        self.0
    }

    /// Zero-padded code used for art file names and tile labels.
    pub fn code(self) -> String {
        format!("{:03}", self.0)
    }

    pub fn is_trap(self) -> bool {
        TRAP_CARD_IDS.contains(&self.0)
    }
}

impl fmt::Display for CardIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03}", self.0)
    }
}

/// How a card should be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardFace {
    Up(CardIdentity),
    Down,
    /// Face-up, but the reference carried no identity to draw.
    Unresolved,
}

impl CardFace {
    /// Decide the face for a card reference.
    ///
    /// Traps ignore every face-up signal until `fired` is set. Other cards are
    /// face-down only when flagged so and not also flagged face-up.
    pub fn resolve(card: &CardRef) -> Self {
        let identity = card.identity();

        if let Some(id) = identity {
            if id.is_trap() && !card.fired {
                return CardFace::Down;
            }
        }

        if card.face_down && !card.face_up && !card.fired {
            return CardFace::Down;
        }

        match identity {
            Some(id) => CardFace::Up(id),
            None => CardFace::Unresolved,
        }
    }

    pub fn is_face_down(self) -> bool {
        matches!(self, CardFace::Down)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_and_pads_leading_token() {
        assert_eq!(CardIdentity::extract("7").map(CardIdentity::code), Some("007".into()));
        assert_eq!(
            CardIdentity::extract("045_FireDragon").map(CardIdentity::code),
            Some("045".into())
        );
        assert_eq!(
            CardIdentity::extract("card-12 Hex Ward").map(CardIdentity::code),
            Some("012".into())
        );
    }

    #[test]
    fn rejects_references_without_short_digit_runs() {
        assert_eq!(CardIdentity::extract("FireDragon"), None);
        assert_eq!(CardIdentity::extract("1234"), None);
        assert_eq!(CardIdentity::extract(""), None);
        assert!(CardIdentity::parse("none").is_err());
    }

    #[test]
    fn first_free_standing_run_wins() {
        let id = CardIdentity::extract("1234_then_056").unwrap();
        assert_eq!(id.number(), 56);
    }

    #[test]
    fn trap_stays_down_until_fired_even_when_flagged_face_up() {
        let mut trap = CardRef::new("210_SnareTrap");
        trap.face_up = true;
        assert_eq!(trap.face(), CardFace::Down);

        trap.fired = true;
        assert_eq!(trap.face(), CardFace::Up(CardIdentity(210)));
    }

    #[test]
    fn ordinary_cards_honor_face_down_flag() {
        let mut card = CardRef::new("012");
        assert_eq!(card.face(), CardFace::Up(CardIdentity(12)));

        card.face_down = true;
        assert!(card.face().is_face_down());

        card.face_up = true;
        assert_eq!(card.face(), CardFace::Up(CardIdentity(12)));
    }

    #[test]
    fn reference_without_identity_is_unresolved() {
        assert_eq!(CardRef::new("mystery").face(), CardFace::Unresolved);
        assert_eq!(CardRef::default().face(), CardFace::Unresolved);
    }
}
