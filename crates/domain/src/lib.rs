//! Duelview Domain - the spectator's model of a duel.
//!
//! The external duel server owns the game; this crate only knows how to read
//! whatever shape its state payload arrives in and fold it into one canonical
//! [`DuelViewModel`]. Nothing here performs I/O.

pub mod card;
pub mod error;
pub mod names;
pub mod normalizer;
pub mod slot;
pub mod view_model;

pub use card::{CardFace, CardIdentity, TRAP_CARD_IDS};
pub use error::DomainError;
pub use names::{is_generic_name, NameHints, NameMemory};
pub use normalizer::normalize;
pub use slot::PlayerSlot;
pub use view_model::{CardRef, DuelViewModel, PlayerView, Players, DEFAULT_HP};
