//! Presentation: board frames, card art lookup and the terminal sink.

pub mod board;
pub mod card_art;
pub mod terminal;

pub use board::{BoardFrame, CardTile, PlayerPanel};
pub use card_art::CardArt;
pub use terminal::TerminalSink;
