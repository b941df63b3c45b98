//! Error types for the domain layer
//!
//! Normalization itself never fails; these errors only surface from the
//! strict parsers that callers use for configuration and wire values.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A string did not name a player slot
    #[error("Unknown player slot: {0}")]
    UnknownSlot(String),

    /// A card reference did not contain a usable identifier
    #[error("No card identity in reference: {0}")]
    NoCardIdentity(String),
}

impl DomainError {
    pub fn unknown_slot(value: impl Into<String>) -> Self {
        Self::UnknownSlot(value.into())
    }

    pub fn no_card_identity(value: impl Into<String>) -> Self {
        Self::NoCardIdentity(value.into())
    }
}
