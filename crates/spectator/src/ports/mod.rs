//! Port traits: the boundaries between application logic and adapters.

pub mod outbound;
