//! Chat room transport.

mod client;
pub mod core;

pub use client::ChatClient;
pub use self::core::ReconnectPolicy;
