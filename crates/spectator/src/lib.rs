//! Duelview spectator client.
//!
//! Polls a duel server for state, renders it, and follows the duel's chat
//! room. Layout follows ports and adapters:
//! - `ports`: traits the application layer depends on
//! - `application`: poll loop, session, chat room state
//! - `infrastructure`: reqwest, tokio-tungstenite and storage adapters
//! - `ui`: board frames and terminal output
//! - `runner`: wires everything together for the binary

pub mod application;
pub mod config;
pub mod infrastructure;
pub mod ports;
pub mod runner;
pub mod ui;

pub use config::{ConfigError, SpectatorConfig, ViewMode};
