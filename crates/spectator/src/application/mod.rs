//! Application layer: poll loop, session state and chat room logic.

pub mod backoff;
pub mod chat;
pub mod poller;
pub mod preferences;
pub mod session;
pub mod typing;
