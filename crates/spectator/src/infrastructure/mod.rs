//! Infrastructure adapters: HTTP, WebSocket, storage and randomness.

pub mod chat;
pub mod http_client;
pub mod random;
pub mod storage;
