//! Duelview Shared - types exchanged with the external duel backend
//!
//! This crate contains everything the spectator client and any test fixtures
//! need to agree on with the backend:
//! - Chat event envelopes (ClientEvent, ServerEvent)
//! - Duel state endpoint paths and query parameter names
//! - Network pacing limits
//!
//! # Design Principles
//!
//! 1. **Minimal dependencies** - serde, serde_json and `duelview-domain` (for `PlayerSlot`)
//! 2. **No business logic** - Pure data types and serialization
//! 3. **Forward compatible** - Unknown server events deserialize to `Unknown`

pub mod chat;
pub mod endpoints;
pub mod limits;

pub use chat::{ChatLine, ClientEvent, DuelResult, JoinRoom, ServerEvent};
pub use endpoints::{candidate_paths, EndpointPath};
pub use limits::{NetLimits, NET_LIMITS};
