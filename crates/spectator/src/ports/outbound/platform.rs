//! Platform abstraction ports
//!
//! These traits keep the application layer free of file-system and RNG
//! details so it can be driven deterministically in tests.

/// Random number generation abstraction
pub trait RandomProvider: Send + Sync {
    /// Generate a random u64 in range [min, max] (inclusive)
    fn random_range(&self, min: u64, max: u64) -> u64;
}

/// Persistent key/value storage (file-backed on desktop, in-memory in tests)
pub trait StorageProvider: Send + Sync {
    /// Save a string value with the given key
    fn save(&self, key: &str, value: &str);

    /// Load a string value by key, returns None if not found
    fn load(&self, key: &str) -> Option<String>;

    /// Remove a value by key
    fn remove(&self, key: &str);

    /// All stored keys starting with `prefix`
    fn keys_with_prefix(&self, prefix: &str) -> Vec<String>;
}

/// Storage key constants
///
/// These match the keys the browser client used so an exported profile keeps
/// its viewer id and music preference.
pub mod storage_keys {
    pub const VIEWER_ID: &str = "sv13.chat.uid";
    pub const MUSIC_MUTED: &str = "sv13_spectator_bgm.muted";
    pub const LAST_GOOD_PREFIX: &str = "sv13.spectator.last_good";

    /// Key for the last successfully rendered duel of a room.
    pub fn last_good(room_id: &str) -> String {
        format!("{LAST_GOOD_PREFIX}.{room_id}")
    }
}
