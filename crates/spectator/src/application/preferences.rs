//! Viewer preferences persisted across runs.

use std::sync::Arc;

use uuid::Uuid;

use crate::ports::outbound::{storage_keys, StorageProvider};

pub struct Preferences {
    storage: Arc<dyn StorageProvider>,
}

impl Preferences {
    pub fn new(storage: Arc<dyn StorageProvider>) -> Self {
        Self { storage }
    }

    /// Stable id used to tag this viewer's own chat lines.
    ///
    /// Generated on first use and stored; a blank stored value is replaced.
    pub fn viewer_id(&self) -> String {
        if let Some(id) = self
            .storage
            .load(storage_keys::VIEWER_ID)
            .filter(|id| !id.trim().is_empty())
        {
            return id;
        }
        let id = Uuid::new_v4().to_string();
        self.storage.save(storage_keys::VIEWER_ID, &id);
        tracing::debug!(viewer_id = %id, "Generated viewer id");
        id
    }

    /// Background music mute preference. Defaults to unmuted.
    pub fn music_muted(&self) -> bool {
        matches!(
            self.storage.load(storage_keys::MUSIC_MUTED).as_deref(),
            Some("1") | Some("true")
        )
    }

    pub fn set_music_muted(&self, muted: bool) {
        self.storage
            .save(storage_keys::MUSIC_MUTED, if muted { "1" } else { "0" });
    }

    /// Flip the mute preference and return the new value.
    pub fn toggle_music(&self) -> bool {
        let muted = !self.music_muted();
        self.set_music_muted(muted);
        muted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::MemoryStorage;

    #[test]
    fn viewer_id_is_generated_once() {
        let storage: Arc<dyn StorageProvider> = Arc::new(MemoryStorage::default());
        let prefs = Preferences::new(Arc::clone(&storage));

        let first = prefs.viewer_id();
        assert!(Uuid::parse_str(&first).is_ok());
        assert_eq!(prefs.viewer_id(), first);
        assert_eq!(storage.load(storage_keys::VIEWER_ID), Some(first));
    }

    #[test]
    fn existing_viewer_id_is_kept() {
        let storage: Arc<dyn StorageProvider> = Arc::new(MemoryStorage::default());
        storage.save(storage_keys::VIEWER_ID, "u-legacy1");
        assert_eq!(Preferences::new(storage).viewer_id(), "u-legacy1");
    }

    #[test]
    fn music_toggle_persists() {
        let storage: Arc<dyn StorageProvider> = Arc::new(MemoryStorage::default());
        let prefs = Preferences::new(Arc::clone(&storage));
        assert!(!prefs.music_muted());

        assert!(prefs.toggle_music());
        assert!(Preferences::new(Arc::clone(&storage)).music_muted());
        assert!(!prefs.toggle_music());
        assert_eq!(storage.load(storage_keys::MUSIC_MUTED).as_deref(), Some("0"));
    }
}
