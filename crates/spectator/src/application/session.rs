//! Spectator session state.
//!
//! Everything the poll loop remembers between ticks lives here: sticky
//! display names, the last successfully rendered view model and the ETag it
//! came with. The session is owned by the poll task and handed back when the
//! poller stops.

use std::sync::Arc;

use duelview_domain::{normalize, DuelViewModel, NameHints, NameMemory};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ports::outbound::{storage_keys, StorageProvider};

/// Snapshot format written to local storage.
///
/// `names` holds only names the server actually sent; hint and default names
/// shown in `view` are not sticky.
#[derive(Debug, Serialize, Deserialize)]
struct StoredSnapshot {
    view: DuelViewModel,
    #[serde(default)]
    names: NameMemory,
}

pub struct SpectatorSession {
    room_id: String,
    names: NameMemory,
    hints: NameHints,
    last_good: Option<Arc<DuelViewModel>>,
    etag: Option<String>,
    storage: Option<Arc<dyn StorageProvider>>,
    pruned: bool,
}

impl SpectatorSession {
    pub fn new(room_id: impl Into<String>, hints: NameHints) -> Self {
        Self {
            room_id: room_id.into(),
            names: NameMemory::new(),
            hints,
            last_good: None,
            etag: None,
            storage: None,
            pruned: false,
        }
    }

    /// Persist the last good snapshot through `storage`.
    pub fn with_storage(mut self, storage: Arc<dyn StorageProvider>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn names(&self) -> &NameMemory {
        &self.names
    }

    pub fn last_good(&self) -> Option<&Arc<DuelViewModel>> {
        self.last_good.as_ref()
    }

    /// Validator for the next conditional fetch. Only sent once we hold a
    /// view to fall back on, otherwise a 304 would leave nothing to show.
    pub fn etag(&self) -> Option<String> {
        self.last_good.as_ref().and(self.etag.clone())
    }

    /// Fold a fresh payload into the session and return the new view model.
    ///
    /// The snapshot is only persisted when the view or the sticky names changed.
    pub fn absorb(&mut self, raw: &Value, etag: Option<String>) -> Arc<DuelViewModel> {
        let names_before = self.names.clone();
        let view = Arc::new(normalize(raw, &mut self.names, &self.hints));
        let changed =
            self.last_good.as_deref() != Some(view.as_ref()) || names_before != self.names;
        self.last_good = Some(Arc::clone(&view));
        self.etag = etag;
        if changed {
            self.persist(&view);
        }
        view
    }

    fn persist(&mut self, view: &DuelViewModel) {
        let Some(storage) = self.storage.clone() else {
            return;
        };
        let key = storage_keys::last_good(&self.room_id);
        if !self.pruned {
            self.pruned = true;
            prune_other_rooms(storage.as_ref(), &key);
        }
        let snapshot = StoredSnapshot {
            view: view.clone(),
            names: self.names.clone(),
        };
        match serde_json::to_string(&snapshot) {
            Ok(json) => storage.save(&key, &json),
            Err(e) => tracing::warn!(error = %e, "Failed to serialize duel snapshot"),
        }
    }

    /// Load the snapshot persisted by a previous run, if any.
    ///
    /// The restored view is shown until the first poll lands. Its ETag is not
    /// restored, so the first poll always fetches a full payload.
    pub fn restore(&mut self) -> Option<Arc<DuelViewModel>> {
        let storage = self.storage.as_ref()?;
        let raw = storage.load(&storage_keys::last_good(&self.room_id))?;
        match serde_json::from_str::<StoredSnapshot>(&raw) {
            Ok(snapshot) => {
                self.names = snapshot.names;
                let view = Arc::new(snapshot.view);
                self.last_good = Some(Arc::clone(&view));
                Some(view)
            }
            Err(e) => {
                tracing::warn!(error = %e, room = %self.room_id, "Discarding unreadable duel snapshot");
                storage.remove(&storage_keys::last_good(&self.room_id));
                None
            }
        }
    }
}

/// Only the room being watched keeps a snapshot.
fn prune_other_rooms(storage: &dyn StorageProvider, keep: &str) {
    let prefix = format!("{}.", storage_keys::LAST_GOOD_PREFIX);
    for key in storage.keys_with_prefix(&prefix) {
        if key != keep {
            tracing::debug!(key = %key, "Dropping snapshot of another room");
            storage.remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::MemoryStorage;
    use duelview_domain::PlayerSlot;
    use serde_json::json;

    #[test]
    fn absorb_updates_last_good_and_etag() {
        let mut session = SpectatorSession::new("duel-1", NameHints::default());
        assert_eq!(session.etag(), None);

        let view = session.absorb(&json!({"currentPlayer": "p2"}), Some("\"v1\"".into()));
        assert_eq!(view.current_player, PlayerSlot::Player2);
        assert!(Arc::ptr_eq(session.last_good().unwrap(), &view));
        assert_eq!(session.etag().as_deref(), Some("\"v1\""));
    }

    #[test]
    fn snapshot_round_trips_through_storage() {
        let storage: Arc<dyn StorageProvider> = Arc::new(MemoryStorage::default());

        let mut first = SpectatorSession::new("duel-1", NameHints::default())
            .with_storage(Arc::clone(&storage));
        first.absorb(
            &json!({"players": {"player1": {"name": "Nyx", "hp": 120}}}),
            Some("\"v1\"".into()),
        );

        let mut second =
            SpectatorSession::new("duel-1", NameHints::default()).with_storage(storage);
        let restored = second.restore().unwrap();
        assert_eq!(restored.players.player1.hp, 120);
        assert_eq!(second.names().sticky(PlayerSlot::Player1), Some("Nyx"));
        assert_eq!(second.etag(), None);
    }

    #[test]
    fn unreadable_snapshot_is_dropped() {
        let storage = Arc::new(MemoryStorage::default());
        storage.save(&storage_keys::last_good("duel-1"), "{not json");

        let mut session = SpectatorSession::new("duel-1", NameHints::default())
            .with_storage(storage.clone());
        assert!(session.restore().is_none());
        assert_eq!(storage.load(&storage_keys::last_good("duel-1")), None);
    }

    #[test]
    fn restored_hint_names_do_not_become_sticky() {
        let storage: Arc<dyn StorageProvider> = Arc::new(MemoryStorage::default());
        let hints = NameHints {
            player1: None,
            player2: Some("Hinted".into()),
        };

        let mut first =
            SpectatorSession::new("duel-1", hints.clone()).with_storage(Arc::clone(&storage));
        let view = first.absorb(&json!({"players": {"player1": {"name": "Nyx"}}}), None);
        assert_eq!(view.players.player2.name, "Hinted");

        let mut second = SpectatorSession::new("duel-1", NameHints::default()).with_storage(storage);
        let restored = second.restore().unwrap();
        assert_eq!(restored.players.player2.name, "Hinted");
        assert_eq!(second.names().sticky(PlayerSlot::Player1), Some("Nyx"));
        assert_eq!(second.names().sticky(PlayerSlot::Player2), None);

        let next = second.absorb(&json!({}), None);
        assert_eq!(next.players.player2.name, "Opponent");
    }

    #[test]
    fn unchanged_view_is_not_persisted_again() {
        let storage = Arc::new(MemoryStorage::default());
        let key = storage_keys::last_good("duel-1");
        let mut session = SpectatorSession::new("duel-1", NameHints::default())
            .with_storage(storage.clone());

        session.absorb(&json!({"spectatorCount": 2}), None);
        storage.remove(&key);
        session.absorb(&json!({"spectatorCount": 2}), None);
        assert_eq!(storage.load(&key), None);

        session.absorb(&json!({"spectatorCount": 3}), None);
        assert!(storage.load(&key).is_some());
    }

    #[test]
    fn only_the_watched_room_keeps_a_snapshot() {
        let storage = Arc::new(MemoryStorage::default());
        storage.save(&storage_keys::last_good("old-duel"), "{}");
        storage.save(storage_keys::VIEWER_ID, "viewer-1");

        let mut session = SpectatorSession::new("duel-1", NameHints::default())
            .with_storage(storage.clone());
        session.absorb(&json!({}), None);

        assert_eq!(storage.load(&storage_keys::last_good("old-duel")), None);
        assert!(storage.load(&storage_keys::last_good("duel-1")).is_some());
        assert_eq!(storage.load(storage_keys::VIEWER_ID).as_deref(), Some("viewer-1"));
    }
}
