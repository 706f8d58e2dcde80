//! Persistence adapters for the Debate Orchestrator (spec.md §6.3).
//!
//! The core only ever talks to [`debate_core::PersistenceBackend`]; this
//! crate supplies the trait's default, dependency-free implementation.
//! Grounded on the teacher's `SessionStore` trait
//! (`server/src/session.rs`): a backend-agnostic trait with a concrete store
//! behind a lock, keyed by id, with idempotent writes.
//!
//! A production deployment would swap [`InMemoryPersistence`] for a real
//! database adapter behind the same [`debate_core::PersistenceBackend`]
//! trait; nothing in the core or the crates above it would change.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use debate_core::{DebateRoom, Error, Result, RoomMetadata, Utterance};
use parking_lot::RwLock;

/// In-memory [`debate_core::PersistenceBackend`]. Utterances are stored
/// per-room, deduplicated by id so `save_utterance` is idempotent
/// (spec.md §8: `save_utterance(save_utterance(x)) == save_utterance(x)`).
#[derive(Default)]
pub struct InMemoryPersistence {
    utterances: RwLock<HashMap<String, Vec<Utterance>>>,
    snapshots: RwLock<HashMap<String, DebateRoom>>,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Replaces (or inserts) the full room snapshot used by
    /// `load_room_snapshot`/`list_active_rooms`. Called by the Registry
    /// after state-mutating operations, mirroring how the teacher's
    /// `SessionManager` keeps its in-memory map authoritative.
    pub fn put_snapshot(&self, room: DebateRoom) {
        self.snapshots.write().insert(room.id.clone(), room);
    }

    pub fn remove_snapshot(&self, room_id: &str) {
        self.snapshots.write().remove(room_id);
        self.utterances.write().remove(room_id);
    }
}

#[async_trait]
impl debate_core::PersistenceBackend for InMemoryPersistence {
    async fn save_utterance(&self, room_id: &str, utterance: &Utterance) -> Result<()> {
        let mut utterances = self.utterances.write();
        let entry = utterances.entry(room_id.to_string()).or_default();
        if entry.iter().any(|u| u.id == utterance.id) {
            tracing::debug!(room_id, utterance_id = %utterance.id, "save_utterance idempotent no-op");
            return Ok(());
        }
        entry.push(utterance.clone());
        Ok(())
    }

    async fn load_room_snapshot(&self, room_id: &str) -> Result<Option<DebateRoom>> {
        Ok(self.snapshots.read().get(room_id).cloned())
    }

    async fn list_active_rooms(&self) -> Result<Vec<RoomMetadata>> {
        Ok(self
            .snapshots
            .read()
            .values()
            .filter(|r| !r.is_completed())
            .map(RoomMetadata::from)
            .collect())
    }
}

/// Thin wrapper surfacing persistence failures as `Error::Persistence`, the
/// way a real database adapter would map its own error type.
pub fn persistence_err(msg: impl Into<String>) -> Error {
    Error::Persistence(msg.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use debate_core::{PersistenceBackend, Role, UtteranceKind, UtteranceMetadata};

    fn utterance(id: &str) -> Utterance {
        Utterance {
            id: id.to_string(),
            room_id: "room-1".to_string(),
            speaker_id: "kant".to_string(),
            role: Role::Con,
            text: "text".to_string(),
            timestamp: Utc::now(),
            kind: UtteranceKind::Opening,
            metadata: UtteranceMetadata::default(),
        }
    }

    #[tokio::test]
    async fn save_utterance_is_idempotent_by_id() {
        let store = InMemoryPersistence::new();
        store.save_utterance("room-1", &utterance("u1")).await.unwrap();
        store.save_utterance("room-1", &utterance("u1")).await.unwrap();
        assert_eq!(store.utterances.read().get("room-1").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_snapshot_returns_none() {
        let store = InMemoryPersistence::new();
        assert!(store.load_room_snapshot("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_active_rooms_excludes_completed() {
        let store = InMemoryPersistence::new();
        let mut room = debate_core::DebateRoom {
            id: "room-1".into(),
            topic: "t".into(),
            language: "en".into(),
            dialogue_type: debate_core::DialogueType::Debate,
            stance_pro: "pro".into(),
            stance_con: "con".into(),
            participants: vec![],
            moderator_profile_key: "mod".into(),
            stage: debate_core::Stage::ModeratorIntro,
            speaking_history: vec![],
            turn_cursor: 0,
            current_round: 0,
            max_rounds: 4,
            summary_every_n_rounds: 2,
            interactive_rotation: vec![],
            pending_moderator_summary: false,
            awaiting_user: None,
            created_at: Utc::now(),
            last_activity_at: Utc::now(),
            ended_reason: None,
            state: Default::default(),
        };
        store.put_snapshot(room.clone());
        assert_eq!(store.list_active_rooms().await.unwrap().len(), 1);
        room.stage = debate_core::Stage::Completed;
        store.put_snapshot(room);
        assert_eq!(store.list_active_rooms().await.unwrap().len(), 0);
    }
}
