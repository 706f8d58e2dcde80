//! Room Registry (spec.md §4.7): creates and destroys rooms, enforces
//! `max_active_rooms`/`max_memory_usage_gb`, and runs the eviction sweep.
//! Grounded on the teacher's `SessionManager`-style concurrent map
//! (`server/src/state.rs` pattern of a `DashMap<Id, Handle>` guarded by no
//! external lock) — room-id to room-task-handle lookups are lock-free here
//! for the same reason.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use debate_config::StrategyConfig;
use debate_core::{DebateRoom, DialogueType, Error, Result, RoomState, Side, Stage};
use tokio::sync::RwLock;

use crate::actor::{spawn_room, RoomHandle, RoomTimeouts};
use crate::api::{CreateRoomRequest, ParticipantSpec, Stats};
use crate::deps::Deps;
use crate::events::RoomEventBus;
use crate::turn_runner::generate_stance_statement;

/// Rough per-room memory estimate in bytes, used only for the
/// `max_memory_usage_gb` sweep (spec.md §4.7/§5). Not a precise accounting:
/// a fixed per-utterance cost times history length is good enough to decide
/// "are we over budget", which is all the sweep needs.
const ESTIMATED_BYTES_PER_UTTERANCE: u64 = 4096;
const ESTIMATED_BASE_BYTES_PER_ROOM: u64 = 8192;

pub struct Registry {
    rooms: DashMap<String, Arc<RoomHandle>>,
    deps: Deps,
    max_active_rooms: usize,
    max_memory_usage_bytes: u64,
    timeouts: RoomTimeouts,
    subscriber_buffer: usize,
    sweep: RwLock<()>,
    rooms_created: AtomicU64,
}

impl Registry {
    pub fn new(deps: Deps, max_active_rooms: usize, max_memory_usage_gb: f64, timeouts: RoomTimeouts, subscriber_buffer: usize) -> Arc<Self> {
        Arc::new(Registry {
            rooms: DashMap::new(),
            deps,
            max_active_rooms,
            max_memory_usage_bytes: (max_memory_usage_gb * 1024.0 * 1024.0 * 1024.0) as u64,
            timeouts,
            subscriber_buffer,
            sweep: RwLock::new(()),
            rooms_created: AtomicU64::new(0),
        })
    }

    /// `create(topic, participants, moderator_style)` (spec.md §4.7).
    pub async fn create(self: &Arc<Self>, request: CreateRoomRequest) -> Result<String> {
        if self.rooms.len() >= self.max_active_rooms {
            self.evict_one().await;
            if self.rooms.len() >= self.max_active_rooms {
                return Err(Error::CapExceeded(format!("max_active_rooms={}", self.max_active_rooms)));
            }
        }

        let room_id = uuid::Uuid::new_v4().to_string();
        let language = request.language.unwrap_or_else(|| "en".to_string());
        let max_rounds = request.max_rounds.unwrap_or(4);
        let moderator_profile_key = request.moderator_style_id.unwrap_or_else(|| "moderator_neutral".to_string());

        let participants = build_participants(&request.participants)?;
        validate_participants(&participants, &self.deps.strategies)?;

        let stance_pro =
            generate_stance_statement(&self.deps, &request.topic, &language, Side::Pro, self.timeouts.llm).await?;
        let stance_con =
            generate_stance_statement(&self.deps, &request.topic, &language, Side::Con, self.timeouts.llm).await?;

        let now = Utc::now();
        let room = DebateRoom {
            id: room_id.clone(),
            topic: request.topic,
            language,
            dialogue_type: DialogueType::Debate,
            stance_pro,
            stance_con,
            participants,
            moderator_profile_key,
            stage: Stage::ModeratorIntro,
            speaking_history: vec![],
            turn_cursor: 0,
            current_round: 0,
            max_rounds,
            summary_every_n_rounds: 2,
            interactive_rotation: vec![],
            pending_moderator_summary: false,
            awaiting_user: None,
            created_at: now,
            last_activity_at: now,
            ended_reason: None,
            state: RoomState::default(),
        };

        let events = Arc::new(RoomEventBus::new(self.subscriber_buffer));
        let preparer = Arc::new(debate_builder::OpeningPreparer::new());
        self.prefetch_openings(&room, &preparer);
        let handle = spawn_room(room, self.deps.clone(), preparer, events, self.timeouts, self.subscriber_buffer);
        self.rooms.insert(room_id.clone(), handle);
        self.rooms_created.fetch_add(1, Ordering::Relaxed);
        Ok(room_id)
    }

    /// Kicks off opening preparation for every participant concurrently,
    /// right at room creation, so the cache is warm well before the
    /// Scheduler reaches each one's opening turn (spec.md Scenario E1:
    /// "preparation started-at < turn started-at"). Best-effort: failures
    /// here are swallowed, since `get_prepared_or_generate` will simply
    /// re-run the pipeline (slower, but correct) when the turn arrives.
    fn prefetch_openings(&self, room: &DebateRoom, preparer: &Arc<debate_builder::OpeningPreparer>) {
        for participant in &room.participants {
            let Some(side) = participant.role.side() else { continue };
            let Some(profile) = self.deps.philosophers.get(&participant.profile_key).cloned() else { continue };
            let stance = match side {
                Side::Pro => room.stance_pro.clone(),
                Side::Con => room.stance_con.clone(),
            };
            let deps = self.deps.clone();
            let preparer = preparer.clone();
            let participant_id = participant.id.clone();
            let topic = room.topic.clone();
            let role = participant.role;
            let llm_timeout = self.timeouts.llm;
            let rag_timeout = self.timeouts.rag;
            tokio::spawn(async move {
                let _ = preparer
                    .get_prepared_or_generate(
                        deps.llm.as_ref(),
                        deps.rag.as_ref(),
                        &participant_id,
                        &topic,
                        &stance,
                        role,
                        &profile,
                        deps.models.opening_and_moderator,
                        llm_timeout,
                        rag_timeout,
                    )
                    .await;
            });
        }
    }

    /// `get(room-id)` (spec.md §4.7).
    pub fn get(&self, room_id: &str) -> Result<Arc<RoomHandle>> {
        self.rooms.get(room_id).map(|r| r.value().clone()).ok_or_else(|| Error::UnknownRoom(room_id.to_string()))
    }

    /// `end(room-id, reason)`, idempotent (spec.md §4.7).
    pub async fn end(&self, room_id: &str, reason: &str) -> Result<()> {
        let handle = self.get(room_id)?;
        handle.end(reason).await;
        self.rooms.remove(room_id);
        Ok(())
    }

    /// `stats()` → `{active_rooms, memory_estimate, rooms_by_stage}` (spec.md §4.7).
    pub fn stats(&self) -> Stats {
        let mut rooms_by_stage = std::collections::HashMap::new();
        let mut utterance_total: u64 = 0;
        for entry in self.rooms.iter() {
            let summary = entry.value().summary.read();
            *rooms_by_stage.entry(summary.metadata.stage.display_name().to_string()).or_insert(0u64) += 1;
            utterance_total += summary.utterance_count as u64;
        }
        let memory_estimate_bytes =
            self.rooms.len() as u64 * ESTIMATED_BASE_BYTES_PER_ROOM + utterance_total * ESTIMATED_BYTES_PER_UTTERANCE;
        Stats { active_rooms: self.rooms.len(), memory_estimate_bytes, rooms_by_stage }
    }

    /// Periodic sweep entry point (spec.md §5: `memory_check_interval`
    /// minutes). The caller (the server binary) is expected to invoke this
    /// on a `tokio::time::interval` tick.
    pub async fn run_memory_sweep(self: &Arc<Self>) {
        let _guard = self.sweep.write().await;
        while self.is_over_memory_budget() && !self.rooms.is_empty() {
            if !self.evict_one().await {
                break;
            }
        }
    }

    fn is_over_memory_budget(&self) -> bool {
        self.stats().memory_estimate_bytes > self.max_memory_usage_bytes
    }

    /// Evicts the least-recently-active eligible room (spec.md §4.7:
    /// "oldest `last_activity_at` that is not `awaiting_user` and whose
    /// stage != `interactive_argument` if possible; escalate ... only if
    /// the cap is still exceeded"). Returns whether a room was evicted.
    async fn evict_one(self: &Arc<Self>) -> bool {
        if let Some(id) = self.pick_eviction_candidate(true) {
            let _ = self.end(&id, "evicted").await;
            return true;
        }
        if let Some(id) = self.pick_eviction_candidate(false) {
            let _ = self.end(&id, "evicted").await;
            return true;
        }
        false
    }

    fn pick_eviction_candidate(&self, exclude_interactive: bool) -> Option<String> {
        self.rooms
            .iter()
            .filter_map(|entry| {
                let summary = entry.value().summary.read();
                if summary.awaiting_user {
                    return None;
                }
                if exclude_interactive && summary.metadata.stage == Stage::InteractiveArgument {
                    return None;
                }
                Some((entry.key().clone(), summary.metadata.last_activity_at))
            })
            .min_by_key(|(_, last_activity)| *last_activity)
            .map(|(id, _)| id)
    }
}

fn build_participants(specs: &[ParticipantSpec]) -> Result<Vec<debate_core::Participant>> {
    specs
        .iter()
        .map(|spec| {
            let role = match (spec.role.as_str(), spec.is_user) {
                ("pro", false) => debate_core::Role::Pro,
                ("con", false) => debate_core::Role::Con,
                ("pro", true) => debate_core::Role::UserPro,
                ("con", true) => debate_core::Role::UserCon,
                (other, _) => return Err(Error::ConfigInvalid(format!("unknown participant role '{other}'"))),
            };
            let capabilities =
                if spec.is_user { debate_core::Capabilities::user() } else { debate_core::Capabilities::philosopher() };
            let kind = if spec.is_user { debate_core::ParticipantKind::User } else { debate_core::ParticipantKind::Philosopher };
            Ok(debate_core::Participant {
                id: spec.id.clone(),
                kind,
                role,
                profile_key: spec.id.clone(),
                capabilities,
            })
        })
        .collect()
}

fn validate_participants(participants: &[debate_core::Participant], _strategies: &StrategyConfig) -> Result<()> {
    let has_pro = participants.iter().any(|p| p.role.side() == Some(Side::Pro));
    let has_con = participants.iter().any(|p| p.role.side() == Some(Side::Con));
    if !has_pro || !has_con {
        return Err(Error::ConfigInvalid("a debate room needs at least one pro and one con participant".to_string()));
    }
    Ok(())
}
