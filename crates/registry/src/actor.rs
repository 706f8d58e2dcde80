//! The per-room task (spec.md §5): the sole owner and mutator of one
//! [`DebateRoom`]. Commands arrive over an mpsc channel and are processed
//! one at a time, which is what gives the room its "single-threaded
//! cooperative" discipline — two commands for the same room are never
//! handled concurrently.
//!
//! `advance_turn` on a non-user turn is special: the room task computes and
//! replies with the [`TurnDescriptor`] synchronously (spec.md §6.5:
//! `advance_turn` returns `{started: TurnDescriptor}`), then keeps running
//! the LLM/RAG-calling generation itself and feeds the result back to its
//! own queue as a [`Command::TurnProduced`] message once done. This keeps
//! "the room task is the only mutator" true (spec.md §3) while letting
//! `advance_turn` return promptly instead of blocking the caller for up to
//! `llm_timeout`; see `DESIGN.md` for the write-up of this choice.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use debate_builder::OpeningPreparer;
use debate_core::{
    DebateRoom, Error, RagTimeoutPolicy, Result, RoomMetadata, Side, Stage, TurnDescriptor,
    Utterance, UtteranceKind,
};
use debate_scheduler::{append_utterance, begin_awaiting_user, expire_user_turn, next_turn, submit_user_message};
use tokio::sync::{mpsc, oneshot};

use crate::deps::Deps;
use crate::events::{RoomEvent, RoomEventBus};
use crate::turn_runner;

#[derive(Debug, Clone, Copy)]
pub struct RoomTimeouts {
    pub llm: Duration,
    pub rag: RagTimeoutPolicy,
    pub user_turn: Duration,
}

pub enum Command {
    AdvanceTurn { reply: oneshot::Sender<Result<TurnDescriptor>> },
    SubmitUserMessage { user_id: String, text: String, reply: oneshot::Sender<Result<()>> },
    GetSnapshot { reply: oneshot::Sender<DebateRoom> },
    EndRoom { reason: String, reply: oneshot::Sender<()> },
    /// Self-sent once a spawned generation finishes; never sent by a caller.
    TurnProduced { result: Result<Utterance> },
    /// Self-sent by a deadline timer armed in `begin_awaiting_user`.
    UserTurnExpired { speaker_id: String },
}

/// Cheap, eventually-consistent room summary the Registry reads for
/// `stats()` and eviction without going through the command queue
/// (spec.md §4.7). Updated by the actor after every mutation.
#[derive(Debug, Clone)]
pub struct RoomSummary {
    pub metadata: RoomMetadata,
    pub awaiting_user: bool,
    pub utterance_count: usize,
}

pub struct RoomHandle {
    pub id: String,
    pub tx: mpsc::Sender<Command>,
    pub events: Arc<RoomEventBus>,
    pub summary: Arc<parking_lot::RwLock<RoomSummary>>,
    in_flight: Arc<AtomicBool>,
}

impl RoomHandle {
    pub async fn advance_turn(&self) -> Result<TurnDescriptor> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::AdvanceTurn { reply })
            .await
            .map_err(|_| Error::UnknownRoom(self.id.clone()))?;
        rx.await.map_err(|_| Error::UnknownRoom(self.id.clone()))?
    }

    pub async fn submit_user_message(&self, user_id: &str, text: String) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::SubmitUserMessage { user_id: user_id.to_string(), text, reply })
            .await
            .map_err(|_| Error::UnknownRoom(self.id.clone()))?;
        rx.await.map_err(|_| Error::UnknownRoom(self.id.clone()))?
    }

    pub async fn snapshot(&self) -> Result<DebateRoom> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::GetSnapshot { reply })
            .await
            .map_err(|_| Error::UnknownRoom(self.id.clone()))?;
        rx.await.map_err(|_| Error::UnknownRoom(self.id.clone()))
    }

    pub async fn end(&self, reason: &str) {
        let (reply, rx) = oneshot::channel();
        if self.tx.send(Command::EndRoom { reason: reason.to_string(), reply }).await.is_ok() {
            let _ = rx.await;
        }
    }

    /// Whether a non-user turn's generation is currently running. Exposed
    /// for tests and for diagnostics; `advance_turn` itself relies on the
    /// actor's own (non-shared) check to decide `BUSY`.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }
}

struct RoomActor {
    room: DebateRoom,
    deps: Deps,
    preparer: Arc<OpeningPreparer>,
    events: Arc<RoomEventBus>,
    timeouts: RoomTimeouts,
    summary: Arc<parking_lot::RwLock<RoomSummary>>,
    in_flight: Arc<AtomicBool>,
    self_tx: mpsc::Sender<Command>,
}

/// Spawns a room's actor task and returns the handle the Registry stores.
/// `preparer` is shared in so opening preparation kicked off at room
/// creation (before the actor exists) lands in the same cache the actor
/// reads from on the opening turn.
pub fn spawn_room(
    room: DebateRoom,
    deps: Deps,
    preparer: Arc<OpeningPreparer>,
    events: Arc<RoomEventBus>,
    timeouts: RoomTimeouts,
    buffer: usize,
) -> Arc<RoomHandle> {
    let (tx, rx) = mpsc::channel(buffer.max(16));
    let summary = Arc::new(parking_lot::RwLock::new(RoomSummary {
        metadata: RoomMetadata::from(&room),
        awaiting_user: room.awaiting_user.is_some(),
        utterance_count: room.speaking_history.len(),
    }));
    let in_flight = Arc::new(AtomicBool::new(false));
    let id = room.id.clone();

    let actor = RoomActor {
        room,
        deps,
        preparer,
        events: events.clone(),
        timeouts,
        summary: summary.clone(),
        in_flight: in_flight.clone(),
        self_tx: tx.clone(),
    };
    tokio::spawn(actor.run(rx));

    Arc::new(RoomHandle { id, tx, events, summary, in_flight })
}

impl RoomActor {
    async fn run(mut self, mut rx: mpsc::Receiver<Command>) {
        while let Some(cmd) = rx.recv().await {
            match cmd {
                Command::AdvanceTurn { reply } => self.handle_advance_turn(reply),
                Command::SubmitUserMessage { user_id, text, reply } => {
                    let result = self.handle_submit(&user_id, text).await;
                    let _ = reply.send(result);
                }
                Command::GetSnapshot { reply } => {
                    let _ = reply.send(self.room.clone());
                }
                Command::EndRoom { reason, reply } => {
                    self.handle_end(reason);
                    let _ = reply.send(());
                }
                Command::TurnProduced { result } => self.handle_turn_produced(result).await,
                Command::UserTurnExpired { speaker_id } => self.handle_user_turn_expired(speaker_id).await,
            }
        }
    }

    fn sync_summary(&self) {
        *self.summary.write() = RoomSummary {
            metadata: RoomMetadata::from(&self.room),
            awaiting_user: self.room.awaiting_user.is_some(),
            utterance_count: self.room.speaking_history.len(),
        };
    }

    fn publish(&self, event: RoomEvent) {
        self.events.publish(event);
    }

    fn handle_advance_turn(&mut self, reply: oneshot::Sender<Result<TurnDescriptor>>) {
        if self.in_flight.load(Ordering::Acquire) {
            let _ = reply.send(Err(Error::Busy(self.room.id.clone())));
            return;
        }
        let descriptor = match next_turn(&self.room, self.timeouts.llm, self.timeouts.user_turn) {
            Ok(d) => d,
            Err(err) => {
                let _ = reply.send(Err(err));
                return;
            }
        };

        if descriptor.is_user {
            begin_awaiting_user(&mut self.room, &descriptor);
            self.sync_summary();
            self.arm_user_turn_timeout(descriptor.speaker_id.clone(), descriptor.deadline);
            self.publish(RoomEvent::TurnStarted {
                speaker_id: descriptor.speaker_id.clone(),
                kind: descriptor.kind_hint,
                is_user: true,
            });
            let _ = reply.send(Ok(descriptor));
            return;
        }

        self.in_flight.store(true, Ordering::Release);
        self.publish(RoomEvent::TurnStarted {
            speaker_id: descriptor.speaker_id.clone(),
            kind: descriptor.kind_hint,
            is_user: false,
        });
        self.publish(RoomEvent::Thinking { speaker_id: descriptor.speaker_id.clone() });
        let _ = reply.send(Ok(descriptor.clone()));

        let deps = self.deps.clone();
        let preparer = self.preparer.clone();
        let room_snapshot = self.room.clone();
        let timeouts = self.timeouts;
        let self_tx = self.self_tx.clone();
        tokio::spawn(async move {
            let result = generate_utterance(&deps, &preparer, &room_snapshot, &descriptor, timeouts).await;
            let _ = self_tx.send(Command::TurnProduced { result }).await;
        });
    }

    async fn handle_turn_produced(&mut self, result: Result<Utterance>) {
        self.in_flight.store(false, Ordering::Release);
        let utterance = match result {
            Ok(u) => u,
            Err(err) => {
                tracing::error!(room_id = %self.room.id, error = %err, "turn generation failed with no fallback");
                return;
            }
        };
        self.finish_turn(utterance).await;
    }

    async fn finish_turn(&mut self, utterance: Utterance) {
        let speaker_id = utterance.speaker_id.clone();
        let from_stage = self.room.stage;

        if let Err(err) = turn_runner::analyze_for_targeting(&self.deps, &mut self.room, &utterance, self.timeouts.llm).await {
            tracing::warn!(room_id = %self.room.id, error = %err, "argument analysis failed; targeting degrades gracefully");
        }

        if let Err(err) = append_utterance(&mut self.room, utterance.clone()) {
            tracing::error!(room_id = %self.room.id, error = %err, "append_utterance rejected a generated turn");
            return;
        }
        if let Err(err) = self.deps.persistence.save_utterance(&self.room.id, &utterance).await {
            tracing::warn!(room_id = %self.room.id, error = %err, "persistence save_utterance failed");
        }

        self.sync_summary();
        self.publish(RoomEvent::NewMessage { utterance });
        if self.room.stage != from_stage {
            self.publish(RoomEvent::StageChanged { from: from_stage, to: self.room.stage });
        }
        if self.room.is_completed() {
            self.room.ended_reason.get_or_insert_with(|| "debate_complete".to_string());
            self.publish(RoomEvent::RoomEnded { reason: "debate_complete".to_string() });
        }
        let _ = speaker_id;
    }

    async fn handle_submit(&mut self, user_id: &str, text: String) -> Result<()> {
        let utterance = submit_user_message(&self.room, user_id, text)?;
        let from_stage = self.room.stage;

        if let Err(err) = turn_runner::analyze_for_targeting(&self.deps, &mut self.room, &utterance, self.timeouts.llm).await {
            tracing::warn!(room_id = %self.room.id, error = %err, "argument analysis failed for user input");
        }

        append_utterance(&mut self.room, utterance.clone())?;
        if let Err(err) = self.deps.persistence.save_utterance(&self.room.id, &utterance).await {
            tracing::warn!(room_id = %self.room.id, error = %err, "persistence save_utterance failed");
        }
        self.sync_summary();
        self.publish(RoomEvent::NewMessage { utterance });
        if self.room.stage != from_stage {
            self.publish(RoomEvent::StageChanged { from: from_stage, to: self.room.stage });
        }
        Ok(())
    }

    fn handle_end(&mut self, reason: String) {
        if self.room.is_completed() {
            return;
        }
        let from_stage = self.room.stage;
        self.room.stage = Stage::Completed;
        self.room.ended_reason = Some(reason.clone());
        self.room.awaiting_user = None;
        self.sync_summary();
        self.publish(RoomEvent::StageChanged { from: from_stage, to: Stage::Completed });
        self.publish(RoomEvent::RoomEnded { reason });
    }

    fn arm_user_turn_timeout(&self, speaker_id: String, deadline: chrono::DateTime<Utc>) {
        let self_tx = self.self_tx.clone();
        let wait = (deadline - Utc::now()).to_std().unwrap_or(Duration::from_secs(0));
        tokio::spawn(async move {
            tokio::time::sleep(wait).await;
            let _ = self_tx.send(Command::UserTurnExpired { speaker_id }).await;
        });
    }

    async fn handle_user_turn_expired(&mut self, speaker_id: String) {
        let still_awaiting = self.room.awaiting_user.as_ref().is_some_and(|a| a.speaker_id == speaker_id);
        if !still_awaiting {
            return;
        }
        let Some(utterance) = expire_user_turn(&self.room, Utc::now()) else { return };
        self.finish_turn(utterance).await;
    }
}

async fn generate_utterance(
    deps: &Deps,
    preparer: &OpeningPreparer,
    room: &DebateRoom,
    descriptor: &TurnDescriptor,
    timeouts: RoomTimeouts,
) -> Result<Utterance> {
    let participant = room
        .participant(&descriptor.speaker_id)
        .ok_or_else(|| Error::UnknownRoom(descriptor.speaker_id.clone()))?;

    match descriptor.kind_hint {
        UtteranceKind::Opening => {
            let profile = deps
                .philosophers
                .get(&participant.profile_key)
                .ok_or_else(|| Error::ConfigInvalid(format!("no philosopher profile for key '{}'", participant.profile_key)))?;
            let stance_statement = match participant.role.side() {
                Some(Side::Pro) => room.stance_pro.as_str(),
                _ => room.stance_con.as_str(),
            };
            let prepared = preparer
                .get_prepared_or_generate(
                    deps.llm.as_ref(),
                    deps.rag.as_ref(),
                    &descriptor.speaker_id,
                    &room.topic,
                    stance_statement,
                    participant.role,
                    profile,
                    deps.models.opening_and_moderator,
                    timeouts.llm,
                    timeouts.rag,
                )
                .await?;
            Ok(Utterance {
                id: uuid::Uuid::new_v4().to_string(),
                room_id: room.id.clone(),
                speaker_id: descriptor.speaker_id.clone(),
                role: participant.role,
                text: prepared.text,
                timestamp: Utc::now(),
                kind: UtteranceKind::Opening,
                metadata: prepared.metadata,
            })
        }
        UtteranceKind::Attack | UtteranceKind::Defense | UtteranceKind::Followup => {
            let side = participant.role.side().ok_or_else(|| Error::UnknownRoom(descriptor.speaker_id.clone()))?;
            turn_runner::run_interactive_turn(
                deps,
                room,
                &descriptor.speaker_id,
                side,
                descriptor.kind_hint,
                timeouts.llm,
                timeouts.rag,
            )
            .await
        }
        UtteranceKind::Conclusion => {
            turn_runner::run_conclusion_turn(deps, room, &descriptor.speaker_id, timeouts.llm).await
        }
        UtteranceKind::ModeratorIntro | UtteranceKind::ModeratorSummary | UtteranceKind::ModeratorConclusion => {
            turn_runner::run_moderator_turn(deps, room, descriptor.kind_hint, timeouts.llm).await
        }
        UtteranceKind::UserInput => unreachable!("user turns never reach generate_utterance"),
    }
}
