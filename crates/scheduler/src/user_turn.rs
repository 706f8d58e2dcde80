//! User-turn lifecycle (spec.md §4.6): a room whose next speaker is a human
//! participant parks in `awaiting_user` until that participant submits text
//! or the user-turn timeout elapses.

use chrono::{DateTime, Utc};
use debate_core::{DebateRoom, Error, Result, TurnDescriptor, Utterance, UtteranceKind, UtteranceMetadata};

/// Parks `room` on `descriptor`'s speaker when that speaker is a human.
/// Called by the room task right after `next_turn` resolves to a user turn,
/// before it starts waiting on a client message (spec.md §6.5).
pub fn begin_awaiting_user(room: &mut DebateRoom, descriptor: &TurnDescriptor) {
    if !descriptor.is_user {
        return;
    }
    room.awaiting_user = Some(debate_core::AwaitingUser {
        speaker_id: descriptor.speaker_id.clone(),
        since: Utc::now(),
        kind_hint: descriptor.kind_hint,
        deadline: descriptor.deadline,
    });
}

/// Builds the [`Utterance`] for a user-submitted message. Does not append it
/// to the room; callers run it through analysis/persistence first, then
/// call [`crate::append_utterance`].
pub fn submit_user_message(room: &DebateRoom, speaker_id: &str, text: String) -> Result<Utterance> {
    if room.is_completed() {
        return Err(Error::RoomEnded(room.id.clone()));
    }
    let awaiting = room.awaiting_user.as_ref().ok_or_else(|| Error::NotYourTurn(speaker_id.to_string()))?;
    if awaiting.speaker_id != speaker_id {
        return Err(Error::NotYourTurn(speaker_id.to_string()));
    }
    let role = room
        .participant(speaker_id)
        .map(|p| p.role)
        .ok_or_else(|| Error::UnknownRoom(speaker_id.to_string()))?;

    Ok(Utterance {
        id: uuid::Uuid::new_v4().to_string(),
        room_id: room.id.clone(),
        speaker_id: speaker_id.to_string(),
        role,
        text,
        timestamp: Utc::now(),
        kind: UtteranceKind::UserInput,
        metadata: UtteranceMetadata::default(),
    })
}

/// If the awaited user has missed their deadline as of `now`, builds the
/// deterministic fallback utterance that stands in for their turn (spec.md
/// §4.6 user-turn timeout), mirroring the Builder's LLM-timeout fallback
/// (`debate-builder`'s `build_utterance`). Returns `None` if no one is
/// awaited or the deadline has not yet passed.
pub fn expire_user_turn(room: &DebateRoom, now: DateTime<Utc>) -> Option<Utterance> {
    let awaiting = room.awaiting_user.as_ref()?;
    if now < awaiting.deadline {
        return None;
    }
    let role = room.participant(&awaiting.speaker_id)?.role;
    let mut metadata = UtteranceMetadata::default();
    metadata.fallback = true;

    Some(Utterance {
        id: uuid::Uuid::new_v4().to_string(),
        room_id: room.id.clone(),
        speaker_id: awaiting.speaker_id.clone(),
        role,
        text: format!("{} yields the turn", awaiting.speaker_id),
        timestamp: now,
        kind: UtteranceKind::UserInput,
        metadata,
    })
}
