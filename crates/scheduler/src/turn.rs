//! `next_turn` (spec.md §4.6): the next eligible speaker per the current
//! stage's rotation, with `is_user`/`kind_hint`/`deadline` attached.

use std::time::Duration;

use chrono::Utc;
use debate_core::{DebateRoom, Error, Result, Stage, TurnDescriptor, UtteranceKind};

use crate::kind::determine_interactive_kind;
use crate::rotation::eligible_for_stage;

const MODERATOR_ID: &str = "moderator";

fn descriptor(room: &DebateRoom, speaker_id: String, kind: UtteranceKind, timeout: Duration) -> TurnDescriptor {
    let is_user = room.participant(&speaker_id).map(|p| p.role.is_user()).unwrap_or(false);
    TurnDescriptor {
        stage: room.stage,
        speaker_id,
        is_user,
        kind_hint: kind,
        deadline: Utc::now() + chrono::Duration::from_std(timeout).unwrap_or(chrono::Duration::seconds(30)),
    }
}

/// Computes the next [`TurnDescriptor`] for `room` without mutating it.
/// `llm_timeout`/`user_turn_timeout` come from configuration (spec.md §5)
/// and are passed in rather than read from a config dependency, keeping
/// this crate I/O- and config-free.
pub fn next_turn(room: &DebateRoom, llm_timeout: Duration, user_turn_timeout: Duration) -> Result<TurnDescriptor> {
    if room.is_completed() {
        return Err(Error::RoomEnded(room.id.clone()));
    }
    if let Some(awaiting) = &room.awaiting_user {
        return Err(Error::AwaitingUser(room.id.clone(), awaiting.speaker_id.clone()));
    }

    match room.stage {
        Stage::ModeratorIntro => {
            Ok(descriptor(room, MODERATOR_ID.to_string(), UtteranceKind::ModeratorIntro, llm_timeout))
        }
        Stage::ProOpening | Stage::ConOpening => {
            let eligible = eligible_for_stage(room, room.stage);
            let speaker_id = eligible
                .get(room.turn_cursor)
                .cloned()
                .ok_or_else(|| Error::Busy(room.id.clone()))?;
            let timeout =
                if room.participant(&speaker_id).map(|p| p.role.is_user()).unwrap_or(false) {
                    user_turn_timeout
                } else {
                    llm_timeout
                };
            Ok(descriptor(room, speaker_id, UtteranceKind::Opening, timeout))
        }
        Stage::InteractiveArgument => {
            if room.pending_moderator_summary {
                return Ok(descriptor(
                    room,
                    MODERATOR_ID.to_string(),
                    UtteranceKind::ModeratorSummary,
                    llm_timeout,
                ));
            }
            let speaker_id = room
                .interactive_rotation
                .get(room.turn_cursor)
                .cloned()
                .ok_or_else(|| Error::Busy(room.id.clone()))?;
            let side = room
                .participant(&speaker_id)
                .map(|p| p.role.side())
                .ok_or_else(|| Error::UnknownRoom(speaker_id.clone()))?;
            let kind = determine_interactive_kind(room, side);
            let timeout =
                if room.participant(&speaker_id).map(|p| p.role.is_user()).unwrap_or(false) {
                    user_turn_timeout
                } else {
                    llm_timeout
                };
            Ok(descriptor(room, speaker_id, kind, timeout))
        }
        Stage::ProConclusion | Stage::ConConclusion => {
            let eligible = eligible_for_stage(room, room.stage);
            let speaker_id = eligible
                .get(room.turn_cursor)
                .cloned()
                .ok_or_else(|| Error::Busy(room.id.clone()))?;
            let timeout =
                if room.participant(&speaker_id).map(|p| p.role.is_user()).unwrap_or(false) {
                    user_turn_timeout
                } else {
                    llm_timeout
                };
            Ok(descriptor(room, speaker_id, UtteranceKind::Conclusion, timeout))
        }
        Stage::ModeratorClosing => {
            Ok(descriptor(room, MODERATOR_ID.to_string(), UtteranceKind::ModeratorConclusion, llm_timeout))
        }
        Stage::Completed => unreachable!("handled by the is_completed check above"),
    }
}
