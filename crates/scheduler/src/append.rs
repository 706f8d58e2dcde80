//! Appending an utterance and advancing stage/cursor/round state (spec.md
//! §4.6). This is the only place `DebateRoom.stage`/`turn_cursor`/
//! `current_round`/`interactive_rotation` change.

use debate_core::{ArgumentStatus, DebateRoom, Error, Result, Stage, UtteranceKind};
use debate_strategy::record_attack;

use crate::rotation::{build_interactive_rotation, eligible_for_stage};

fn mark_target_attacked(room: &mut DebateRoom, target_id: &str) {
    for args in room.state.per_speaker_arguments.values_mut() {
        for arg in args.iter_mut() {
            if arg.id == target_id {
                arg.status = ArgumentStatus::Attacked;
            }
        }
    }
}

/// Appends `utterance` to `room.speaking_history` and advances the stage
/// machine. A room in `Completed` never mutates (spec.md §3 invariant).
pub fn append_utterance(room: &mut DebateRoom, utterance: debate_core::Utterance) -> Result<()> {
    if room.is_completed() {
        return Err(Error::RoomEnded(room.id.clone()));
    }

    let kind = utterance.kind;

    if kind == UtteranceKind::Attack {
        if let (Some(strategy_id), Some(target_id)) =
            (utterance.metadata.strategy_id.clone(), utterance.metadata.target_argument_id.clone())
        {
            record_attack(&mut room.state, &utterance.speaker_id, &target_id, strategy_id);
            mark_target_attacked(room, &target_id);
        }
    }

    room.last_activity_at = utterance.timestamp;
    let speaker_id = utterance.speaker_id.clone();
    room.speaking_history.push(utterance);

    if room.awaiting_user.as_ref().is_some_and(|a| a.speaker_id == speaker_id) {
        room.awaiting_user = None;
    }

    advance(room, kind);
    Ok(())
}

fn advance(room: &mut DebateRoom, kind: UtteranceKind) {
    match room.stage {
        Stage::ModeratorIntro => {
            room.stage = Stage::ProOpening;
            room.turn_cursor = 0;
        }
        Stage::ProOpening => {
            room.turn_cursor += 1;
            if room.turn_cursor >= eligible_for_stage(room, Stage::ProOpening).len() {
                room.stage = Stage::ConOpening;
                room.turn_cursor = 0;
            }
        }
        Stage::ConOpening => {
            room.turn_cursor += 1;
            if room.turn_cursor >= eligible_for_stage(room, Stage::ConOpening).len() {
                room.turn_cursor = 0;
                if room.max_rounds == 0 {
                    room.stage = Stage::ProConclusion;
                } else {
                    room.interactive_rotation = build_interactive_rotation(room);
                    room.current_round = 1;
                    room.stage = Stage::InteractiveArgument;
                }
            }
        }
        Stage::InteractiveArgument => advance_interactive(room, kind),
        Stage::ProConclusion => {
            room.turn_cursor += 1;
            if room.turn_cursor >= eligible_for_stage(room, Stage::ProConclusion).len() {
                room.stage = Stage::ConConclusion;
                room.turn_cursor = 0;
            }
        }
        Stage::ConConclusion => {
            room.turn_cursor += 1;
            if room.turn_cursor >= eligible_for_stage(room, Stage::ConConclusion).len() {
                room.stage = Stage::ModeratorClosing;
                room.turn_cursor = 0;
            }
        }
        Stage::ModeratorClosing => {
            room.stage = Stage::Completed;
        }
        Stage::Completed => {}
    }
}

fn advance_interactive(room: &mut DebateRoom, kind: UtteranceKind) {
    if kind == UtteranceKind::ModeratorSummary {
        room.pending_moderator_summary = false;
        return;
    }

    room.turn_cursor += 1;
    if room.turn_cursor < room.interactive_rotation.len() {
        return;
    }

    room.turn_cursor = 0;
    let completed_round = room.current_round;
    if completed_round >= room.max_rounds {
        room.stage = Stage::ProConclusion;
        return;
    }

    room.current_round += 1;
    if room.summary_every_n_rounds > 0 && completed_round % room.summary_every_n_rounds == 0 {
        room.pending_moderator_summary = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use debate_core::{
        Capabilities, DialogueType, Participant, ParticipantKind, Role, RoomState, Utterance,
        UtteranceMetadata,
    };

    fn room(stage: Stage, max_rounds: u32) -> DebateRoom {
        DebateRoom {
            id: "r1".into(),
            topic: "t".into(),
            language: "en".into(),
            dialogue_type: DialogueType::Debate,
            stance_pro: "pro".into(),
            stance_con: "con".into(),
            participants: vec![
                Participant {
                    id: "nietzsche".into(),
                    kind: ParticipantKind::Philosopher,
                    role: Role::Pro,
                    profile_key: "nietzsche".into(),
                    capabilities: Capabilities::philosopher(),
                },
                Participant {
                    id: "kant".into(),
                    kind: ParticipantKind::Philosopher,
                    role: Role::Con,
                    profile_key: "kant".into(),
                    capabilities: Capabilities::philosopher(),
                },
            ],
            moderator_profile_key: "mod".into(),
            stage,
            speaking_history: vec![],
            turn_cursor: 0,
            current_round: 0,
            max_rounds,
            summary_every_n_rounds: 2,
            interactive_rotation: vec![],
            pending_moderator_summary: false,
            awaiting_user: None,
            created_at: Utc::now(),
            last_activity_at: Utc::now(),
            ended_reason: None,
            state: RoomState::default(),
        }
    }

    fn utterance(speaker: &str, role: Role, kind: UtteranceKind) -> Utterance {
        Utterance {
            id: uuid::Uuid::new_v4().to_string(),
            room_id: "r1".into(),
            speaker_id: speaker.into(),
            role,
            text: "t".into(),
            timestamp: Utc::now(),
            kind,
            metadata: UtteranceMetadata::default(),
        }
    }

    #[test]
    fn moderator_intro_advances_to_pro_opening() {
        let mut room = room(Stage::ModeratorIntro, 4);
        append_utterance(&mut room, utterance("moderator", Role::Pro, UtteranceKind::ModeratorIntro)).unwrap();
        assert_eq!(room.stage, Stage::ProOpening);
        assert_eq!(room.turn_cursor, 0);
    }

    #[test]
    fn opening_transitions_after_sole_eligible_speaker() {
        let mut room = room(Stage::ProOpening, 4);
        append_utterance(&mut room, utterance("nietzsche", Role::Pro, UtteranceKind::Opening)).unwrap();
        assert_eq!(room.stage, Stage::ConOpening);
    }

    #[test]
    fn con_opening_enters_interactive_argument_and_builds_rotation() {
        let mut room = room(Stage::ConOpening, 4);
        append_utterance(&mut room, utterance("kant", Role::Con, UtteranceKind::Opening)).unwrap();
        assert_eq!(room.stage, Stage::InteractiveArgument);
        assert_eq!(room.current_round, 1);
        assert_eq!(room.interactive_rotation, vec!["nietzsche", "kant"]);
    }

    #[test]
    fn max_rounds_zero_skips_interactive_argument() {
        let mut room = room(Stage::ConOpening, 0);
        append_utterance(&mut room, utterance("kant", Role::Con, UtteranceKind::Opening)).unwrap();
        assert_eq!(room.stage, Stage::ProConclusion);
    }

    #[test]
    fn interactive_round_completes_and_schedules_summary() {
        let mut room = room(Stage::InteractiveArgument, 4);
        room.current_round = 1;
        room.interactive_rotation = vec!["nietzsche".into(), "kant".into()];
        append_utterance(&mut room, utterance("nietzsche", Role::Pro, UtteranceKind::Attack)).unwrap();
        assert_eq!(room.turn_cursor, 1);
        append_utterance(&mut room, utterance("kant", Role::Con, UtteranceKind::Defense)).unwrap();
        assert_eq!(room.turn_cursor, 0);
        assert_eq!(room.current_round, 2);
        assert!(!room.pending_moderator_summary, "round 1 is not a multiple of 2");

        append_utterance(&mut room, utterance("nietzsche", Role::Pro, UtteranceKind::Followup)).unwrap();
        append_utterance(&mut room, utterance("kant", Role::Con, UtteranceKind::Defense)).unwrap();
        assert_eq!(room.current_round, 3);
        assert!(room.pending_moderator_summary, "round 2 is a multiple of summary_every_n_rounds");
    }

    #[test]
    fn moderator_summary_clears_flag_without_touching_cursor() {
        let mut room = room(Stage::InteractiveArgument, 4);
        room.current_round = 3;
        room.pending_moderator_summary = true;
        room.interactive_rotation = vec!["nietzsche".into(), "kant".into()];
        append_utterance(&mut room, utterance("moderator", Role::Pro, UtteranceKind::ModeratorSummary)).unwrap();
        assert!(!room.pending_moderator_summary);
        assert_eq!(room.turn_cursor, 0);
        assert_eq!(room.current_round, 3);
    }

    #[test]
    fn final_round_transitions_to_pro_conclusion() {
        let mut room = room(Stage::InteractiveArgument, 1);
        room.current_round = 1;
        room.interactive_rotation = vec!["nietzsche".into(), "kant".into()];
        append_utterance(&mut room, utterance("nietzsche", Role::Pro, UtteranceKind::Attack)).unwrap();
        append_utterance(&mut room, utterance("kant", Role::Con, UtteranceKind::Defense)).unwrap();
        assert_eq!(room.stage, Stage::ProConclusion);
    }

    #[test]
    fn completed_room_rejects_append() {
        let mut room = room(Stage::Completed, 4);
        let err = append_utterance(&mut room, utterance("moderator", Role::Pro, UtteranceKind::ModeratorConclusion))
            .unwrap_err();
        assert_eq!(err.kind(), "ROOM_ENDED");
    }

    #[test]
    fn attack_marks_target_attacked_and_records_blocklist() {
        let mut room = room(Stage::InteractiveArgument, 4);
        room.current_round = 1;
        room.interactive_rotation = vec!["nietzsche".into(), "kant".into()];
        room.state.per_speaker_arguments.insert(
            "kant".into(),
            vec![debate_core::Argument {
                id: "arg-1".into(),
                speaker_id: "kant".into(),
                source_utterance_id: "u0".into(),
                claim: "c".into(),
                premises: vec![],
                evidence: vec![],
                vulnerability_score: 0.5,
                per_axis_vulnerability: debate_core::AxisVector::ZERO,
                status: ArgumentStatus::Scored,
            }],
        );
        let mut u = utterance("nietzsche", Role::Pro, UtteranceKind::Attack);
        u.metadata.strategy_id = Some("Framing_Shift".into());
        u.metadata.target_argument_id = Some("arg-1".into());
        append_utterance(&mut room, u).unwrap();

        let arg = &room.state.per_speaker_arguments["kant"][0];
        assert_eq!(arg.status, ArgumentStatus::Attacked);
        let recent = debate_strategy::recent_against(&room.state, "nietzsche", "arg-1");
        assert_eq!(recent, vec!["Framing_Shift".to_string()]);
    }
}
