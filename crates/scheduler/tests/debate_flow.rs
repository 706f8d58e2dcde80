//! End-to-end run of a small debate room through the Turn Scheduler: from
//! `ModeratorIntro` to `Completed`, driving `next_turn`/`append_utterance`
//! directly the way the room task in `debate-registry` does.

use std::time::Duration;

use chrono::Utc;
use debate_core::{
    Capabilities, DebateRoom, DialogueType, Participant, ParticipantKind, Role, RoomState, Stage,
    Utterance, UtteranceKind, UtteranceMetadata,
};
use debate_scheduler::{append_utterance, next_turn};

fn two_philosopher_room(max_rounds: u32) -> DebateRoom {
    DebateRoom {
        id: "room-1".into(),
        topic: "Is free will compatible with determinism?".into(),
        language: "en".into(),
        dialogue_type: DialogueType::Debate,
        stance_pro: "Free will is compatible with determinism".into(),
        stance_con: "Free will is not compatible with determinism".into(),
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
        moderator_profile_key: "moderator".into(),
        stage: Stage::ModeratorIntro,
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

fn speak(room: &DebateRoom, speaker_id: &str, kind: UtteranceKind) -> Utterance {
    let role = room.participant(speaker_id).map(|p| p.role).unwrap_or(Role::Pro);
    Utterance {
        id: uuid::Uuid::new_v4().to_string(),
        room_id: room.id.clone(),
        speaker_id: speaker_id.to_string(),
        role,
        text: format!("{speaker_id} speaks"),
        timestamp: Utc::now(),
        kind,
        metadata: UtteranceMetadata::default(),
    }
}

const LLM_TIMEOUT: Duration = Duration::from_secs(30);
const USER_TURN_TIMEOUT: Duration = Duration::from_secs(180);

#[test]
fn full_debate_runs_moderator_intro_through_completed() {
    let mut room = two_philosopher_room(4);

    // moderator_intro
    let turn = next_turn(&room, LLM_TIMEOUT, USER_TURN_TIMEOUT).unwrap();
    assert_eq!(turn.speaker_id, "moderator");
    append_utterance(&mut room, speak(&room, "moderator", turn.kind_hint)).unwrap();
    assert_eq!(room.stage, Stage::ProOpening);

    // pro_opening
    let turn = next_turn(&room, LLM_TIMEOUT, USER_TURN_TIMEOUT).unwrap();
    assert_eq!(turn.speaker_id, "nietzsche");
    assert_eq!(turn.kind_hint, UtteranceKind::Opening);
    append_utterance(&mut room, speak(&room, "nietzsche", turn.kind_hint)).unwrap();
    assert_eq!(room.stage, Stage::ConOpening);

    // con_opening -> enters interactive_argument with the rotation built
    let turn = next_turn(&room, LLM_TIMEOUT, USER_TURN_TIMEOUT).unwrap();
    assert_eq!(turn.speaker_id, "kant");
    append_utterance(&mut room, speak(&room, "kant", turn.kind_hint)).unwrap();
    assert_eq!(room.stage, Stage::InteractiveArgument);
    assert_eq!(room.interactive_rotation, vec!["nietzsche", "kant"]);
    assert_eq!(room.current_round, 1);

    // round 1: nietzsche attacks, kant defends
    let turn = next_turn(&room, LLM_TIMEOUT, USER_TURN_TIMEOUT).unwrap();
    assert_eq!(turn.speaker_id, "nietzsche");
    assert_eq!(turn.kind_hint, UtteranceKind::Attack);
    append_utterance(&mut room, speak(&room, "nietzsche", turn.kind_hint)).unwrap();

    let turn = next_turn(&room, LLM_TIMEOUT, USER_TURN_TIMEOUT).unwrap();
    assert_eq!(turn.speaker_id, "kant");
    assert_eq!(turn.kind_hint, UtteranceKind::Defense);
    append_utterance(&mut room, speak(&room, "kant", turn.kind_hint)).unwrap();
    assert_eq!(room.current_round, 2);
    assert!(!room.pending_moderator_summary);

    // round 2 completes on a summary_every_n_rounds boundary
    let turn = next_turn(&room, LLM_TIMEOUT, USER_TURN_TIMEOUT).unwrap();
    assert_eq!(turn.kind_hint, UtteranceKind::Followup);
    append_utterance(&mut room, speak(&room, "nietzsche", turn.kind_hint)).unwrap();

    let turn = next_turn(&room, LLM_TIMEOUT, USER_TURN_TIMEOUT).unwrap();
    assert_eq!(turn.kind_hint, UtteranceKind::Defense);
    append_utterance(&mut room, speak(&room, "kant", turn.kind_hint)).unwrap();
    assert!(room.pending_moderator_summary, "round 2 of 4 hits the summary boundary");
    assert_eq!(room.current_round, 3);

    // moderator summary must be delivered before the room can advance further
    let turn = next_turn(&room, LLM_TIMEOUT, USER_TURN_TIMEOUT).unwrap();
    assert_eq!(turn.speaker_id, "moderator");
    assert_eq!(turn.kind_hint, UtteranceKind::ModeratorSummary);
    append_utterance(&mut room, speak(&room, "moderator", turn.kind_hint)).unwrap();
    assert_eq!(room.stage, Stage::InteractiveArgument, "summary does not itself end the round loop");
    assert!(!room.pending_moderator_summary);

    // rounds 3 and 4 run to completion; round 4 meets max_rounds with no
    // trailing summary even though summary_every_n_rounds divides it
    for _ in 0..4 {
        let turn = next_turn(&room, LLM_TIMEOUT, USER_TURN_TIMEOUT).unwrap();
        append_utterance(&mut room, speak(&room, &turn.speaker_id, turn.kind_hint)).unwrap();
    }
    assert_eq!(room.stage, Stage::ProConclusion);

    // pro_conclusion / con_conclusion
    let turn = next_turn(&room, LLM_TIMEOUT, USER_TURN_TIMEOUT).unwrap();
    assert_eq!(turn.speaker_id, "nietzsche");
    assert_eq!(turn.kind_hint, UtteranceKind::Conclusion);
    append_utterance(&mut room, speak(&room, "nietzsche", turn.kind_hint)).unwrap();
    assert_eq!(room.stage, Stage::ConConclusion);

    let turn = next_turn(&room, LLM_TIMEOUT, USER_TURN_TIMEOUT).unwrap();
    assert_eq!(turn.speaker_id, "kant");
    append_utterance(&mut room, speak(&room, "kant", turn.kind_hint)).unwrap();
    assert_eq!(room.stage, Stage::ModeratorClosing);

    // moderator_closing
    let turn = next_turn(&room, LLM_TIMEOUT, USER_TURN_TIMEOUT).unwrap();
    assert_eq!(turn.speaker_id, "moderator");
    assert_eq!(turn.kind_hint, UtteranceKind::ModeratorConclusion);
    append_utterance(&mut room, speak(&room, "moderator", turn.kind_hint)).unwrap();

    assert_eq!(room.stage, Stage::Completed);
    assert!(room.is_completed());
    let err = next_turn(&room, LLM_TIMEOUT, USER_TURN_TIMEOUT).unwrap_err();
    assert_eq!(err.kind(), "ROOM_ENDED");
}

#[test]
fn zero_rounds_skips_interactive_argument_entirely() {
    let mut room = two_philosopher_room(0);

    for speaker in ["moderator", "nietzsche", "kant"] {
        let turn = next_turn(&room, LLM_TIMEOUT, USER_TURN_TIMEOUT).unwrap();
        assert_eq!(turn.speaker_id, speaker);
        append_utterance(&mut room, speak(&room, speaker, turn.kind_hint)).unwrap();
    }

    assert_eq!(room.stage, Stage::ProConclusion);
    assert!(room.interactive_rotation.is_empty());
}
