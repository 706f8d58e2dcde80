//! Attack-target selection (spec.md §4.4 `opponent_arguments`): "the
//! selected target Argument (highest unattacked vulnerability among
//! opponents' stored Arguments)".

use debate_core::{Argument, ArgumentStatus, DebateRoom, Side};

/// Picks the highest-vulnerability, not-yet-attacked [`Argument`] authored
/// by a speaker on the opposite side from `attacker_side`. Ties keep the
/// first one encountered in speaker-then-insertion order.
pub fn select_target_argument(room: &DebateRoom, attacker_side: Side) -> Option<&Argument> {
    let opponent_side = attacker_side.opposite();
    room.state
        .per_speaker_arguments
        .iter()
        .filter(|(speaker_id, _)| {
            room.participant(speaker_id).and_then(|p| p.role.side()) == Some(opponent_side)
        })
        .flat_map(|(_, args)| args.iter())
        .filter(|a| a.status != ArgumentStatus::Attacked)
        .max_by(|a, b| {
            a.vulnerability_score
                .partial_cmp(&b.vulnerability_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use debate_core::{
        AxisVector, Capabilities, DialogueType, Participant, ParticipantKind, Role, RoomState,
        Stage,
    };
    use chrono::Utc;

    fn argument(id: &str, speaker: &str, score: f64, status: ArgumentStatus) -> Argument {
        Argument {
            id: id.into(),
            speaker_id: speaker.into(),
            source_utterance_id: "u1".into(),
            claim: "claim".into(),
            premises: vec![],
            evidence: vec![],
            vulnerability_score: score,
            per_axis_vulnerability: AxisVector::ZERO,
            status,
        }
    }

    fn room() -> DebateRoom {
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
            stage: Stage::InteractiveArgument,
            speaking_history: vec![],
            turn_cursor: 0,
            current_round: 1,
            max_rounds: 4,
            summary_every_n_rounds: 2,
            interactive_rotation: vec!["nietzsche".into(), "kant".into()],
            pending_moderator_summary: false,
            awaiting_user: None,
            created_at: Utc::now(),
            last_activity_at: Utc::now(),
            ended_reason: None,
            state: RoomState::default(),
        }
    }

    #[test]
    fn picks_highest_unattacked_vulnerability_from_opponent() {
        let mut room = room();
        room.state.per_speaker_arguments.insert(
            "kant".into(),
            vec![
                argument("a1", "kant", 0.3, ArgumentStatus::Scored),
                argument("a2", "kant", 0.9, ArgumentStatus::Scored),
                argument("a3", "kant", 0.95, ArgumentStatus::Attacked),
            ],
        );
        room.state.per_speaker_arguments.insert(
            "nietzsche".into(),
            vec![argument("own", "nietzsche", 0.99, ArgumentStatus::Scored)],
        );

        let target = select_target_argument(&room, Side::Pro).unwrap();
        assert_eq!(target.id, "a2", "must skip own-side arguments and already-attacked ones");
    }

    #[test]
    fn no_opponent_arguments_returns_none() {
        let room = room();
        assert!(select_target_argument(&room, Side::Pro).is_none());
    }
}
