use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::profile::StrategyId;
use super::stage::{Role, Stage};
use super::utterance::{Argument, Utterance};

/// Re-architected per spec.md §9: a single `Participant` entity with a
/// capability set, rather than a class-inheritance hierarchy. The moderator
/// is a `Participant` whose capabilities include `can_summarize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantKind {
    Philosopher,
    User,
    Moderator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub can_attack: bool,
    pub can_defend: bool,
    pub can_summarize: bool,
    pub can_decide_user_turn: bool,
}

impl Capabilities {
    pub fn philosopher() -> Self {
        Capabilities { can_attack: true, can_defend: true, can_summarize: false, can_decide_user_turn: false }
    }

    pub fn user() -> Self {
        Capabilities { can_attack: true, can_defend: true, can_summarize: false, can_decide_user_turn: true }
    }

    pub fn moderator() -> Self {
        Capabilities { can_attack: false, can_defend: false, can_summarize: true, can_decide_user_turn: false }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
    pub kind: ParticipantKind,
    pub role: Role,
    pub profile_key: String,
    pub capabilities: Capabilities,
}

/// Dialogue types the Registry will accept; only `Debate` is implemented by
/// this core, others are rejected at creation time (spec.md §1: "dialogue
/// type debate in scope; other types delegated").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogueType {
    Debate,
}

/// Per-participant prepared-opening cache entry (spec.md §4.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreparedOpening {
    pub text: String,
    pub metadata: super::utterance::UtteranceMetadata,
    pub prepared_from: (String, String),
}

/// Fields the design notes call out explicitly as the re-architected
/// replacement for dynamic attribute attachment on agent objects
/// (spec.md §9): explicit, keyed `RoomState` fields instead of runtime
/// attribute bags.
#[derive(Debug, Clone, Default)]
pub struct RoomState {
    pub per_participant_prepared_opening: HashMap<String, PreparedOpening>,
    pub per_speaker_arguments: HashMap<String, Vec<Argument>>,
    /// Keyed by (attacker, target-argument-id): the most recent strategies
    /// used, newest-last, capped to the blocklist window N=2.
    pub recent_strategies_against: HashMap<(String, String), VecDeque<StrategyId>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateRoom {
    pub id: String,
    pub topic: String,
    pub language: String,
    pub dialogue_type: DialogueType,
    pub stance_pro: String,
    pub stance_con: String,
    pub participants: Vec<Participant>,
    pub moderator_profile_key: String,
    pub stage: Stage,
    pub speaking_history: Vec<Utterance>,
    /// Index of the current sub-phase rotation cursor. Meaning depends on
    /// stage: in `InteractiveArgument` it is an index into the fixed
    /// rotation `[pro1, con1, pro2, con2, ...]`.
    pub turn_cursor: usize,
    pub current_round: u32,
    pub max_rounds: u32,
    pub summary_every_n_rounds: u32,
    /// Fixed `[pro1, con1, pro2, con2, ...]` speaker order for
    /// `InteractiveArgument`, computed once at room creation (spec.md §4.6).
    #[serde(default)]
    pub interactive_rotation: Vec<String>,
    /// Set when an interactive round boundary lands on a
    /// `summary_every_n_rounds` multiple; cleared once the moderator summary
    /// utterance is appended (spec.md §4.6: "moderator may produce a
    /// summary if summary_every_n_rounds divides the round number").
    #[serde(default)]
    pub pending_moderator_summary: bool,
    pub awaiting_user: Option<AwaitingUser>,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    pub ended_reason: Option<String>,

    #[serde(skip)]
    pub state: RoomState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwaitingUser {
    pub speaker_id: String,
    pub since: DateTime<Utc>,
    /// The kind the user's utterance would have carried, preserved so an
    /// expiry fallback can stamp the same kind rather than guessing it from
    /// stage alone (spec.md §4.6 user-turn timeout).
    pub kind_hint: super::stage::UtteranceKind,
    pub deadline: DateTime<Utc>,
}

impl DebateRoom {
    pub fn is_completed(&self) -> bool {
        self.stage.is_terminal()
    }

    pub fn participant(&self, id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    pub fn pro_participants(&self) -> Vec<&Participant> {
        self.participants.iter().filter(|p| p.role.side() == Some(super::stage::Side::Pro)).collect()
    }

    pub fn con_participants(&self) -> Vec<&Participant> {
        self.participants.iter().filter(|p| p.role.side() == Some(super::stage::Side::Con)).collect()
    }
}

/// Lightweight metadata exposed by `list_active_rooms` without shipping the
/// full speaking history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomMetadata {
    pub id: String,
    pub topic: String,
    pub stage: Stage,
    pub participant_count: usize,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
}

impl From<&DebateRoom> for RoomMetadata {
    fn from(r: &DebateRoom) -> Self {
        RoomMetadata {
            id: r.id.clone(),
            topic: r.topic.clone(),
            stage: r.stage,
            participant_count: r.participants.len(),
            created_at: r.created_at,
            last_activity_at: r.last_activity_at,
        }
    }
}
