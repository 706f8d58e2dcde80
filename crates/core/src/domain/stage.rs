use serde::{Deserialize, Serialize};

/// Debate stages in protocol order. Transitions are a strict DAG with no
/// backward edges (spec.md §8 invariant); see `debate-scheduler` for the
/// transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    ModeratorIntro,
    ProOpening,
    ConOpening,
    InteractiveArgument,
    ProConclusion,
    ConConclusion,
    ModeratorClosing,
    Completed,
}

impl Stage {
    pub fn display_name(&self) -> &'static str {
        match self {
            Stage::ModeratorIntro => "moderator_intro",
            Stage::ProOpening => "pro_opening",
            Stage::ConOpening => "con_opening",
            Stage::InteractiveArgument => "interactive_argument",
            Stage::ProConclusion => "pro_conclusion",
            Stage::ConConclusion => "con_conclusion",
            Stage::ModeratorClosing => "moderator_closing",
            Stage::Completed => "completed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Completed)
    }
}

/// Utterance kind. Distinct from `Stage`: several kinds can occur within the
/// same stage (e.g. attack/defense/followup all occur in
/// `InteractiveArgument`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UtteranceKind {
    Opening,
    Attack,
    Defense,
    Followup,
    /// Closing statement during `pro_conclusion`/`con_conclusion`. spec.md's
    /// Stage enum names these stages but its Utterance-kind enum has no
    /// matching variant; added here as a supplement (DESIGN.md Open
    /// Question decision) rather than overloading `Opening`.
    Conclusion,
    ModeratorIntro,
    ModeratorSummary,
    ModeratorConclusion,
    UserInput,
}

/// A participant's role within a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Pro,
    Con,
    UserPro,
    UserCon,
    /// The moderator speaks for neither side. Never appears in
    /// `DebateRoom::participants` (the moderator is addressed by
    /// `moderator_profile_key`, not a rotation entry) — this variant exists
    /// only so `Utterance.role` has something to stamp on moderator-authored
    /// utterances (DESIGN.md Open Question decision).
    Moderator,
}

impl Role {
    pub fn is_user(&self) -> bool {
        matches!(self, Role::UserPro | Role::UserCon)
    }

    pub fn side(&self) -> Option<Side> {
        match self {
            Role::Pro | Role::UserPro => Some(Side::Pro),
            Role::Con | Role::UserCon => Some(Side::Con),
            Role::Moderator => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Pro,
    Con,
}

impl Side {
    pub fn opposite(&self) -> Side {
        match self {
            Side::Pro => Side::Con,
            Side::Con => Side::Pro,
        }
    }
}

/// Descriptor produced by the Scheduler and consumed by the Builder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnDescriptor {
    pub stage: Stage,
    pub speaker_id: String,
    pub is_user: bool,
    pub kind_hint: UtteranceKind,
    pub deadline: chrono::DateTime<chrono::Utc>,
}
