//! Core domain types and traits for the Debate Orchestrator.
//!
//! Holds the data model (§3), the surface-level error taxonomy (§7), and the
//! traits the core consumes from external collaborators (LLM completion,
//! RAG retrieval, persistence — §6). Nothing in this crate performs I/O.

pub mod domain;
pub mod error;
pub mod gateways;

pub use domain::{
    Argument, ArgumentStatus, AttackDefenseMap, AwaitingUser, AxisVector, Capabilities, Citation,
    DebateRoom, DefenseFollowupMap, DialogueType, Participant, ParticipantId, ParticipantKind,
    PhilosopherProfile, PreparedOpening, RagAxis, RagSource, Role, RoomMetadata, RoomState, Side,
    Stage, StrategyCatalogue, StrategyEntry, StrategyId, TurnDescriptor, Utterance,
    UtteranceKind, UtteranceMetadata,
};
pub use error::{Error, Result};
pub use gateways::{
    CompletionRequest, CompletionResponse, LlmClient, ModelAlias, PersistenceBackend,
    RagCombinedResult, RagGateway, RagHit, RagSourceKind, RagTimeoutPolicy,
};
