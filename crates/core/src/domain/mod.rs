pub mod profile;
pub mod room;
pub mod stage;
pub mod utterance;

pub use profile::{
    AttackDefenseMap, AxisVector, DefenseFollowupMap, ParticipantId, PhilosopherProfile, RagAxis,
    StrategyCatalogue, StrategyEntry, StrategyId,
};
pub use room::{
    AwaitingUser, Capabilities, DebateRoom, DialogueType, Participant, ParticipantKind,
    PreparedOpening, RoomMetadata, RoomState,
};
pub use stage::{Role, Side, Stage, TurnDescriptor, UtteranceKind};
pub use utterance::{
    Argument, ArgumentStatus, Citation, RagSource, Utterance, UtteranceMetadata,
};
