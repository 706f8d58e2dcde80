//! Room-control API request/response types (spec.md §6.5). Transport-
//! neutral: the server crate's axum handlers deserialize HTTP bodies into
//! these and serialize these back out, but nothing here depends on HTTP.

use std::collections::HashMap;

use debate_core::{Error, Result, TurnDescriptor};
use serde::{Deserialize, Serialize};

use crate::actor::RoomHandle;

#[derive(Debug, Clone, Deserialize)]
pub struct ParticipantSpec {
    pub id: String,
    /// `"pro"` or `"con"`.
    pub role: String,
    #[serde(default)]
    pub is_user: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRoomRequest {
    pub topic: String,
    #[serde(default)]
    pub language: Option<String>,
    pub participants: Vec<ParticipantSpec>,
    #[serde(default)]
    pub moderator_style_id: Option<String>,
    #[serde(default)]
    pub max_rounds: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateRoomResponse {
    pub room_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitUserMessageRequest {
    pub user_id: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Accepted {
    pub accepted: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Ended {
    pub ended: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    pub active_rooms: usize,
    pub memory_estimate_bytes: u64,
    pub rooms_by_stage: HashMap<String, u64>,
}

/// The `advance_turn` response shape (spec.md §6.5: `{started:
/// TurnDescriptor}` or `BUSY` | `COMPLETED` | `AWAITING_USER`). Modeled as
/// one enum rather than `Result<TurnDescriptor>` because `AWAITING_USER`
/// here is the *expected* outcome of a turn that started and immediately
/// parked — not a failure of the `advance_turn` call itself.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AdvanceTurnOutcome {
    Started { descriptor: TurnDescriptor },
    AwaitingUser { speaker: String },
    Busy,
    Completed,
}

/// Runs `advance_turn` against `handle` and folds the room-task's
/// `Result<TurnDescriptor>` into the four-way response spec.md §6.5
/// describes. `BUSY`/`COMPLETED`/`AWAITING_USER` are reported here rather
/// than propagated as `Err`, since callers branch on them as ordinary
/// control flow, not failure.
pub async fn advance_turn(handle: &RoomHandle) -> Result<AdvanceTurnOutcome> {
    match handle.advance_turn().await {
        Ok(descriptor) if descriptor.is_user => {
            Ok(AdvanceTurnOutcome::AwaitingUser { speaker: descriptor.speaker_id })
        }
        Ok(descriptor) => Ok(AdvanceTurnOutcome::Started { descriptor }),
        Err(Error::Busy(_)) => Ok(AdvanceTurnOutcome::Busy),
        Err(Error::RoomEnded(_)) => Ok(AdvanceTurnOutcome::Completed),
        Err(Error::AwaitingUser(_, speaker)) => Ok(AdvanceTurnOutcome::AwaitingUser { speaker }),
        Err(other) => Err(other),
    }
}
