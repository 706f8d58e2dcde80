//! Debate Orchestrator room-control shell (spec.md §6.4-6.5).
//!
//! A thin axum layer over `debate-registry`: HTTP handlers translate JSON
//! bodies into `debate_registry::api` request/response types and call
//! straight through to a shared `Registry`; the WebSocket route subscribes
//! to a room's event bus and forwards `RoomEvent`s as JSON frames. No
//! business logic lives here — it belongs in the crates below.

pub mod http;
pub mod metrics;
pub mod state;
pub mod websocket;

pub use http::create_router;
pub use metrics::init_metrics;
pub use state::AppState;
pub use websocket::{WsEvent, WsMessage};

use axum::http::StatusCode;
use thiserror::Error;

/// Errors the HTTP shell itself can raise, distinct from `debate_core::Error`
/// (which already carries its own `.kind()`/status mapping via
/// [`map_core_error`]). Grounded on the teacher's `ServerError`
/// (`server/src/lib.rs`): a small enum, one `From` impl onto `StatusCode`.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ServerError> for StatusCode {
    fn from(err: ServerError) -> Self {
        match err {
            ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Maps a `debate_core::Error` onto the HTTP status spec.md §7 implies for
/// each error kind (client-caused room/turn errors are 4xx; internal model
/// or persistence failures are 5xx).
pub fn map_core_error(err: &debate_core::Error) -> StatusCode {
    use debate_core::Error::*;
    match err {
        UnknownRoom(_) => StatusCode::NOT_FOUND,
        RoomEnded(_) | AwaitingUser(_, _) | NotYourTurn(_) | StrategyUnknown(_) | ConfigInvalid(_) => {
            StatusCode::BAD_REQUEST
        }
        CapExceeded(_) => StatusCode::SERVICE_UNAVAILABLE,
        Busy(_) => StatusCode::CONFLICT,
        StrategyEmpty(_) | LlmTimeout(_) | LlmNetwork(_) | RagTimeout(_) | LlmSchema(_) | SlowConsumer | Persistence(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
