use thiserror::Error;

/// Surface-level error kinds returned by room-control and turn operations.
///
/// Each variant maps 1:1 onto the error kinds the core contract promises
/// callers (see the room-control API and error-handling sections of the
/// design doc); the HTTP shell maps these onto status codes.
#[derive(Error, Debug, Clone)]
pub enum Error {
    #[error("unknown room: {0}")]
    UnknownRoom(String),

    #[error("room {0} has already ended")]
    RoomEnded(String),

    #[error("room {0} is awaiting user input from {1}")]
    AwaitingUser(String, String),

    #[error("it is not {0}'s turn")]
    NotYourTurn(String),

    #[error("resource cap exceeded: {0}")]
    CapExceeded(String),

    #[error("unknown strategy id: {0}")]
    StrategyUnknown(String),

    #[error("candidate strategy set was empty for {0}")]
    StrategyEmpty(String),

    #[error("llm call timed out after {0:?}")]
    LlmTimeout(std::time::Duration),

    #[error("llm network error: {0}")]
    LlmNetwork(String),

    #[error("llm output failed schema validation: {0}")]
    LlmSchema(String),

    #[error("rag call timed out after {0:?}")]
    RagTimeout(std::time::Duration),

    #[error("subscriber disconnected: slow consumer")]
    SlowConsumer,

    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("room {0} is busy with an in-flight turn")]
    Busy(String),

    #[error("persistence error: {0}")]
    Persistence(String),
}

impl Error {
    /// Stable machine-readable kind, matching spec error-kind identifiers.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::UnknownRoom(_) => "UNKNOWN_ROOM",
            Error::RoomEnded(_) => "ROOM_ENDED",
            Error::AwaitingUser(_, _) => "AWAITING_USER",
            Error::NotYourTurn(_) => "NOT_YOUR_TURN",
            Error::CapExceeded(_) => "CAP_EXCEEDED",
            Error::StrategyUnknown(_) => "STRATEGY_UNKNOWN",
            Error::StrategyEmpty(_) => "STRATEGY_EMPTY",
            Error::LlmTimeout(_) => "LLM_TIMEOUT",
            Error::LlmNetwork(_) => "LLM_NETWORK",
            Error::LlmSchema(_) => "LLM_SCHEMA",
            Error::RagTimeout(_) => "RAG_TIMEOUT",
            Error::SlowConsumer => "SLOW_CONSUMER",
            Error::ConfigInvalid(_) => "CONFIG_INVALID",
            Error::Busy(_) => "BUSY",
            Error::Persistence(_) => "PERSISTENCE_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
