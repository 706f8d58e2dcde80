//! LLM completion client for the Debate Orchestrator (spec.md §6.1).
//!
//! A single operation, `complete`, implementing [`debate_core::LlmClient`].
//! Grounded on the teacher's [`ClaudeBackend`]-style reqwest POST
//! (`claude.rs`) for the HTTP shape, and `adapter.rs`'s
//! `LanguageModelAdapter` for the trait-bridging pattern — here the bridge
//! is direct since the core already defines the exact trait this crate
//! implements.

pub mod backend;
pub mod model_resolver;
pub mod schema;

pub use backend::{HttpLlmClient, HttpLlmConfig, MockLlmClient};
pub use model_resolver::ModelResolver;
pub use schema::validate_schema;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("network error: {0}")]
    Network(String),
    #[error("api error: {0}")]
    Api(String),
    #[error("response failed schema validation: {0}")]
    Schema(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        LlmError::Network(err.to_string())
    }
}

impl From<LlmError> for debate_core::Error {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Network(msg) => debate_core::Error::LlmNetwork(msg),
            LlmError::Schema(msg) => debate_core::Error::LlmSchema(msg),
            LlmError::Api(msg) => debate_core::Error::LlmSchema(msg),
        }
    }
}
