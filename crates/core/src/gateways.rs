//! Traits for the external collaborators the core consumes: the LLM
//! completion service, the RAG retrieval service, and persistence (§6).
//! Grounded on the teacher's `LanguageModel`/`LlmBackend` split
//! (`llm/src/adapter.rs`) and `SessionStore` (`server/src/session.rs`): a
//! thin async trait seam, object-safe via `async_trait`, with a concrete
//! mock implementation for tests.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::RoomMetadata;
use crate::error::Result;

/// Model tier the core asks for, resolved to a concrete model name by
/// configuration. The core itself is model-agnostic (spec.md §6.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelAlias {
    High,
    Mid,
    Low,
}

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub model: ModelAlias,
    pub max_tokens: u32,
    pub timeout: Duration,
    /// When present, the backend must validate its output against this JSON
    /// Schema and the adapter may request one repair retry on failure.
    pub response_schema: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub text: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// `complete()` per spec.md §6.1. Implementations wrap a concrete HTTP
/// backend; the core only ever talks to this trait.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, req: CompletionRequest) -> Result<CompletionResponse>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RagSourceKind {
    Web,
    Vector,
    Philosopher,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagHit {
    pub source_kind: RagSourceKind,
    pub source_id: String,
    pub title: String,
    pub snippet: String,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagCombinedResult {
    pub hits: Vec<RagHit>,
    /// Whether every sub-source answered within its timeout; `false` means
    /// the result is partial (spec.md §4.3: "partial results ... with a
    /// per-source status flag").
    pub complete: bool,
    pub timed_out_sources: Vec<RagSourceKind>,
}

/// Per-call timeout policy (spec.md §5: "every RAG call has a timeout,
/// default 8s per sub-source, 15s combined").
#[derive(Debug, Clone, Copy)]
pub struct RagTimeoutPolicy {
    pub per_source: Duration,
    pub combined: Duration,
}

impl Default for RagTimeoutPolicy {
    fn default() -> Self {
        RagTimeoutPolicy { per_source: Duration::from_secs(8), combined: Duration::from_secs(15) }
    }
}

/// The four operations of §4.3. Implementations enforce their own
/// timeouts/caching; the core treats this as an opaque collaborator.
#[async_trait]
pub trait RagGateway: Send + Sync {
    async fn web_search(&self, query: &str, max_results: u32, timeout: Duration) -> Result<Vec<RagHit>>;

    async fn vector_search(
        &self,
        query: &str,
        collection: &str,
        max_results: u32,
        timeout: Duration,
    ) -> Result<Vec<RagHit>>;

    async fn philosopher_search(
        &self,
        query: &str,
        philosopher_key: &str,
        max_results: u32,
        timeout: Duration,
    ) -> Result<Vec<RagHit>>;

    async fn combined(
        &self,
        query: &str,
        weights: &[(RagSourceKind, f64)],
        max_total: u32,
        timeout: RagTimeoutPolicy,
    ) -> Result<RagCombinedResult>;
}

/// Persistence interface (spec.md §6.3). The core calls this after every
/// append; `load_room_snapshot`/`list_active_rooms` back the Registry's
/// recovery and listing paths.
#[async_trait]
pub trait PersistenceBackend: Send + Sync {
    async fn save_utterance(&self, room_id: &str, utterance: &crate::domain::Utterance) -> Result<()>;
    async fn load_room_snapshot(&self, room_id: &str) -> Result<Option<crate::domain::DebateRoom>>;
    async fn list_active_rooms(&self) -> Result<Vec<RoomMetadata>>;
}
