//! RAG Gateway (spec.md §4.3): wraps external web/vector/philosopher-corpus
//! retrieval behind [`debate_core::RagGateway`], enforcing per-call
//! timeouts, result normalization, and a small LRU+TTL cache.

pub mod cache;
pub mod gateway;
pub mod sources;

pub use cache::RagCache;
pub use gateway::RagGatewayImpl;
pub use sources::{MockSearchBackend, PhilosopherSearchBackend, VectorSearchBackend, WebSearchBackend};
