//! Sub-source traits the Gateway fans out to. These stand in for the
//! external retrieval services spec.md §1 places out of scope ("The RAG
//! retrieval service: web search, vector search, philosopher-corpus search
//! ... §6") — the Gateway only ever talks to these traits, never to a
//! concrete search engine, the way the teacher's `HybridRetriever` talks to
//! `VectorStore`/`SparseIndex` behind their own traits (`retriever.rs`).

use async_trait::async_trait;
use debate_core::{RagHit, RagSourceKind};

#[async_trait]
pub trait WebSearchBackend: Send + Sync {
    async fn search(&self, query: &str, max_results: u32) -> Vec<RagHit>;
}

#[async_trait]
pub trait VectorSearchBackend: Send + Sync {
    async fn search(&self, query: &str, collection: &str, max_results: u32) -> Vec<RagHit>;
}

#[async_trait]
pub trait PhilosopherSearchBackend: Send + Sync {
    async fn search(&self, query: &str, philosopher_key: &str, max_results: u32) -> Vec<RagHit>;
}

/// Deterministic canned-result backend shared by all three sub-source
/// traits, used in tests the way the teacher's retriever tests use a fixed
/// in-memory `VectorStore`.
pub struct MockSearchBackend {
    kind: RagSourceKind,
    hits: Vec<RagHit>,
}

impl MockSearchBackend {
    pub fn new(kind: RagSourceKind, hits: Vec<RagHit>) -> Self {
        Self { kind, hits }
    }

    pub fn empty(kind: RagSourceKind) -> Self {
        Self { kind, hits: Vec::new() }
    }

    fn take(&self, max_results: u32) -> Vec<RagHit> {
        self.hits
            .iter()
            .filter(|h| h.source_kind == self.kind)
            .take(max_results as usize)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl WebSearchBackend for MockSearchBackend {
    async fn search(&self, _query: &str, max_results: u32) -> Vec<RagHit> {
        self.take(max_results)
    }
}

#[async_trait]
impl VectorSearchBackend for MockSearchBackend {
    async fn search(&self, _query: &str, _collection: &str, max_results: u32) -> Vec<RagHit> {
        self.take(max_results)
    }
}

#[async_trait]
impl PhilosopherSearchBackend for MockSearchBackend {
    async fn search(&self, _query: &str, _philosopher_key: &str, max_results: u32) -> Vec<RagHit> {
        self.take(max_results)
    }
}
