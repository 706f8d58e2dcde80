//! [`debate_core::RagGateway`] implementation: per-call timeouts, result
//! normalization, and the combined-search merge policy of spec.md §4.3.a.
//! Grounded on the teacher's `HybridRetriever` (`retriever.rs`): parallel
//! sub-source fan-out, per-source score normalization, then fusion —
//! generalized here from dense/sparse fusion to web/vector/philosopher
//! fusion with explicit per-source weights instead of a fixed RRF constant.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use debate_core::{
    Error, RagCombinedResult, RagGateway, RagHit, RagSourceKind, RagTimeoutPolicy, Result,
};

use crate::cache::RagCache;
use crate::sources::{PhilosopherSearchBackend, VectorSearchBackend, WebSearchBackend};

pub struct RagGatewayImpl {
    web: Arc<dyn WebSearchBackend>,
    vector: Arc<dyn VectorSearchBackend>,
    philosopher: Arc<dyn PhilosopherSearchBackend>,
    cache: RagCache,
    default_collection: String,
    default_philosopher_key: String,
}

impl RagGatewayImpl {
    pub fn new(
        web: Arc<dyn WebSearchBackend>,
        vector: Arc<dyn VectorSearchBackend>,
        philosopher: Arc<dyn PhilosopherSearchBackend>,
    ) -> Self {
        Self {
            web,
            vector,
            philosopher,
            cache: RagCache::default(),
            default_collection: "philosopher-corpus".to_string(),
            default_philosopher_key: "default".to_string(),
        }
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    async fn fetch_one(
        &self,
        kind: RagSourceKind,
        query: &str,
        max_results: u32,
        timeout: Duration,
        collection_or_key: &str,
    ) -> std::result::Result<Vec<RagHit>, ()> {
        if let Some(cached) = self.cache.get(query, &[kind]) {
            return Ok(cached);
        }
        let fut = async {
            match kind {
                RagSourceKind::Web => self.web.search(query, max_results).await,
                RagSourceKind::Vector => self.vector.search(query, collection_or_key, max_results).await,
                RagSourceKind::Philosopher => {
                    self.philosopher.search(query, collection_or_key, max_results).await
                }
            }
        };
        match tokio::time::timeout(timeout, fut).await {
            Ok(hits) => {
                self.cache.put(query, &[kind], hits.clone());
                Ok(hits)
            }
            Err(_) => Err(()),
        }
    }
}

#[async_trait]
impl RagGateway for RagGatewayImpl {
    async fn web_search(&self, query: &str, max_results: u32, timeout: Duration) -> Result<Vec<RagHit>> {
        self.fetch_one(RagSourceKind::Web, query, max_results, timeout, "")
            .await
            .map_err(|_| Error::RagTimeout(timeout))
    }

    async fn vector_search(
        &self,
        query: &str,
        collection: &str,
        max_results: u32,
        timeout: Duration,
    ) -> Result<Vec<RagHit>> {
        self.fetch_one(RagSourceKind::Vector, query, max_results, timeout, collection)
            .await
            .map_err(|_| Error::RagTimeout(timeout))
    }

    async fn philosopher_search(
        &self,
        query: &str,
        philosopher_key: &str,
        max_results: u32,
        timeout: Duration,
    ) -> Result<Vec<RagHit>> {
        self.fetch_one(RagSourceKind::Philosopher, query, max_results, timeout, philosopher_key)
            .await
            .map_err(|_| Error::RagTimeout(timeout))
    }

    async fn combined(
        &self,
        query: &str,
        weights: &[(RagSourceKind, f64)],
        max_total: u32,
        timeout: RagTimeoutPolicy,
    ) -> Result<RagCombinedResult> {
        let source_budget = max_total.max(1);
        let body = async {
            let mut fetches = Vec::new();
            for (kind, weight) in weights {
                let kind = *kind;
                let weight = *weight;
                fetches.push(async move {
                    let result = self
                        .fetch_one(kind, query, source_budget, timeout.per_source, &self.collection_or_key_for(kind))
                        .await;
                    (kind, weight, result)
                });
            }
            futures::future::join_all(fetches).await
        };

        let per_source = match tokio::time::timeout(timeout.combined, body).await {
            Ok(results) => results,
            Err(_) => {
                return Ok(RagCombinedResult {
                    hits: Vec::new(),
                    complete: false,
                    timed_out_sources: weights.iter().map(|(k, _)| *k).collect(),
                });
            }
        };

        let mut timed_out = Vec::new();
        let mut merged: Vec<RagHit> = Vec::new();
        let mut best_by_key: HashMap<String, f64> = HashMap::new();

        for (kind, weight, result) in per_source {
            let hits = match result {
                Ok(hits) => hits,
                Err(()) => {
                    timed_out.push(kind);
                    continue;
                }
            };
            if hits.is_empty() {
                continue;
            }
            let max_in_batch = hits.iter().map(|h| h.score).fold(f64::MIN, f64::max).max(f64::EPSILON);
            for mut hit in hits {
                let normalized = hit.score / max_in_batch;
                let final_score = weight * normalized;
                let dedupe_key = hit.source_id.clone();
                let keep = match best_by_key.get(&dedupe_key) {
                    Some(existing) => final_score > *existing,
                    None => true,
                };
                if keep {
                    hit.score = final_score;
                    best_by_key.insert(dedupe_key.clone(), final_score);
                    merged.retain(|h| h.source_id != dedupe_key);
                    merged.push(hit);
                }
            }
        }

        merged.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        merged.truncate(max_total as usize);

        Ok(RagCombinedResult { hits: merged, complete: timed_out.is_empty(), timed_out_sources: timed_out })
    }
}

impl RagGatewayImpl {
    fn collection_or_key_for(&self, kind: RagSourceKind) -> String {
        match kind {
            RagSourceKind::Vector => self.default_collection.clone(),
            RagSourceKind::Philosopher => self.default_philosopher_key.clone(),
            RagSourceKind::Web => String::new(),
        }
    }
}
