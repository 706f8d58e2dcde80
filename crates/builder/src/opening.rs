//! Opening Preparer (spec.md §4.5): pre-computes each participant's opening
//! utterance ahead of its turn, single-flight per (participant, topic,
//! stance) key.
//!
//! Grounded on the teacher's cache-plus-in-flight-guard shape
//! (`server/src/session.rs`'s cleanup task pairs a lock with a
//! notification primitive); here the guard is a `dashmap` entry plus a
//! `tokio::sync::Notify`, matching spec.md's "concurrent preparations ...
//! share one task; all observers await its completion".

use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use debate_core::{
    CompletionRequest, Error, LlmClient, ModelAlias, PhilosopherProfile, PreparedOpening,
    RagGateway, RagHit, RagTimeoutPolicy, Result, Role, UtteranceKind, UtteranceMetadata,
};
use futures::future::join_all;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::{Notify, Semaphore};

use crate::citations::derive_citations;
use crate::prompt::length_policy;

/// Bounded concurrency for the per-argument strengthening stage (spec.md
/// §4.5 step 3c: "bounded concurrency = 3").
const STRENGTHEN_CONCURRENCY: usize = 3;

fn cache_key(participant_id: &str, topic: &str, stance: &str) -> String {
    format!("{participant_id}::{topic}::{stance}")
}

#[derive(Debug, Deserialize)]
struct CoreArgument {
    core_argument: String,
    retrieval_query: String,
}

fn core_args_schema() -> Value {
    json!({
        "type": "array",
        "items": {
            "type": "object",
            "required": ["core_argument", "retrieval_query"],
            "properties": {
                "core_argument": { "type": "string" },
                "retrieval_query": { "type": "string" }
            }
        }
    })
}

/// Single-flight guard and result cache for opening preparation. Caches are
/// local to this preparer instance; callers typically hold one per room.
#[derive(Default)]
pub struct OpeningPreparer {
    in_flight: DashMap<String, Arc<Notify>>,
    cache: DashMap<String, PreparedOpening>,
}

impl OpeningPreparer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evicts the cache entry and wakes anyone waiting on it without a
    /// result, per spec.md §4.5 step 5 ("any change to topic or stance ...
    /// evicts the entry and cancels in-flight preparation").
    pub fn invalidate(&self, participant_id: &str, topic: &str, stance: &str) {
        let key = cache_key(participant_id, topic, stance);
        self.cache.remove(&key);
        if let Some((_, notify)) = self.in_flight.remove(&key) {
            notify.notify_waiters();
        }
    }

    /// Returns the cached opening if present and valid, else synchronously
    /// runs the preparation pipeline (spec.md §4.5 step 6:
    /// `get_prepared_or_generate`).
    #[allow(clippy::too_many_arguments)]
    pub async fn get_prepared_or_generate(
        &self,
        llm: &dyn LlmClient,
        rag: &dyn RagGateway,
        participant_id: &str,
        topic: &str,
        stance_statement: &str,
        role: Role,
        profile: &PhilosopherProfile,
        model: ModelAlias,
        llm_timeout: Duration,
        rag_timeout: RagTimeoutPolicy,
    ) -> Result<PreparedOpening> {
        let key = cache_key(participant_id, topic, stance_statement);

        loop {
            if let Some(cached) = self.cache.get(&key) {
                return Ok(cached.clone());
            }

            let notify = match self.in_flight.entry(key.clone()) {
                Entry::Occupied(existing) => Some(existing.get().clone()),
                Entry::Vacant(slot) => {
                    let notify = Arc::new(Notify::new());
                    slot.insert(notify);
                    None
                }
            };

            if let Some(notify) = notify {
                notify.notified().await;
                continue;
            }

            let result = self
                .run_pipeline(llm, rag, topic, stance_statement, role, profile, model, llm_timeout, rag_timeout)
                .await;

            if let Ok(opening) = &result {
                self.cache.insert(key.clone(), opening.clone());
            }
            if let Some((_, notify)) = self.in_flight.remove(&key) {
                notify.notify_waiters();
            }
            return result;
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn run_pipeline(
        &self,
        llm: &dyn LlmClient,
        rag: &dyn RagGateway,
        topic: &str,
        stance_statement: &str,
        role: Role,
        profile: &PhilosopherProfile,
        model: ModelAlias,
        llm_timeout: Duration,
        rag_timeout: RagTimeoutPolicy,
    ) -> Result<PreparedOpening> {
        // (a) core arguments + retrieval queries, one LLM call.
        let core_req = CompletionRequest {
            system_prompt: format!(
                "You are {}, preparing your opening statement. {}",
                profile.display_name, profile.personality
            ),
            user_prompt: format!(
                "Topic: {topic}\nYour stance: {stance_statement}\n\n\
                 List 2-4 core arguments supporting your stance. For each, give a \
                 short retrieval query that would find supporting evidence. \
                 Return ONLY a JSON array of {{core_argument, retrieval_query}}."
            ),
            model,
            max_tokens: 500,
            timeout: llm_timeout,
            response_schema: Some(core_args_schema()),
        };
        let core_response = llm.complete(core_req).await?;
        let core_args: Vec<CoreArgument> = serde_json::from_str(&core_response.text)
            .map_err(|e| Error::LlmSchema(format!("core-argument list not valid: {e}")))?;

        if core_args.is_empty() {
            return Err(Error::LlmSchema("core-argument list was empty".into()));
        }

        // (b) RAG fan-out, one call per query, run concurrently.
        let searches = core_args.iter().map(|a| async {
            rag.philosopher_search(&a.retrieval_query, &profile.key, 5, rag_timeout.per_source)
                .await
                .unwrap_or_default()
        });
        let evidence_per_arg: Vec<Vec<RagHit>> = join_all(searches).await;

        // (c) strengthen each argument with bounded concurrency.
        let semaphore = Arc::new(Semaphore::new(STRENGTHEN_CONCURRENCY));
        let strengthen_futures = core_args.iter().zip(evidence_per_arg.iter()).map(|(arg, evidence)| {
            let semaphore = semaphore.clone();
            async move {
                let _permit = semaphore.acquire().await.expect("semaphore not closed");
                strengthen_argument(llm, arg, evidence, model, llm_timeout).await
            }
        });
        let strengthened: Vec<Result<String>> = join_all(strengthen_futures).await;
        let strengthened: Vec<String> = strengthened.into_iter().collect::<Result<Vec<_>>>()?;

        // (d) synthesize final opening utterance.
        let all_evidence: Vec<RagHit> = evidence_per_arg.into_iter().flatten().collect();
        let synthesis_prompt = format!(
            "Topic: {topic}\nYour stance: {stance_statement}\n\n\
             Strengthened arguments:\n{}\n\n\
             Synthesize these into one cohesive opening statement in your voice. \
             Cite evidence with [n] markers where it strengthens a point.",
            strengthened.iter().enumerate().map(|(i, s)| format!("{}. {s}", i + 1)).collect::<Vec<_>>().join("\n")
        );
        let policy = length_policy(UtteranceKind::Opening);
        let synth_req = CompletionRequest {
            system_prompt: format!("You are {}. {}", profile.display_name, profile.debate_style),
            user_prompt: synthesis_prompt,
            model,
            max_tokens: policy.hard_cap,
            timeout: llm_timeout,
            response_schema: None,
        };
        let synth_response = llm.complete(synth_req).await?;

        let citations = derive_citations(&synth_response.text, &all_evidence);
        let rag_sources = citations
            .iter()
            .map(|c| debate_core::RagSource {
                source_name: c.source.clone(),
                snippet: c.snippet.clone(),
                relevance: None,
            })
            .collect::<Vec<_>>();

        Ok(PreparedOpening {
            text: synth_response.text,
            metadata: UtteranceMetadata {
                strategy_id: None,
                target_argument_id: None,
                rag_used: !all_evidence.is_empty(),
                rag_source_count: rag_sources.len() as u32,
                rag_sources,
                citations,
                fallback: false,
            },
            prepared_from: (topic.to_string(), stance_statement.to_string()),
        })
    }
}

async fn strengthen_argument(
    llm: &dyn LlmClient,
    arg: &CoreArgument,
    evidence: &[RagHit],
    model: ModelAlias,
    timeout: Duration,
) -> Result<String> {
    let evidence_list = evidence
        .iter()
        .enumerate()
        .map(|(i, h)| format!("[{}] ({:?}) {}: {}", i + 1, h.source_kind, h.title, h.snippet))
        .collect::<Vec<_>>()
        .join("\n");
    let req = CompletionRequest {
        system_prompt: "Strengthen the given argument using the retrieved evidence, if relevant.".to_string(),
        user_prompt: format!(
            "Argument: {}\n\nEvidence:\n{}\n\nReturn the strengthened argument as plain prose.",
            arg.core_argument, evidence_list
        ),
        model,
        max_tokens: 300,
        timeout,
        response_schema: None,
    };
    Ok(llm.complete(req).await?.text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use debate_core::AxisVector;

    fn profile() -> PhilosopherProfile {
        PhilosopherProfile {
            key: "kant".into(),
            display_name: "Immanuel Kant".into(),
            essence: "Duty above consequence".into(),
            debate_style: "Systematic".into(),
            personality: "Formal".into(),
            key_traits: vec![],
            representative_quote: String::new(),
            attack_weights: Default::default(),
            defense_weights: Default::default(),
            followup_weights: Default::default(),
            rag_affinity: 0.5,
            vulnerability_sensitivity: AxisVector::ZERO,
            rag_stat: AxisVector::ZERO,
        }
    }

    fn empty_rag() -> debate_rag::RagGatewayImpl {
        use debate_core::RagSourceKind;
        use debate_rag::MockSearchBackend;
        debate_rag::RagGatewayImpl::new(
            Arc::new(MockSearchBackend::empty(RagSourceKind::Web)),
            Arc::new(MockSearchBackend::empty(RagSourceKind::Vector)),
            Arc::new(MockSearchBackend::empty(RagSourceKind::Philosopher)),
        )
    }

    #[tokio::test]
    async fn pipeline_runs_all_four_stages_and_caches() {
        let mock = debate_llm::MockLlmClient::new("default");
        // push order is reversed relative to call order (LIFO queue).
        mock.push_response("Final synthesized opening [1].");
        mock.push_response("Strengthened argument text.");
        mock.push_response("Strengthened argument text.");
        mock.push_response(r#"[{"core_argument":"a1","retrieval_query":"q1"},{"core_argument":"a2","retrieval_query":"q2"}]"#);

        let rag = empty_rag();
        let preparer = OpeningPreparer::new();
        let profile = profile();

        let opening = preparer
            .get_prepared_or_generate(
                &mock,
                &rag,
                "kant",
                "AI rights",
                "AI deserves rights",
                Role::Pro,
                &profile,
                ModelAlias::Mid,
                Duration::from_secs(5),
                RagTimeoutPolicy::default(),
            )
            .await
            .unwrap();

        assert_eq!(opening.text, "Final synthesized opening [1].");
        assert_eq!(mock.call_count(), 4);

        let cached = preparer
            .get_prepared_or_generate(
                &mock,
                &rag,
                "kant",
                "AI rights",
                "AI deserves rights",
                Role::Pro,
                &profile,
                ModelAlias::Mid,
                Duration::from_secs(5),
                RagTimeoutPolicy::default(),
            )
            .await
            .unwrap();
        assert_eq!(cached.text, opening.text);
        assert_eq!(mock.call_count(), 4, "cache hit must not re-run the pipeline");
    }

    #[tokio::test]
    async fn invalidate_evicts_the_cache_entry() {
        let mock = debate_llm::MockLlmClient::new("default");
        mock.push_response("Opening v2.");
        mock.push_response("Strengthened.");
        mock.push_response(r#"[{"core_argument":"a1","retrieval_query":"q1"}]"#);
        mock.push_response("Opening v1.");
        mock.push_response("Strengthened.");
        mock.push_response(r#"[{"core_argument":"a1","retrieval_query":"q1"}]"#);

        let rag = empty_rag();
        let preparer = OpeningPreparer::new();
        let profile = profile();

        let first = preparer
            .get_prepared_or_generate(
                &mock, &rag, "kant", "AI rights", "stance", Role::Pro, &profile, ModelAlias::Mid,
                Duration::from_secs(5), RagTimeoutPolicy::default(),
            )
            .await
            .unwrap();
        assert_eq!(first.text, "Opening v1.");

        preparer.invalidate("kant", "AI rights", "stance");

        let second = preparer
            .get_prepared_or_generate(
                &mock, &rag, "kant", "AI rights", "stance", Role::Pro, &profile, ModelAlias::Mid,
                Duration::from_secs(5), RagTimeoutPolicy::default(),
            )
            .await
            .unwrap();
        assert_eq!(second.text, "Opening v2.");
    }
}
