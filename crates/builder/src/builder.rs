//! Argument Builder (spec.md §4.4): turns a [`BuildContext`] into one
//! [`Utterance`] via the LLM, with a retry-with-smaller-context on the first
//! timeout or network failure and a deterministic fallback on the second.

use std::time::Duration;

use debate_core::{
    CompletionRequest, Error, LlmClient, ModelAlias, RagSource, Result, Utterance, UtteranceMetadata,
};
use uuid::Uuid;

use crate::citations::derive_citations;
use crate::prompt::{length_policy, system_prompt, user_prompt, BuildContext};

/// Utterances shrunk to this many history entries on the retry-with-smaller-
/// context pass (spec.md §4.4: "retries once with a smaller context").
const RETRY_HISTORY_WINDOW: usize = 2;

fn fallback_text(speaker_id: &str) -> String {
    format!("{speaker_id} yields the turn")
}

async fn call_llm(llm: &dyn LlmClient, ctx: &BuildContext<'_>, model: ModelAlias, timeout: Duration) -> Result<String> {
    let policy = length_policy(ctx.kind);
    let req = CompletionRequest {
        system_prompt: system_prompt(ctx),
        user_prompt: user_prompt(ctx),
        model,
        max_tokens: policy.hard_cap,
        timeout,
        response_schema: None,
    };
    let response = llm.complete(req).await?;
    Ok(response.text)
}

/// Builds one utterance. `room_id` and an id generator seam (`Uuid::new_v4`)
/// are applied here; callers append the result to room history themselves.
pub async fn build_utterance(
    llm: &dyn LlmClient,
    room_id: &str,
    ctx: &BuildContext<'_>,
    speaker_id: &str,
    model: ModelAlias,
    timeout: Duration,
) -> Result<Utterance> {
    let first = call_llm(llm, ctx, model, timeout).await;

    let text = match first {
        Ok(text) => text,
        Err(Error::LlmTimeout(_)) | Err(Error::LlmNetwork(_)) => {
            let shrunk_history = &ctx.recent_history
                [ctx.recent_history.len().saturating_sub(RETRY_HISTORY_WINDOW)..];
            let retry_ctx = BuildContext { recent_history: shrunk_history, ..ctx.clone() };
            match call_llm(llm, &retry_ctx, model, timeout).await {
                Ok(text) => text,
                Err(_) => {
                    return Ok(fallback_utterance(room_id, ctx, speaker_id));
                }
            }
        }
        Err(_) => return Ok(fallback_utterance(room_id, ctx, speaker_id)),
    };

    let citations = derive_citations(&text, ctx.rag_bundle);
    let rag_sources: Vec<RagSource> = citations
        .iter()
        .map(|c| RagSource {
            source_name: c.source.clone(),
            snippet: c.snippet.clone(),
            relevance: None,
        })
        .collect();

    Ok(Utterance {
        id: Uuid::new_v4().to_string(),
        room_id: room_id.to_string(),
        speaker_id: speaker_id.to_string(),
        role: ctx.speaker_role,
        text,
        timestamp: chrono::Utc::now(),
        kind: ctx.kind,
        metadata: UtteranceMetadata {
            strategy_id: ctx.strategy.map(|s| s.id.clone()),
            target_argument_id: None,
            rag_used: !ctx.rag_bundle.is_empty(),
            rag_source_count: rag_sources.len() as u32,
            rag_sources,
            citations,
            fallback: false,
        },
    })
}

fn fallback_utterance(room_id: &str, ctx: &BuildContext<'_>, speaker_id: &str) -> Utterance {
    tracing::warn!(speaker_id, "builder fell back after two consecutive llm failures");
    Utterance {
        id: Uuid::new_v4().to_string(),
        room_id: room_id.to_string(),
        speaker_id: speaker_id.to_string(),
        role: ctx.speaker_role,
        text: fallback_text(speaker_id),
        timestamp: chrono::Utc::now(),
        kind: ctx.kind,
        metadata: UtteranceMetadata { fallback: true, ..Default::default() },
    }
}
