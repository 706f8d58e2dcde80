//! Claim extraction: one structured LLM call per utterance, schema-validated
//! with one repair retry (spec.md §4.2 step 1).

use debate_core::{CompletionRequest, Error, LlmClient, ModelAlias, Result};
use jsonschema::JSONSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use unicode_segmentation::UnicodeSegmentation;

/// Up to K=3 [`ExtractedClaim`]s are kept per utterance (spec.md §4.2).
pub const MAX_ARGUMENTS: usize = 3;

/// Utterances longer than this are truncated at a sentence boundary before
/// being sent to the extraction prompt (spec.md §4.2 edge case).
pub const TRUNCATE_CHARS: usize = 4000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedClaim {
    pub claim: String,
    #[serde(default)]
    pub premises: Vec<String>,
    #[serde(default)]
    pub evidence: Vec<String>,
    #[serde(default)]
    pub key_concept: String,
}

pub fn extraction_schema() -> Value {
    json!({
        "type": "array",
        "items": {
            "type": "object",
            "required": ["claim"],
            "properties": {
                "claim": { "type": "string" },
                "premises": { "type": "array", "items": { "type": "string" } },
                "evidence": { "type": "array", "items": { "type": "string" } },
                "key_concept": { "type": "string" }
            }
        }
    })
}

/// Truncates `text` to at most `max_chars` bytes, cutting at the last
/// sentence boundary (`.`, `?`, `!`) at or before the limit rather than
/// mid-sentence. The cut point is always snapped to a grapheme-cluster
/// boundary first so multi-byte scripts (Chinese, Arabic, Hindi, ...) never
/// get sliced mid-codepoint.
pub fn truncate_at_sentence_boundary(text: &str, max_chars: usize) -> String {
    if text.len() <= max_chars {
        return text.to_string();
    }
    let boundary = text
        .grapheme_indices(true)
        .map(|(idx, _)| idx)
        .take_while(|&idx| idx <= max_chars)
        .last()
        .unwrap_or(0);
    let window = &text[..boundary];
    let cut = window
        .rfind(['.', '?', '!'])
        .map(|idx| idx + 1)
        .unwrap_or(boundary);
    window[..cut].to_string()
}

fn validate(schema: &Value, value: &Value) -> std::result::Result<(), String> {
    let compiled = JSONSchema::compile(schema).map_err(|e| e.to_string())?;
    compiled.validate(value).map_err(|errors| {
        errors.map(|e| e.to_string()).collect::<Vec<_>>().join("; ")
    })
}

/// Extracts up to [`MAX_ARGUMENTS`] claims from `text`. Empty input yields
/// an empty list without calling the LLM. On two consecutive schema
/// failures (initial + one repair retry), returns an empty list — there is
/// nothing to mark `extraction-failed` on since no arguments exist yet.
pub async fn extract_claims(
    llm: &dyn LlmClient,
    text: &str,
    model: ModelAlias,
    timeout: Duration,
) -> Result<Vec<ExtractedClaim>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    let truncated = truncate_at_sentence_boundary(trimmed, TRUNCATE_CHARS);
    let schema = extraction_schema();

    let system_prompt = "Extract the speaker's argumentative claims as a JSON array. \
        Each item has `claim`, `premises` (list), `evidence` (list), and `key_concept`. \
        Return ONLY the JSON array, no prose."
        .to_string();

    let first = call_and_parse(llm, &system_prompt, &truncated, model, timeout, &schema, None).await;
    let claims = match first {
        Ok(claims) => claims,
        Err(repair_reason) => {
            let repaired =
                call_and_parse(llm, &system_prompt, &truncated, model, timeout, &schema, Some(&repair_reason))
                    .await;
            match repaired {
                Ok(claims) => claims,
                Err(reason) => {
                    tracing::warn!(reason = %reason, "argument extraction failed after repair retry");
                    return Ok(Vec::new());
                }
            }
        }
    };

    Ok(claims.into_iter().take(MAX_ARGUMENTS).collect())
}

async fn call_and_parse(
    llm: &dyn LlmClient,
    system_prompt: &str,
    text: &str,
    model: ModelAlias,
    timeout: Duration,
    schema: &Value,
    repair_reason: Option<&str>,
) -> std::result::Result<Vec<ExtractedClaim>, String> {
    let user_prompt = match repair_reason {
        None => format!("Speaker text:\n{text}"),
        Some(reason) => format!(
            "Speaker text:\n{text}\n\nYour previous output failed validation: {reason}. \
             Return strictly valid JSON matching the schema."
        ),
    };

    let req = CompletionRequest {
        system_prompt: system_prompt.to_string(),
        user_prompt,
        model,
        max_tokens: 800,
        timeout,
        response_schema: Some(schema.clone()),
    };

    let response = llm_complete_or_reason(llm, req).await?;
    let value: Value = serde_json::from_str(&response.text).map_err(|e| e.to_string())?;
    validate(schema, &value)?;
    serde_json::from_value(value).map_err(|e| e.to_string())
}

async fn llm_complete_or_reason(
    llm: &dyn LlmClient,
    req: CompletionRequest,
) -> std::result::Result<debate_core::CompletionResponse, String> {
    llm.complete(req).await.map_err(|e: Error| e.to_string())
}
