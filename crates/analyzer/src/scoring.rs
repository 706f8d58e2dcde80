//! Vulnerability scoring: one LLM call per argument, or one batched call
//! across all extracted arguments when the caller requests batch mode
//! (spec.md §4.2 step 2).

use std::time::Duration;

use debate_core::{AxisVector, CompletionRequest, Error, LlmClient, ModelAlias, Result};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::extraction::ExtractedClaim;

#[derive(Debug, Clone, Deserialize)]
struct ScoreShape {
    data_respect: f64,
    conceptual_precision: f64,
    systematic_logic: f64,
    pragmatic_orientation: f64,
    rhetorical_independence: f64,
    overall: f64,
}

impl From<ScoreShape> for (AxisVector, f64) {
    fn from(s: ScoreShape) -> Self {
        (
            AxisVector {
                data_respect: s.data_respect,
                conceptual_precision: s.conceptual_precision,
                systematic_logic: s.systematic_logic,
                pragmatic_orientation: s.pragmatic_orientation,
                rhetorical_independence: s.rhetorical_independence,
            },
            s.overall,
        )
    }
}

fn score_schema() -> Value {
    json!({
        "type": "object",
        "required": ["data_respect", "conceptual_precision", "systematic_logic", "pragmatic_orientation", "rhetorical_independence", "overall"],
        "properties": {
            "data_respect": { "type": "number", "minimum": 0.0, "maximum": 1.0 },
            "conceptual_precision": { "type": "number", "minimum": 0.0, "maximum": 1.0 },
            "systematic_logic": { "type": "number", "minimum": 0.0, "maximum": 1.0 },
            "pragmatic_orientation": { "type": "number", "minimum": 0.0, "maximum": 1.0 },
            "rhetorical_independence": { "type": "number", "minimum": 0.0, "maximum": 1.0 },
            "overall": { "type": "number", "minimum": 0.0, "maximum": 1.0 }
        }
    })
}

fn batch_score_schema() -> Value {
    json!({ "type": "array", "items": score_schema() })
}

fn prompt_for(claim: &ExtractedClaim) -> String {
    format!(
        "Claim: {}\nPremises: {:?}\nEvidence: {:?}\n\n\
         Score this claim's vulnerability to rhetorical attack along five axes \
         (data_respect, conceptual_precision, systematic_logic, pragmatic_orientation, \
         rhetorical_independence), each in [0,1], plus an `overall` score in [0,1]. \
         Return ONLY the JSON object.",
        claim.claim, claim.premises, claim.evidence
    )
}

/// Scores one argument with a single LLM call.
pub async fn score_argument(
    llm: &dyn LlmClient,
    claim: &ExtractedClaim,
    model: ModelAlias,
    timeout: Duration,
) -> Result<(AxisVector, f64)> {
    let req = CompletionRequest {
        system_prompt: "You are a rigorous debate-argument critic.".to_string(),
        user_prompt: prompt_for(claim),
        model,
        max_tokens: 200,
        timeout,
        response_schema: Some(score_schema()),
    };
    let response = llm.complete(req).await?;
    let value: Value = serde_json::from_str(&response.text)
        .map_err(|e| Error::LlmSchema(format!("score output not valid json: {e}")))?;
    let shape: ScoreShape = serde_json::from_value(value)
        .map_err(|e| Error::LlmSchema(format!("score output missing fields: {e}")))?;
    Ok(shape.into())
}

/// Scores every argument in one list-schema LLM call (spec.md §4.2:
/// "callers may request batch mode which scores all in one call").
pub async fn score_batch(
    llm: &dyn LlmClient,
    claims: &[ExtractedClaim],
    model: ModelAlias,
    timeout: Duration,
) -> Result<Vec<(AxisVector, f64)>> {
    if claims.is_empty() {
        return Ok(Vec::new());
    }
    let joined = claims
        .iter()
        .enumerate()
        .map(|(i, c)| format!("[{i}] {}", prompt_for(c)))
        .collect::<Vec<_>>()
        .join("\n\n");

    let req = CompletionRequest {
        system_prompt: "You are a rigorous debate-argument critic. Score every claim listed.".to_string(),
        user_prompt: joined,
        model,
        max_tokens: 200 * claims.len() as u32,
        timeout,
        response_schema: Some(batch_score_schema()),
    };
    let response = llm.complete(req).await?;
    let value: Value = serde_json::from_str(&response.text)
        .map_err(|e| Error::LlmSchema(format!("batch score output not valid json: {e}")))?;
    let shapes: Vec<ScoreShape> = serde_json::from_value(value)
        .map_err(|e| Error::LlmSchema(format!("batch score output missing fields: {e}")))?;
    Ok(shapes.into_iter().map(Into::into).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claim() -> ExtractedClaim {
        ExtractedClaim {
            claim: "AI lacks moral agency".into(),
            premises: vec!["no intent".into()],
            evidence: vec![],
            key_concept: "agency".into(),
        }
    }

    #[tokio::test]
    async fn scores_a_single_argument() {
        let mock = debate_llm::MockLlmClient::new("{}");
        mock.push_response(
            r#"{"data_respect":0.5,"conceptual_precision":0.8,"systematic_logic":0.6,"pragmatic_orientation":0.2,"rhetorical_independence":0.1,"overall":0.7}"#,
        );
        let (axes, overall) =
            score_argument(&mock, &claim(), ModelAlias::Low, Duration::from_secs(1)).await.unwrap();
        assert_eq!(overall, 0.7);
        assert_eq!(axes.conceptual_precision, 0.8);
    }

    #[tokio::test]
    async fn batch_scores_all_claims_in_one_call() {
        let mock = debate_llm::MockLlmClient::new("[]");
        mock.push_response(
            r#"[{"data_respect":0.1,"conceptual_precision":0.2,"systematic_logic":0.3,"pragmatic_orientation":0.4,"rhetorical_independence":0.5,"overall":0.3},
                {"data_respect":0.6,"conceptual_precision":0.7,"systematic_logic":0.8,"pragmatic_orientation":0.9,"rhetorical_independence":0.1,"overall":0.6}]"#,
        );
        let claims = vec![claim(), claim()];
        let scored = score_batch(&mock, &claims, ModelAlias::Low, Duration::from_secs(1)).await.unwrap();
        assert_eq!(scored.len(), 2);
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn empty_claims_skip_the_call() {
        let mock = debate_llm::MockLlmClient::new("[]");
        let scored = score_batch(&mock, &[], ModelAlias::Low, Duration::from_secs(1)).await.unwrap();
        assert!(scored.is_empty());
        assert_eq!(mock.call_count(), 0);
    }
}
