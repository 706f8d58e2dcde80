//! JSON Schema validation for structured LLM output (spec.md §4.2/§4.4:
//! argument-extraction and scoring prompts request schema-validated JSON;
//! schema-invalid output is retried once with a repair prompt).

use jsonschema::JSONSchema;
use serde_json::Value;

use crate::LlmError;

/// Validates `output` against `schema`, returning the first validation error
/// message on failure so callers can fold it into a repair prompt.
pub fn validate_schema(output: &Value, schema: &Value) -> Result<(), LlmError> {
    let compiled = JSONSchema::compile(schema)
        .map_err(|e| LlmError::Schema(format!("invalid schema: {e}")))?;
    match compiled.validate(output) {
        Ok(()) => Ok(()),
        Err(errors) => {
            let messages: Vec<String> = errors.map(|e| e.to_string()).collect();
            Err(LlmError::Schema(messages.join("; ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_matching_shape() {
        let schema = json!({
            "type": "object",
            "required": ["claim"],
            "properties": { "claim": { "type": "string" } }
        });
        assert!(validate_schema(&json!({"claim": "x"}), &schema).is_ok());
    }

    #[test]
    fn rejects_missing_required_field() {
        let schema = json!({
            "type": "object",
            "required": ["claim"],
            "properties": { "claim": { "type": "string" } }
        });
        assert!(validate_schema(&json!({}), &schema).is_err());
    }
}
