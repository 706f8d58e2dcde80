//! Implementations of [`debate_core::LlmClient`] (spec.md §6.1).
//!
//! [`HttpLlmClient`] is the production backend: a single `reqwest` POST,
//! grounded on the teacher's `ClaudeBackend::generate_with_tools`
//! (`claude.rs`) for the request/response shape and its timeout wiring.
//! [`MockLlmClient`] is the test double, grounded on `adapter.rs`'s
//! `MockBackend` pattern: canned responses, optionally schema-checked,
//! used throughout `debate-analyzer`/`debate-builder`/`debate-scheduler`
//! tests in place of a live model.

use std::sync::Arc;

use async_trait::async_trait;
use debate_core::{CompletionRequest, CompletionResponse, Error, LlmClient, Result};
use parking_lot::Mutex;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::model_resolver::ModelResolver;

#[derive(Debug, Clone)]
pub struct HttpLlmConfig {
    pub endpoint: String,
    pub api_key: String,
    pub resolver: ModelResolver,
}

/// Production [`LlmClient`]: one HTTP call per `complete`, timing out at
/// `req.timeout` the way the teacher bounds every backend call with
/// `reqwest::Client::builder().timeout(...)`.
pub struct HttpLlmClient {
    client: Client,
    config: HttpLlmConfig,
}

impl HttpLlmClient {
    pub fn new(config: HttpLlmConfig) -> Self {
        Self { client: Client::new(), config }
    }
}

#[derive(Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<ApiMessage<'a>>,
}

#[derive(Serialize)]
struct ApiMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ApiResponse {
    content: Vec<ApiContentBlock>,
    usage: ApiUsage,
}

#[derive(Deserialize)]
struct ApiContentBlock {
    text: String,
}

#[derive(Deserialize)]
struct ApiUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn complete(&self, req: CompletionRequest) -> Result<CompletionResponse> {
        let model = self.config.resolver.resolve(req.model);
        let body = ApiRequest {
            model,
            max_tokens: req.max_tokens,
            system: &req.system_prompt,
            messages: vec![ApiMessage { role: "user", content: &req.user_prompt }],
        };

        let sent = self
            .client
            .post(format!("{}/v1/messages", self.config.endpoint))
            .header("x-api-key", &self.config.api_key)
            .timeout(req.timeout)
            .json(&body)
            .send();

        let response = tokio::time::timeout(req.timeout, sent)
            .await
            .map_err(|_| Error::LlmTimeout(req.timeout))?
            .map_err(|e| Error::LlmNetwork(e.to_string()))?;

        let parsed: ApiResponse = response
            .json()
            .await
            .map_err(|e| Error::LlmSchema(format!("invalid response body: {e}")))?;

        let text = parsed.content.into_iter().map(|b| b.text).collect::<Vec<_>>().join("");

        if let Some(schema) = &req.response_schema {
            let value: serde_json::Value = serde_json::from_str(&text)
                .map_err(|e| Error::LlmSchema(format!("output not valid json: {e}")))?;
            crate::schema::validate_schema(&value, schema)
                .map_err(|e| Error::LlmSchema(e.to_string()))?;
        }

        Ok(CompletionResponse {
            text,
            input_tokens: parsed.usage.input_tokens,
            output_tokens: parsed.usage.output_tokens,
        })
    }
}

/// Canned response queue, consumed FIFO, used wherever tests need a
/// deterministic [`LlmClient`] without network access.
pub struct MockLlmClient {
    responses: Mutex<Vec<Result<CompletionResponse>>>,
    default_response: String,
    calls: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockLlmClient {
    pub fn new(default_response: impl Into<String>) -> Self {
        Self {
            responses: Mutex::new(Vec::new()),
            default_response: default_response.into(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queues a scripted response for the next `complete` call.
    pub fn push_response(&self, text: impl Into<String>) {
        self.responses.lock().push(Ok(CompletionResponse {
            text: text.into(),
            input_tokens: 10,
            output_tokens: 10,
        }));
    }

    pub fn push_error(&self, err: Error) {
        self.responses.lock().push(Err(err));
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, req: CompletionRequest) -> Result<CompletionResponse> {
        self.calls.lock().push(req.clone());
        if let Some(next) = self.responses.lock().pop() {
            return next;
        }
        Ok(CompletionResponse {
            text: self.default_response.clone(),
            input_tokens: 1,
            output_tokens: 1,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use debate_core::ModelAlias;
    use std::time::Duration;

    fn req() -> CompletionRequest {
        CompletionRequest {
            system_prompt: "sys".into(),
            user_prompt: "user".into(),
            model: ModelAlias::Mid,
            max_tokens: 100,
            timeout: Duration::from_secs(1),
            response_schema: None,
        }
    }

    #[tokio::test]
    async fn mock_returns_default_when_queue_empty() {
        let mock = MockLlmClient::new("fallback text");
        let resp = mock.complete(req()).await.unwrap();
        assert_eq!(resp.text, "fallback text");
    }

    #[tokio::test]
    async fn mock_returns_queued_response_first() {
        let mock = MockLlmClient::new("fallback");
        mock.push_response("queued");
        let resp = mock.complete(req()).await.unwrap();
        assert_eq!(resp.text, "queued");
    }

    #[tokio::test]
    async fn mock_tracks_call_count() {
        let mock = MockLlmClient::new("x");
        mock.complete(req()).await.unwrap();
        mock.complete(req()).await.unwrap();
        assert_eq!(mock.call_count(), 2);
    }
}
