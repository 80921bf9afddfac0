/// LLM Client — the single point of entry for all completion calls in the optimizer.
///
/// No other module talks to the provider directly; `optimize::optimizer` goes
/// through `LlmClient::complete`.
///
/// Model is hardcoded so every deployment produces comparable output.
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The model used for every optimization.
pub const MODEL: &str = "claude-sonnet-4-5";
const MAX_TOKENS: u32 = 4096;
const MAX_RETRIES: u32 = 3;
const REQUEST_TIMEOUT_SECS: u64 = 120;
const RETRY_BASE: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub content: Vec<ContentBlock>,
    pub usage: Usage,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmResponse {
    /// Extracts the text content from the first text block.
    pub fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

/// Wraps the Anthropic Messages API with retry logic.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    api_url: String,
    retry_base: Duration,
}

impl LlmClient {
    pub fn new(api_key: String) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            api_key,
            api_url: ANTHROPIC_API_URL.to_string(),
            retry_base: RETRY_BASE,
        })
    }

    /// Points the client at a different Messages endpoint (proxy or gateway).
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    #[cfg(test)]
    fn with_retry_base(mut self, retry_base: Duration) -> Self {
        self.retry_base = retry_base;
        self
    }

    /// Makes a raw call to the Messages API, returning the full response object.
    /// Retries transport failures, 429 (rate limit) and 5xx errors with
    /// exponential backoff; any other non-2xx fails at once.
    pub async fn call(&self, prompt: &str, system: &str) -> Result<LlmResponse, LlmError> {
        let request_body = AnthropicRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            system,
            messages: vec![AnthropicMessage {
                role: "user",
                content: prompt,
            }],
        };

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let delay = backoff_delay(self.retry_base, attempt);
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(&self.api_url)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .header("content-type", "application/json")
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM API returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message: provider_error_message(body),
                });
            }

            let llm_response: LlmResponse = response.json().await?;

            debug!(
                "LLM call succeeded: input_tokens={}, output_tokens={}",
                llm_response.usage.input_tokens, llm_response.usage.output_tokens
            );

            return Ok(llm_response);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }

    /// Calls the LLM and returns the first text block as an owned string.
    pub async fn complete(&self, prompt: &str, system: &str) -> Result<String, LlmError> {
        let response = self.call(prompt, system).await?;
        completion_text(&response)
    }
}

/// Delay before retry `attempt` (1-based): base, 2×base, 4×base, ...
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base * (1 << (attempt - 1))
}

fn completion_text(response: &LlmResponse) -> Result<String, LlmError> {
    match response.text() {
        Some(text) if !text.trim().is_empty() => Ok(text.to_string()),
        _ => Err(LlmError::EmptyContent),
    }
}

/// Pulls `error.message` out of a provider error body, falling back to the raw body.
fn provider_error_message(body: String) -> String {
    serde_json::from_str::<AnthropicError>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body)
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use axum::{
        extract::State,
        http::StatusCode,
        response::{IntoResponse, Response},
        routing::post,
        Json, Router,
    };
    use serde_json::json;

    use super::*;

    /// Replays one status per request; every hit past the script gets a 500.
    #[derive(Clone)]
    struct ScriptedProvider {
        statuses: Arc<Vec<u16>>,
        hits: Arc<AtomicUsize>,
    }

    async fn messages(State(provider): State<ScriptedProvider>) -> Response {
        let hit = provider.hits.fetch_add(1, Ordering::SeqCst);
        let status = provider.statuses.get(hit).copied().unwrap_or(500);
        if status == 200 {
            return Json(json!({
                "content": [{"type": "text", "text": "Optimized content"}],
                "usage": {"input_tokens": 12, "output_tokens": 2}
            }))
            .into_response();
        }
        let status = StatusCode::from_u16(status).unwrap();
        let body = json!({
            "type": "error",
            "error": {"type": "scripted", "message": format!("scripted {}", status.as_u16())}
        });
        (status, Json(body)).into_response()
    }

    /// Starts a provider on an ephemeral port and returns a client aimed at it.
    async fn scripted_client(statuses: &[u16]) -> (LlmClient, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let provider = ScriptedProvider {
            statuses: Arc::new(statuses.to_vec()),
            hits: hits.clone(),
        };
        let app = Router::new()
            .route("/v1/messages", post(messages))
            .with_state(provider);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = LlmClient::new("test-key".to_string())
            .unwrap()
            .with_api_url(format!("http://{addr}/v1/messages"))
            .with_retry_base(Duration::from_millis(5));
        (client, hits)
    }

    #[test]
    fn test_backoff_doubles_from_base() {
        assert_eq!(backoff_delay(RETRY_BASE, 1), Duration::from_secs(1));
        assert_eq!(backoff_delay(RETRY_BASE, 2), Duration::from_secs(2));
        assert_eq!(
            backoff_delay(Duration::from_millis(5), 3),
            Duration::from_millis(20)
        );
    }

    #[tokio::test]
    async fn test_rate_limits_are_retried_until_success() {
        let (client, hits) = scripted_client(&[429, 429, 200]).await;

        let text = client.complete("prompt", "system").await.unwrap();

        assert_eq!(text, "Optimized content");
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_client_error_fails_without_retry() {
        let (client, hits) = scripted_client(&[400, 200]).await;

        let err = client.call("prompt", "system").await.unwrap_err();

        match err {
            LlmError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "scripted 400");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_server_errors_exhaust_attempts() {
        let (client, hits) = scripted_client(&[503, 503, 503, 200]).await;

        let err = client.call("prompt", "system").await.unwrap_err();

        assert!(matches!(err, LlmError::Api { status: 503, .. }));
        assert_eq!(hits.load(Ordering::SeqCst), MAX_RETRIES as usize);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_http_error() {
        // Bind then drop so the port is very likely closed.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = LlmClient::new("test-key".to_string())
            .unwrap()
            .with_api_url(format!("http://{addr}/v1/messages"))
            .with_retry_base(Duration::from_millis(5));

        let err = client.call("prompt", "system").await.unwrap_err();
        assert!(matches!(err, LlmError::Http(_)));
    }

    fn response_from(json: &str) -> LlmResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_text_skips_non_text_blocks() {
        let response = response_from(
            r#"{
                "content": [
                    {"type": "tool_use"},
                    {"type": "text", "text": "JANE DOE\nRust Engineer"}
                ],
                "usage": {"input_tokens": 10, "output_tokens": 4}
            }"#,
        );
        assert_eq!(response.text(), Some("JANE DOE\nRust Engineer"));
    }

    #[test]
    fn test_completion_text_rejects_blank_output() {
        let response = response_from(
            r#"{"content": [{"type": "text", "text": "   "}], "usage": {"input_tokens": 1, "output_tokens": 0}}"#,
        );
        assert!(matches!(
            completion_text(&response),
            Err(LlmError::EmptyContent)
        ));
    }

    #[test]
    fn test_completion_text_rejects_missing_text_block() {
        let response =
            response_from(r#"{"content": [], "usage": {"input_tokens": 1, "output_tokens": 0}}"#);
        assert!(matches!(
            completion_text(&response),
            Err(LlmError::EmptyContent)
        ));
    }

    #[test]
    fn test_provider_error_message_parsed() {
        let body =
            r#"{"type":"error","error":{"type":"authentication_error","message":"invalid x-api-key"}}"#;
        assert_eq!(provider_error_message(body.to_string()), "invalid x-api-key");
    }

    #[test]
    fn test_provider_error_message_falls_back_to_raw_body() {
        assert_eq!(
            provider_error_message("upstream unavailable".to_string()),
            "upstream unavailable"
        );
    }

    #[test]
    fn test_request_serializes_single_user_message() {
        let request = AnthropicRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            system: "sys",
            messages: vec![AnthropicMessage {
                role: "user",
                content: "hello",
            }],
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], MODEL);
        assert_eq!(value["system"], "sys");
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][0]["content"], "hello");
    }
}
