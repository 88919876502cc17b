//! Ollama `/api/generate` client.
//!
//! Non-streaming: one POST per generation, the whole reply in `response`.

use std::env;
use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::retry::{RetryConfig, RetryOutcome, send_with_retry};
use crate::{GenerationError, GenerationRequest, Generator, client_builder, read_capped_error_body};

/// Environment variable overriding the model server URL.
pub const OLLAMA_URL_ENV: &str = "CHECKR_OLLAMA_URL";
pub const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";

const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Serialize)]
struct GenerateBody<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateReply {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorReply {
    error: String,
}

#[derive(Debug, Clone)]
pub struct OllamaGenerator {
    client: reqwest::Client,
    endpoint: String,
    retry: RetryConfig,
}

impl OllamaGenerator {
    /// `endpoint` is the server base URL, e.g. `http://127.0.0.1:11434`.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        let client = client_builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            retry: RetryConfig::default(),
        })
    }

    /// Server from `CHECKR_OLLAMA_URL`, or the local default.
    pub fn from_env() -> Result<Self, reqwest::Error> {
        let endpoint = env::var(OLLAMA_URL_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string());
        Self::new(endpoint, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    #[must_use]
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn unavailable(request: &GenerationRequest, reason: impl Into<String>) -> GenerationError {
        GenerationError::ModelUnavailable {
            model: request.model.to_string(),
            reason: reason.into(),
        }
    }
}

/// Prefer the server's `{"error": ...}` message over the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorReply>(body)
        .map(|reply| reply.error)
        .unwrap_or_else(|_| body.trim().to_string())
}

impl Generator for OllamaGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let url = format!("{}/api/generate", self.endpoint);
        let prompt = request.prompt();
        let body = GenerateBody {
            model: request.model.as_str(),
            prompt: &prompt,
            stream: false,
            options: GenerateOptions {
                num_predict: request.max_length.get(),
            },
        };

        tracing::debug!(
            model = %request.model,
            max_length = request.max_length.get(),
            prompt_chars = prompt.chars().count(),
            "Sending generation request"
        );

        let outcome = send_with_retry(|| self.client.post(&url).json(&body), &self.retry).await;

        let response = match outcome {
            RetryOutcome::Success(response) => response,
            RetryOutcome::HttpError(response) => {
                let status = response.status();
                let message = error_message(&read_capped_error_body(response).await);
                if status == StatusCode::NOT_FOUND {
                    return Err(Self::unavailable(request, message));
                }
                return Err(GenerationError::GenerationFailed(format!(
                    "HTTP {status}: {message}"
                )));
            }
            RetryOutcome::ConnectionError { attempts, source } => {
                if source.is_connect() {
                    return Err(Self::unavailable(
                        request,
                        format!("cannot reach model server at {}: {source}", self.endpoint),
                    ));
                }
                return Err(GenerationError::GenerationFailed(format!(
                    "request failed after {attempts} attempt(s): {source}"
                )));
            }
        };

        let reply: GenerateReply = response.json().await.map_err(|e| {
            GenerationError::GenerationFailed(format!("unreadable reply from model server: {e}"))
        })?;

        if let Some(error) = reply.error {
            return Err(GenerationError::GenerationFailed(error));
        }

        let text = reply.response.unwrap_or_default();
        let text = text.trim();
        if text.is_empty() {
            return Err(GenerationError::GenerationFailed(
                "model returned no text".to_string(),
            ));
        }
        Ok(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use checkr_types::{MaxLength, ModelId, PromptTemplate};
    use serde_json::json;
    use std::num::NonZeroU32;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> GenerationRequest {
        GenerationRequest {
            model: ModelId::parse("qwen2.5:3b").unwrap(),
            prompt_template: PromptTemplate::new("Fix the grammar:").unwrap(),
            input: "The cat sit on mat".to_string(),
            max_length: MaxLength::new(NonZeroU32::new(64).unwrap()),
        }
    }

    fn generator(server: &MockServer) -> OllamaGenerator {
        OllamaGenerator::new(format!("{}/", server.uri()), Duration::from_secs(5))
            .unwrap()
            .with_retry_config(RetryConfig {
                max_retries: 2,
                initial_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(10),
                jitter_factor: 0.0,
            })
    }

    #[tokio::test]
    async fn sends_prompt_and_returns_trimmed_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(json!({
                "model": "qwen2.5:3b",
                "prompt": "Fix the grammar: The cat sit on mat",
                "stream": false,
                "options": { "num_predict": 64 }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "qwen2.5:3b",
                "response": "  The cat sits on the mat\n",
                "done": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = generator(&server).generate(&request()).await.unwrap();
        assert_eq!(text, "The cat sits on the mat");
    }

    #[tokio::test]
    async fn unknown_model_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(json!({ "error": "model 'qwen2.5:3b' not found" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let err = generator(&server).generate(&request()).await.unwrap_err();
        assert_eq!(
            err,
            GenerationError::ModelUnavailable {
                model: "qwen2.5:3b".to_string(),
                reason: "model 'qwen2.5:3b' not found".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn unreachable_server_is_unavailable() {
        // Bind and release a port so nothing is listening on it.
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let generator =
            OllamaGenerator::new(format!("http://127.0.0.1:{port}"), Duration::from_secs(5))
                .unwrap();

        let err = generator.generate(&request()).await.unwrap_err();
        match err {
            GenerationError::ModelUnavailable { reason, .. } => {
                assert!(reason.contains("cannot reach model server"), "{reason}");
            }
            other => panic!("expected ModelUnavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn server_errors_are_retried_then_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(500).set_body_string("out of memory"))
            .expect(3)
            .mount(&server)
            .await;

        let err = generator(&server).generate(&request()).await.unwrap_err();
        match err {
            GenerationError::GenerationFailed(message) => {
                assert!(message.contains("500"), "{message}");
                assert!(message.contains("out of memory"), "{message}");
            }
            other => panic!("expected GenerationFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn error_field_in_reply_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "error": "context overflow" })),
            )
            .mount(&server)
            .await;

        let err = generator(&server).generate(&request()).await.unwrap_err();
        assert_eq!(
            err,
            GenerationError::GenerationFailed("context overflow".to_string())
        );
    }

    #[tokio::test]
    async fn blank_reply_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": "  " })))
            .mount(&server)
            .await;

        let err = generator(&server).generate(&request()).await.unwrap_err();
        assert!(matches!(err, GenerationError::GenerationFailed(_)));
    }

    #[test]
    fn error_message_prefers_json_error_field() {
        assert_eq!(error_message(r#"{"error":"boom"}"#), "boom");
        assert_eq!(error_message(" plain text \n"), "plain text");
    }
}
