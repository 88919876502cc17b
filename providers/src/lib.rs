//! Text generation backends.
//!
//! The rest of Checkr only knows the [`Generator`] trait: hand it a
//! [`GenerationRequest`] (model, prompt template, raw input, length bound)
//! and get the rewritten text or a [`GenerationError`]. [`OllamaGenerator`]
//! implements it against a local Ollama-compatible model server.
//!
//! # Errors
//!
//! | Error | When |
//! |-------|------|
//! | `ModelUnavailable` | the server cannot be reached, or does not know the model |
//! | `GenerationFailed` | any other failure: bad status, malformed or empty reply |

mod ollama;
pub mod retry;

use std::future::Future;
use std::time::Duration;

use checkr_types::{MaxLength, ModelId, PromptTemplate};
use thiserror::Error;

pub use ollama::{DEFAULT_OLLAMA_URL, OLLAMA_URL_ENV, OllamaGenerator};

const CONNECT_TIMEOUT_SECS: u64 = 5;
const TCP_KEEPALIVE_SECS: u64 = 60;
const MAX_ERROR_BODY_BYTES: usize = 32 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("model '{model}' is unavailable: {reason}")]
    ModelUnavailable { model: String, reason: String },
    #[error("generation failed: {0}")]
    GenerationFailed(String),
}

/// Everything a backend needs for one generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub model: ModelId,
    pub prompt_template: PromptTemplate,
    pub input: String,
    pub max_length: MaxLength,
}

impl GenerationRequest {
    /// The text sent to the model: the template, one space, the input.
    #[must_use]
    pub fn prompt(&self) -> String {
        self.prompt_template.apply(&self.input)
    }
}

pub trait Generator: Send + Sync {
    fn generate(
        &self,
        request: &GenerationRequest,
    ) -> impl Future<Output = Result<String, GenerationError>> + Send;
}

fn client_builder() -> reqwest::ClientBuilder {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .redirect(reqwest::redirect::Policy::none())
        .tcp_keepalive(Some(Duration::from_secs(TCP_KEEPALIVE_SECS)))
}

/// Read an error body, truncated so a misbehaving server cannot flood the
/// message shown to the user.
async fn read_capped_error_body(mut response: reqwest::Response) -> String {
    let mut body = Vec::new();
    while let Ok(Some(chunk)) = response.chunk().await {
        body.extend_from_slice(&chunk);
        if body.len() > MAX_ERROR_BODY_BYTES {
            body.truncate(MAX_ERROR_BODY_BYTES);
            let text = String::from_utf8_lossy(&body);
            return format!("{text}...(truncated)");
        }
    }
    String::from_utf8_lossy(&body).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_joins_template_and_input_with_one_space() {
        let request = GenerationRequest {
            model: ModelId::parse("qwen2.5:3b").unwrap(),
            prompt_template: PromptTemplate::new("Fix the grammar:").unwrap(),
            input: "The cat sit on mat".to_string(),
            max_length: MaxLength::FALLBACK,
        };
        assert_eq!(request.prompt(), "Fix the grammar: The cat sit on mat");
    }

    #[test]
    fn error_messages_name_the_model() {
        let err = GenerationError::ModelUnavailable {
            model: "t5-base".to_string(),
            reason: "not found".to_string(),
        };
        assert_eq!(err.to_string(), "model 't5-base' is unavailable: not found");
    }
}
