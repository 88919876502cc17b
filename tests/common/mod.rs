//! Shared test utilities and fixtures
//!
//! Common infrastructure for integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use checkr_engine::{
    ConfigPaths, ConfigStore, GenerationError, GenerationRequest, Generator, OllamaGenerator,
    Session,
};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Generator that replays canned replies and records every request.
#[derive(Default)]
pub struct FakeGenerator {
    replies: Mutex<VecDeque<Result<String, GenerationError>>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl FakeGenerator {
    pub fn replying(replies: impl IntoIterator<Item = Result<String, GenerationError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl Generator for FakeGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GenerationError::GenerationFailed("no reply left".into())))
    }
}

/// Settings directory with no files: the built-in defaults apply.
pub fn settings_dir() -> (TempDir, ConfigPaths) {
    let dir = tempfile::tempdir().unwrap();
    let paths = ConfigPaths::in_dir(dir.path());
    (dir, paths)
}

pub fn open_session<G: Generator>(paths: &ConfigPaths, generator: G) -> Session<G> {
    let opened = ConfigStore::open(paths.clone()).unwrap();
    assert!(opened.recovered.is_empty(), "{:?}", opened.recovered);
    Session::new(opened.store, generator)
}

/// Start a mock server that simulates a local Ollama server
pub async fn start_ollama_mock() -> MockServer {
    MockServer::start().await
}

pub fn ollama_generator(server: &MockServer) -> OllamaGenerator {
    OllamaGenerator::new(server.uri(), Duration::from_secs(5)).unwrap()
}

/// Mount a non-streaming `/api/generate` reply
pub async fn mount_generate_response(server: &MockServer, response: &str) {
    let body = serde_json::json!({
        "model": "qwen2.5:3b",
        "created_at": "2024-01-01T00:00:00Z",
        "response": response,
        "done": true
    });

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Mount the reply Ollama sends for a model that has not been pulled
pub async fn mount_missing_model(server: &MockServer, model: &str) {
    let body = serde_json::json!({
        "error": format!("model '{model}' not found, try pulling it first")
    });

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(404).set_body_json(body))
        .mount(server)
        .await;
}
