//! Session driven against a mock Ollama server

use checkr_engine::{GenerationError, Notice, Outcome, Segment, View};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::common::{
    mount_generate_response, mount_missing_model, ollama_generator, open_session, settings_dir,
    start_ollama_mock,
};

#[tokio::test]
async fn grammar_fix_round_trip() {
    let server = start_ollama_mock().await;
    mount_generate_response(&server, "  The cat sits on the mat\n").await;

    let (_dir, paths) = settings_dir();
    let mut session = open_session(&paths, ollama_generator(&server));

    assert_eq!(session.submit("The cat sit on mat").await, Outcome::Generated);
    assert_eq!(session.processing().last_output(), "The cat sits on the mat");
    assert_eq!(
        session.view(),
        View::Diff(vec![
            Segment::Unchanged("The cat".to_string()),
            Segment::Changed("sits".to_string()),
            Segment::Unchanged("on".to_string()),
            Segment::Changed("the".to_string()),
            Segment::Unchanged("mat".to_string()),
        ])
    );
}

#[tokio::test]
async fn request_body_follows_settings() {
    let server = start_ollama_mock().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(serde_json::json!({
            "model": "llama3.2:1b",
            "stream": false,
            "options": { "num_predict": 32 }
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "response": "Short." })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (_dir, paths) = settings_dir();
    let mut session = open_session(&paths, ollama_generator(&server));
    session.update_setting("LLM", "model", "llama3.2:1b").unwrap();
    session.update_setting("LLM", "max_length", "32").unwrap();
    session.select_action("summarize").unwrap();

    assert_eq!(session.submit("A long text.").await, Outcome::Generated);
    assert_eq!(session.view(), View::Plain("Short.".to_string()));
}

#[tokio::test]
async fn missing_model_is_reported_without_caching() {
    let server = start_ollama_mock().await;
    mount_missing_model(&server, "qwen2.5:3b").await;

    let (_dir, paths) = settings_dir();
    let mut session = open_session(&paths, ollama_generator(&server));

    let outcome = session.submit("Some text").await;
    assert!(
        matches!(
            &outcome,
            Outcome::Failed(Notice::Generation(GenerationError::ModelUnavailable { model, .. }))
                if model == "qwen2.5:3b"
        ),
        "{outcome:?}"
    );
    assert!(matches!(session.view(), View::Error(message) if message.contains("not found")));

    // the failed input is tried again on the next submit
    let _ = session.submit("Some text").await;
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
}
