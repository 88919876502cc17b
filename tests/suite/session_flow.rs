//! End-to-end session behaviour against a fake generator

use std::fs;

use checkr_engine::{GenerationError, Outcome, Segment, SkipReason, View};

use crate::common::{FakeGenerator, open_session, settings_dir};

#[tokio::test]
async fn user_action_from_settings_file_drives_prompt_and_diff() {
    let (_dir, paths) = settings_dir();
    fs::write(
        &paths.active,
        "[LLM]\naction = shout\n\n[PROMPTS]\nshout = Rewrite in capitals:\n\n[DIFFS]\nshout = True\n",
    )
    .unwrap();

    let generator = FakeGenerator::replying([Ok("HELLO world".to_string())]);
    let mut session = open_session(&paths, generator);

    assert_eq!(session.submit("hello world").await, Outcome::Generated);
    assert_eq!(
        session.view(),
        View::Diff(vec![
            Segment::Changed("HELLO".to_string()),
            Segment::Unchanged("world".to_string()),
        ])
    );
    assert_eq!(session.change_stats(), Some((1, 1)));
    assert_eq!(
        session.generator().requests()[0].prompt(),
        "Rewrite in capitals: hello world"
    );
}

#[tokio::test]
async fn request_carries_model_and_length_settings() {
    let (_dir, paths) = settings_dir();
    let mut session = open_session(&paths, FakeGenerator::replying([Ok("ok".to_string())]));
    session.update_setting("LLM", "model", "llama3.2:1b").unwrap();
    session.update_setting("LLM", "max_length", "64").unwrap();

    session.submit("check this").await;

    let requests = session.generator().requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].model.as_str(), "llama3.2:1b");
    assert_eq!(requests[0].max_length.get(), 64);
    assert_eq!(requests[0].input, "check this");
}

#[tokio::test]
async fn generation_count_follows_input_changes() {
    let (_dir, paths) = settings_dir();
    let replies = (0..8).map(|i| Ok(format!("out {i}")));
    let mut session = open_session(&paths, FakeGenerator::replying(replies));

    for input in ["x", "x", "y", "x", "x", ""] {
        session.submit(input).await;
    }
    assert_eq!(session.generator().calls(), 3);

    session.clear();
    assert_eq!(session.view(), View::Empty);
    assert_eq!(session.submit("x").await, Outcome::Generated);
    assert_eq!(session.generator().calls(), 4);
}

#[tokio::test]
async fn stale_selected_action_is_a_noop_until_reselected() {
    let (_dir, paths) = settings_dir();
    fs::write(
        &paths.active,
        "[LLM]\naction = grammar\n\n[PROMPTS]\ntidy = Tidy this up:\n",
    )
    .unwrap();

    let generator = FakeGenerator::replying([Ok("Tidy text".to_string())]);
    let mut session = open_session(&paths, generator);

    assert!(matches!(
        session.submit("tidy text").await,
        Outcome::NoOp(err) if err.0 == "grammar"
    ));
    assert_eq!(session.generator().calls(), 0);

    session.select_action("tidy").unwrap();
    assert_eq!(session.submit("tidy text").await, Outcome::Generated);
    assert_eq!(session.view(), View::Plain("Tidy text".to_string()));
}

#[tokio::test]
async fn failed_generation_keeps_session_usable() {
    let (_dir, paths) = settings_dir();
    let generator = FakeGenerator::replying([
        Err(GenerationError::GenerationFailed("HTTP 500: boom".to_string())),
        Ok("Fine now.".to_string()),
    ]);
    let mut session = open_session(&paths, generator);

    assert!(matches!(session.submit("fine now").await, Outcome::Failed(_)));
    assert_eq!(
        session.view(),
        View::Error("generation failed: HTTP 500: boom".to_string())
    );

    assert_eq!(session.submit("fine now").await, Outcome::Generated);
    assert!(matches!(session.view(), View::Diff(_)));
    assert_eq!(
        session.submit("fine now").await,
        Outcome::Skipped(SkipReason::AlreadyProcessed)
    );
}
