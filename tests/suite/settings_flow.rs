//! Settings edits through a session, checked against the files on disk

use std::fs;

use checkr_engine::{ConfigError, ConfigLayer, ConfigPaths, ConfigStore, Outcome, View};

use crate::common::{FakeGenerator, open_session, settings_dir};

fn reopen(paths: &ConfigPaths) -> ConfigStore {
    ConfigStore::open(paths.clone()).unwrap().store
}

#[test]
fn setting_change_is_written_before_returning() {
    let (_dir, paths) = settings_dir();
    let mut session = open_session(&paths, FakeGenerator::default());

    session.update_setting("llm", "MAX_LENGTH", "128").unwrap();
    session.update_setting("UI", "show_spinner", "False").unwrap();

    let text = fs::read_to_string(&paths.active).unwrap();
    assert!(text.contains("max_length = 128"), "{text}");
    assert!(text.contains("show_spinner = False"), "{text}");

    let reopened = reopen(&paths);
    assert_eq!(reopened.active().llm.max_length.get(), 128);
    assert!(!reopened.active().ui.show_spinner);
}

#[test]
fn rejected_setting_leaves_file_and_memory_alone() {
    let (_dir, paths) = settings_dir();
    let mut session = open_session(&paths, FakeGenerator::default());
    session.update_setting("LLM", "max_length", "100").unwrap();
    let before = fs::read_to_string(&paths.active).unwrap();

    for (section, key, value) in [
        ("LLM", "max_length", "0"),
        ("LLM", "max_length", "many"),
        ("UI", "show_spinner", "yes"),
        ("DIFFS", "translate", "True"),
        ("LLM", "temperature", "0.2"),
    ] {
        assert!(
            session.update_setting(section, key, value).is_err(),
            "{section}.{key} = {value}"
        );
    }

    assert_eq!(fs::read_to_string(&paths.active).unwrap(), before);
    assert_eq!(session.config().llm.max_length.get(), 100);
}

#[tokio::test]
async fn restore_defaults_brings_back_shipped_actions() {
    let (_dir, paths) = settings_dir();
    let mut session = open_session(&paths, FakeGenerator::replying([Ok("Done.".to_string())]));

    session
        .add_action("shout", "Rewrite in capitals:", true)
        .unwrap();
    session.select_action("shout").unwrap();
    session.remove_action("summarize").unwrap();
    assert!(matches!(
        session.remove_action("shout"),
        Err(ConfigError::ActionInUse(_))
    ));

    let names: Vec<_> = session.list_actions().iter().map(|n| n.to_string()).collect();
    assert_eq!(names, ["grammar", "paraphrase", "formal", "shout"]);

    let restored = session.restore_defaults().unwrap();
    assert_eq!(restored.llm.action.as_str(), "grammar");
    assert_eq!(session.list_actions().len(), 4);
    assert!(!session.store().is_dirty());

    let on_disk = ConfigLayer::from_config(reopen(&paths).active());
    assert_eq!(on_disk, ConfigLayer::from_config(session.store().defaults()));

    assert_eq!(session.submit("done").await, Outcome::Generated);
    assert!(matches!(session.view(), View::Diff(_)));
}

#[test]
fn defaults_file_replaces_shipped_defaults() {
    let (_dir, paths) = settings_dir();
    fs::write(
        &paths.defaults,
        "[LLM]\naction = polite\nmodel = mistral\n\n[PROMPTS]\npolite = Make this polite:\n\n[DIFFS]\npolite = True\n",
    )
    .unwrap();

    let mut session = open_session(&paths, FakeGenerator::default());
    assert_eq!(session.config().llm.model.as_str(), "mistral");
    assert_eq!(session.config().llm.max_length.get(), 256);

    session.update_setting("LLM", "model", "qwen2.5:7b").unwrap();
    session.restore_defaults().unwrap();
    assert_eq!(session.config().llm.model.as_str(), "mistral");
    assert_eq!(session.selected_action().unwrap().name.as_str(), "polite");
}

#[test]
fn malformed_settings_file_is_recovered_from() {
    let (_dir, paths) = settings_dir();
    fs::write(&paths.active, "[LLM]\nmodel = mistral\nthis line has no delimiter\n").unwrap();

    let opened = ConfigStore::open(paths.clone()).unwrap();
    assert_eq!(opened.recovered.len(), 1);
    assert!(matches!(
        &opened.recovered[0],
        ConfigError::Parse { path, .. } if path == &paths.active
    ));
    assert_eq!(opened.store.active(), opened.store.defaults());

    // an edit rewrites the broken file with valid content
    let mut store = opened.store;
    store.set_field_str("LLM", "model", "mistral").unwrap();
    store.persist().unwrap();
    assert_eq!(reopen(&paths).active().llm.model.as_str(), "mistral");
}

#[test]
fn reload_picks_up_external_edits() {
    let (_dir, paths) = settings_dir();
    let mut session = open_session(&paths, FakeGenerator::default());
    session.update_setting("LLM", "model", "mistral").unwrap();

    let text = fs::read_to_string(&paths.active)
        .unwrap()
        .replace("model = mistral", "model = phi3");
    fs::write(&paths.active, text).unwrap();

    assert_eq!(session.reload().unwrap().llm.model.as_str(), "phi3");

    fs::write(&paths.active, "[BROKEN\n").unwrap();
    assert!(session.reload().is_err());
    assert_eq!(session.config().llm.model.as_str(), "phi3");
}
