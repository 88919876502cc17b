//! Property tests for settings value normalization.
//!
//! Normalized values are what gets written to the settings file, so parsing
//! a normalized value again must give it back unchanged.

use checkr_types::{
    ActionName, ActionTable, Config, FieldKey, LlmSettings, MaxLength, ModelId, PromptTemplate,
    UiSettings, format_flag, parse_flag,
};
use proptest::prelude::*;

proptest! {
    #[test]
    fn prompt_normalization_is_idempotent(raw in "[ \t]*[A-Za-z ,.:!?]{0,20}(\n[ \t]*[A-Za-z ,.:]{0,20}){0,4}") {
        if let Ok(template) = PromptTemplate::new(&raw) {
            let again = PromptTemplate::new(template.as_str()).unwrap();
            prop_assert_eq!(&again, &template);
            prop_assert!(!template.as_str().contains("\n\n"));
            prop_assert_eq!(template.as_str().trim(), template.as_str());
        }
    }

    #[test]
    fn action_names_are_case_insensitive(raw in "[A-Za-z][A-Za-z _-]{0,15}") {
        let lower = ActionName::parse(&raw.to_ascii_lowercase()).unwrap();
        let upper = ActionName::parse(&raw.to_ascii_uppercase()).unwrap();
        prop_assert_eq!(&lower, &upper);
        prop_assert_eq!(ActionName::parse(lower.as_str()).unwrap(), lower);
    }

    #[test]
    fn max_length_accepts_exactly_positive_integers(n in 0u64..100_000) {
        let parsed = MaxLength::parse(&n.to_string());
        if n == 0 {
            prop_assert!(parsed.is_err());
        } else {
            prop_assert_eq!(u64::from(parsed.unwrap().get()), n);
        }
    }

    #[test]
    fn flags_round_trip(value: bool) {
        prop_assert_eq!(parse_flag(format_flag(value)).unwrap(), value);
    }

    #[test]
    fn rejected_field_values_leave_config_unchanged(raw in "\\PC{0,12}") {
        for field in [FieldKey::MaxLength, FieldKey::ShowSpinner, FieldKey::Model] {
            let mut config = sample_config();
            if config.set_field(&field, &raw).is_err() {
                prop_assert_eq!(&config, &sample_config());
            }
        }
    }
}

fn sample_config() -> Config {
    Config {
        llm: LlmSettings {
            action: ActionName::parse("grammar").unwrap(),
            model: ModelId::parse("qwen2.5:3b").unwrap(),
            max_length: MaxLength::FALLBACK,
        },
        ui: UiSettings { show_spinner: true },
        actions: ActionTable::new(),
    }
}
