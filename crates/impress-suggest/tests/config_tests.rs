//! Matcher configuration integration tests

mod common;

use common::{log, recording, step, Trigger};
use impress_suggest::{
    Controller, MatcherHandlers, MatcherSpec, MemoryDocument, Reason, ReplacementType, SuggestConfig, SuggestError,
};
use rstest::rstest;

const TWO_MATCHERS: &str = r##"
[[matcher]]
name = "at"
char = "@"
append_text = " "

[[matcher]]
name = "tag"
char = "#"
supported_characters = "[\\w-]+"
priority = 80
mark_kind = "tag"
replacement_type = "partial"
"##;

// === TOML loading ===

#[test]
fn test_load_matchers_from_toml() {
    let config = SuggestConfig::from_toml_str(TWO_MATCHERS).unwrap();
    assert_eq!(config.matchers.len(), 2);
    assert_eq!(config.matchers[0].append_text, " ");
    assert_eq!(config.matchers[1].replacement_type, ReplacementType::Partial);

    let mut controller = Controller::new();
    for matcher in config.build_indexed().unwrap() {
        controller.register(matcher, MatcherHandlers::new()).unwrap();
    }
    let order: Vec<(&str, usize)> = controller.matchers().map(|m| (m.name(), *m.key())).collect();
    assert_eq!(order, vec![("tag", 1), ("at", 0)]);
    assert_eq!(controller.config(&1).unwrap().mark_kind(), "tag");
}

#[test]
fn test_toml_supported_characters_apply() {
    let config = SuggestConfig::from_toml_str(TWO_MATCHERS).unwrap();
    let mut controller = Controller::new();
    for matcher in config.build_indexed().unwrap() {
        controller.register(matcher, MatcherHandlers::new()).unwrap();
    }

    let mut doc = MemoryDocument::new("");
    let before = doc.clone();
    let edit = doc.type_text("see #data-science");
    controller.apply(&edit, &before, &doc);
    assert_eq!(controller.next().unwrap().query.full, "data-science");
}

#[test]
fn test_empty_config_is_valid() {
    let config = SuggestConfig::from_toml_str("").unwrap();
    assert!(config.matchers.is_empty());
    assert!(config.build_indexed().unwrap().is_empty());
}

#[rstest]
#[case("[[matcher]\nname = 1")]
#[case("[[matcher]]\npriority = \"high\"")]
fn test_malformed_toml(#[case] input: &str) {
    assert!(matches!(
        SuggestConfig::from_toml_str(input),
        Err(SuggestError::Config(_))
    ));
}

#[test]
fn test_missing_file() {
    assert!(matches!(
        SuggestConfig::from_path("/nonexistent/suggest.toml"),
        Err(SuggestError::Config(_))
    ));
}

// === Build errors ===

#[test]
fn test_invalid_pattern_names_matcher() {
    let err = MatcherSpec::new("bad", "@")
        .supported_characters("(")
        .build(Trigger::Mention)
        .unwrap_err();
    match err {
        SuggestError::InvalidPattern { name, .. } => assert_eq!(name, "bad"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_empty_trigger_rejected() {
    assert!(matches!(
        MatcherSpec::new("none", "").build(Trigger::Mention),
        Err(SuggestError::EmptyTrigger(name)) if name == "none"
    ));
}

#[rstest]
#[case("at", Trigger::Tag)]
#[case("other", Trigger::Mention)]
fn test_duplicate_registration(#[case] name: &str, #[case] key: Trigger) {
    let mut controller = Controller::new();
    controller
        .register(common::mention(), MatcherHandlers::new())
        .unwrap();
    let duplicate = MatcherSpec::new(name, "#").build(key).unwrap();
    assert!(matches!(
        controller.register(duplicate, MatcherHandlers::new()),
        Err(SuggestError::DuplicateMatcher(_))
    ));
}

// === Priority and selection rules ===

#[rstest]
#[case(10, 90, "command")]
#[case(90, 10, "emoji")]
#[case(50, 50, "emoji")]
fn test_priority_decides_shared_trigger(#[case] emoji: i32, #[case] command: i32, #[case] expected: &str) {
    let emoji = MatcherSpec::new("emoji", ":")
        .supported_characters("[a-z_]+")
        .priority(emoji)
        .build(Trigger::Mention)
        .unwrap();
    let command = MatcherSpec::new("command", ":")
        .supported_characters("[a-z]+")
        .priority(command)
        .build(Trigger::Tag)
        .unwrap();
    let mut controller = Controller::new()
        .with_matcher(emoji, MatcherHandlers::new())
        .unwrap()
        .with_matcher(command, MatcherHandlers::new())
        .unwrap();

    let mut doc = MemoryDocument::new("");
    let before = doc.clone();
    let edit = doc.type_text(":smile");
    controller.apply(&edit, &before, &doc);
    assert_eq!(controller.next().unwrap().name, expected);
}

#[rstest]
#[case(false, Some(Reason::Start))]
#[case(true, None)]
fn test_empty_selections_only(#[case] empty_only: bool, #[case] expected: Option<Reason>) {
    let log = log();
    let config = MatcherSpec::new("at", "@")
        .empty_selections_only(empty_only)
        .build(Trigger::Mention)
        .unwrap();
    let mut controller = Controller::new().with_matcher(config, recording(&log)).unwrap();

    let mut doc = MemoryDocument::new("@alice");
    let outcome = step(&mut controller, &mut doc, |doc| doc.select(1, 6));
    assert_eq!(outcome.transition, expected);
}

#[test]
fn test_case_insensitive_trigger() {
    let config = MatcherSpec::new("cmd", "x:")
        .case_insensitive(true)
        .build(Trigger::Mention)
        .unwrap();
    let mut controller = Controller::new().with_matcher(config, MatcherHandlers::new()).unwrap();

    let mut doc = MemoryDocument::new("");
    let before = doc.clone();
    let edit = doc.type_text("X:run");
    controller.apply(&edit, &before, &doc);
    assert_eq!(controller.next().unwrap().query.full, "run");
}
