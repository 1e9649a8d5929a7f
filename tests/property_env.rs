use proptest::prelude::*;
use serde_json::{Map, Value};

use meltrun::env::naming::{plugin_env_key, select_filter_key};
use meltrun::env::value::{render_env_text, render_literal};
use meltrun::logs::process_lines;
use meltrun::types::SettingKind;
use meltrun_test_utils::RecordingSink;

// JSON values without floats, so text round trips are exact.
fn json_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        "[a-zA-Z0-9 _.,:\"\\\\-]{0,12}".prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            proptest::collection::vec(("[a-z_]{1,6}", inner), 0..4)
                .prop_map(|pairs| Value::Object(pairs.into_iter().collect::<Map<_, _>>())),
        ]
    })
}

fn structured_value() -> impl Strategy<Value = Value> {
    json_value().prop_filter("array or object", |v| v.is_array() || v.is_object())
}

proptest! {
    #[test]
    fn plugin_keys_are_upper_snake(
        name in "[a-z][a-z0-9-]{0,15}",
        setting in "[a-z_][a-z0-9_]{0,15}",
    ) {
        let key = plugin_env_key(&name, &setting);
        prop_assert!(!key.contains('-'));
        prop_assert!(!key.chars().any(|c| c.is_ascii_lowercase()));
        prop_assert_eq!(
            key,
            format!("{}_{}", name.replace('-', "_").to_uppercase(), setting.to_uppercase())
        );
        prop_assert!(select_filter_key(&name).ends_with("__SELECT_FILTER"));
    }

    #[test]
    fn structured_literals_round_trip(value in structured_value()) {
        let text = render_literal(SettingKind::Object, &value).unwrap().unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        prop_assert_eq!(parsed, value);
    }

    #[test]
    fn env_text_reencoding_is_stable(value in structured_value()) {
        let text = render_literal(SettingKind::Array, &value).unwrap().unwrap();
        let again = render_env_text(SettingKind::Array, "VAR", text.clone()).unwrap();
        prop_assert_eq!(again, text);
    }

    #[test]
    fn arbitrary_lines_never_fail_and_log_at_most_once(
        lines in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..64), 0..16)
    ) {
        let mut sink = RecordingSink::new();
        let result = process_lines(&mut sink, &lines);
        prop_assert!(sink.logs.len() <= lines.len());
        prop_assert!(result.error_logs.len() <= lines.len());
    }
}
