//! Template resolution, visibility conditions and value formats.
mod common;
use common::*;
use katachi::condition::{evaluate_resolved, is_truthy_text};
use katachi::error::ConditionError;
use katachi::format::format_value_at;
use katachi::prelude::*;
use serde_json::json;

#[cfg(test)]
mod template_tests {
    use super::*;

    #[test]
    fn test_found_undefined_and_miss() {
        let scope = scope(json!({
            "name": "Pump",
            "count": 3,
            "nothing": null,
            "runtime": { "value": 1.5, "inputs": { "input-0": "on" } },
            "label": "text"
        }));
        assert_eq!(resolve_template("{{name}} #{{count}}", &scope), "Pump #3");
        assert_eq!(resolve_template("{{runtime.inputs.input-0}}", &scope), "on");
        assert_eq!(resolve_template("[{{nothing}}]", &scope), "[]");
        assert_eq!(resolve_template("[{{absent}}]", &scope), "[]");
        assert_eq!(resolve_template("[{{runtime.absent}}]", &scope), "[]");
        // Walking through a string is a miss; the placeholder stays.
        assert_eq!(resolve_template("[{{label.length}}]", &scope), "[{{label.length}}]");
        assert_eq!(resolve_template("[{{absent.deep}}]", &scope), "[{{absent.deep}}]");
    }

    #[test]
    fn test_values_are_coerced_to_text() {
        let scope = scope(json!({ "flag": true, "list": ["a", "b"], "obj": { "k": 1 }, "big": 2.0 }));
        assert_eq!(resolve_template("{{flag}}", &scope), "true");
        assert_eq!(resolve_template("{{list}}", &scope), "a,b");
        assert_eq!(resolve_template("{{obj}}", &scope), "{\"k\":1}");
        assert_eq!(resolve_template("{{big}}", &scope), "2");
    }

    #[test]
    fn test_text_without_placeholders_is_unchanged() {
        let scope = scope(json!({}));
        assert_eq!(resolve_template("#FF9800", &scope), "#FF9800");
        assert_eq!(resolve_template("", &scope), "");
    }
}

#[cfg(test)]
mod condition_tests {
    use super::*;

    #[test]
    fn test_truthiness_table() {
        for falsy in ["", "  ", "0", "0.0", "-0", "false", "null", "undefined", "NaN", "\"\"", "''"] {
            assert!(!is_truthy_text(falsy), "expected {falsy:?} to be falsy");
        }
        for truthy in ["1", "yes", "true", "off", " x ", "0x", "[]"] {
            assert!(is_truthy_text(truthy), "expected {truthy:?} to be truthy");
        }
    }

    #[test]
    fn test_equality_against_strings() {
        let running = scope(json!({ "executionStatus": "running", "mode": "In Progress" }));
        assert!(evaluate_condition("{{executionStatus}} === \"running\"", &running));
        assert!(!evaluate_condition("{{executionStatus}} !== \"running\"", &running));
        assert!(evaluate_condition("{{mode}} === 'In Progress'", &running));
        assert!(evaluate_condition("\"{{mode}}\" === \"In Progress\"", &running));
        // Undefined resolves to the empty string.
        assert!(evaluate_condition("{{missing}} === \"\"", &running));
    }

    #[test]
    fn test_numeric_comparisons() {
        let scope = scope(json!({ "count": 5, "text": "abc", "limit": "10" }));
        assert!(evaluate_condition("{{count}} > 3", &scope));
        assert!(evaluate_condition("{{count}} >= 5", &scope));
        assert!(evaluate_condition("{{count}} < {{limit}}", &scope));
        assert!(!evaluate_condition("{{count}} <= 4", &scope));
        assert!(evaluate_condition("{{count}} === 5", &scope));
        // Parse failures are false in both directions.
        assert!(!evaluate_condition("{{text}} > 1", &scope));
        assert!(!evaluate_condition("{{text}} <= 1", &scope));
    }

    #[test]
    fn test_plain_truthiness() {
        let scope = scope(json!({ "enabled": false, "name": "x", "zero": 0 }));
        assert!(!evaluate_condition("{{enabled}}", &scope));
        assert!(evaluate_condition("{{name}}", &scope));
        assert!(!evaluate_condition("{{zero}}", &scope));
        assert!(!evaluate_condition("{{missing}}", &scope));
    }

    #[test]
    fn test_existence_shortcut() {
        let scope = scope(json!({
            "script": "line1\nif (a > b) { return \"x\" === y }\nline3",
            "blank": "   ",
            "config": { "url": "http://x" }
        }));
        assert!(evaluate_condition("!!{{script}}", &scope));
        assert!(evaluate_condition("  !!{{ script }}  ", &scope));
        assert!(!evaluate_condition("!!{{blank}}", &scope));
        assert!(!evaluate_condition("!!{{missing}}", &scope));
        assert!(evaluate_condition("!!{{config.url}}", &scope));
    }

    #[test]
    fn test_outside_the_grammar_is_false() {
        let scope = scope(json!({ "a": 1 }));
        assert!(!evaluate_condition("{{a}} == 1", &scope));
        assert!(!evaluate_condition("1 < 2 < 3", &scope));
        assert!(!evaluate_condition("x === \"open", &scope));
        assert!(evaluate_resolved("a && b").is_ok());
        assert!(evaluate_resolved("1 < 2 < 3").is_err());
    }

    #[test]
    fn test_quotes_in_values_are_data() {
        let scope = scope(json!({ "name": "Operator's panel", "q": "say \"hi" }));
        assert!(!evaluate_condition("{{name}} === \"error\"", &scope));
        assert!(evaluate_condition("{{name}} !== \"error\"", &scope));
        assert!(!evaluate_condition("{{q}} === 'x'", &scope));
        assert!(evaluate_condition("{{q}} !== 'x'", &scope));
        assert!(evaluate_condition("{{name}} === \"Operator's panel\"", &scope));
        assert!(evaluate_condition("'{{q}}' === 'say \"hi'", &scope));
        // Plain text with a stray quote is still judged by truthiness.
        assert!(evaluate_condition("{{name}}", &scope));
    }

    #[test]
    fn test_operators_in_values_are_data() {
        let scope = scope(json!({ "rule": "x > 3", "loose": "a == b" }));
        assert!(evaluate_condition("{{rule}} === \"x > 3\"", &scope));
        assert!(evaluate_condition("{{loose}}", &scope));
    }

    #[test]
    fn test_unbalanced_quote_in_resolved_text_is_an_error() {
        assert!(matches!(
            evaluate_resolved("Operator's panel === \"error\""),
            Err(ConditionError::UnterminatedString(_))
        ));
        assert!(matches!(
            evaluate_resolved("say \"hi"),
            Err(ConditionError::UnterminatedString(_))
        ));
    }
}

#[cfg(test)]
mod format_tests {
    use super::*;

    const NOW: i64 = 1_700_000_000_000;

    #[test]
    fn test_relative_time_units() {
        assert_eq!(format_value_at(&json!(NOW - 5_000), "relativeTime", NOW), json!("5s ago"));
        assert_eq!(format_value_at(&json!(NOW - 120_000), "relativeTime", NOW), json!("2m ago"));
        assert_eq!(format_value_at(&json!(NOW - 3 * 3_600_000), "relativeTime", NOW), json!("3h ago"));
        assert_eq!(format_value_at(&json!(NOW - 2 * 86_400_000), "relativeTime", NOW), json!("2d ago"));
        assert_eq!(format_value_at(&json!("soon"), "relativeTime", NOW), json!("soon"));
    }

    #[test]
    fn test_bytes() {
        assert_eq!(format_value_at(&json!(512), "bytes", NOW), json!("512 B"));
        assert_eq!(format_value_at(&json!(2048), "bytes", NOW), json!("2.0 KB"));
        assert_eq!(format_value_at(&json!("1572864"), "bytes", NOW), json!("1.5 MB"));
        assert_eq!(format_value_at(&json!(3_221_225_472u64), "bytes", NOW), json!("3.0 GB"));
    }

    #[test]
    fn test_date_and_passthrough() {
        assert_eq!(format_value_at(&json!(0), "date", NOW), json!("1970-01-01 00:00:00"));
        assert_eq!(
            format_value_at(&json!(1_700_000_000_000i64), "date", NOW),
            json!("2023-11-14 22:13:20")
        );
        assert_eq!(format_value_at(&json!(42), "unknown", NOW), json!(42));
        assert_eq!(format_value(&serde_json::Value::Null, "bytes"), serde_json::Value::Null);
    }
}
