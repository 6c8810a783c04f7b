//! Structural comparison of two parsed records, ignoring translatable keys.
//!
//! Translated values under the ignored keys are expected to differ; any other
//! structural drift between the English and translated record is a finding.
//! The first mismatch short-circuits with both values rendered for the report.
use serde_yaml::Value;
use std::collections::BTreeSet;

/// Keys whose values legitimately differ between the files.
pub const IGNORED_KEYS: [&str; 6] = ["t", "T", "oc", "OC", "ct", "CT"];

/// Keys that mark text still carrying source-language content.
const UNTRANSLATED_KEYS: [&str; 3] = ["t", "ot", "oc"];

/// Compare two records, returning mismatch explanations and a match verdict.
pub fn compare_records(english: &Value, translated: &Value, path: &str) -> (Vec<String>, bool) {
    match (english, translated) {
        (Value::Mapping(a), Value::Mapping(b)) => compare_mappings(a, b, path),
        (Value::Sequence(a), Value::Sequence(b)) => compare_sequences(a, b, path),
        _ if english == translated => (Vec::new(), true),
        _ => (value_mismatch(path, english, translated), false),
    }
}

fn compare_mappings(
    english: &serde_yaml::Mapping,
    translated: &serde_yaml::Mapping,
    path: &str,
) -> (Vec<String>, bool) {
    let mut warnings = Vec::new();

    let english_keys = significant_keys(english);
    let translated_keys = significant_keys(translated);
    if english_keys != translated_keys {
        warnings.push(format!("Records don't have the same keys at path: {path}"));
        let only_english: Vec<&str> = english_keys
            .difference(&translated_keys)
            .map(String::as_str)
            .collect();
        if !only_english.is_empty() {
            warnings.push(format!(
                "Keys in the English record that are not in the translated record: {{{}}}",
                only_english.join(", ")
            ));
        }
        let only_translated: Vec<&str> = translated_keys
            .difference(&english_keys)
            .map(String::as_str)
            .collect();
        if !only_translated.is_empty() {
            warnings.push(format!(
                "Keys in the translated record that are not in the English record: {{{}}}",
                only_translated.join(", ")
            ));
        }
        return (warnings, false);
    }

    for (key, english_value) in english {
        if is_ignored(key) {
            continue;
        }
        let Some(translated_value) = translated.get(key) else {
            continue;
        };
        let rendered_key = render_value(key);
        let child_path = format!("{path}['{rendered_key}']");
        match (english_value, translated_value) {
            (Value::Mapping(a), Value::Mapping(b)) => {
                let (child_warnings, matched) = compare_mappings(a, b, &child_path);
                warnings.extend(child_warnings);
                if !matched {
                    return (warnings, false);
                }
            }
            (Value::Sequence(a), translated_value) => {
                let Some(b) = translated_value.as_sequence() else {
                    warnings.push(format!("Sequences don't match at path: {child_path}"));
                    return (warnings, false);
                };
                let (child_warnings, matched) = compare_sequences(a, b, &child_path);
                warnings.extend(child_warnings);
                if !matched {
                    return (warnings, false);
                }
            }
            _ if english_value == translated_value => {}
            _ => {
                warnings.push(format!(
                    "Values for key: {rendered_key} don't match at path: {child_path}:"
                ));
                warnings.push(format!("  English: {}", render_value(english_value)));
                warnings.push(format!("  Translated: {}", render_value(translated_value)));
                return (warnings, false);
            }
        }
    }

    (warnings, true)
}

fn compare_sequences(english: &[Value], translated: &[Value], path: &str) -> (Vec<String>, bool) {
    let mut warnings = Vec::new();
    if english.len() != translated.len() {
        warnings.push(format!(
            "Sequences don't have the same length at path: {path}"
        ));
        return (warnings, false);
    }

    for (index, (english_item, translated_item)) in english.iter().zip(translated).enumerate() {
        let child_path = format!("{path}[{index}]");
        if let (Value::Mapping(a), Value::Mapping(b)) = (english_item, translated_item) {
            let (child_warnings, matched) = compare_mappings(a, b, &child_path);
            warnings.extend(child_warnings);
            if !matched {
                return (warnings, false);
            }
        } else if english_item != translated_item {
            warnings.push(format!(
                "Sequence item values don't match at path: {child_path}:"
            ));
            warnings.push(format!("  English: {}", render_value(english_item)));
            warnings.push(format!("  Translated: {}", render_value(translated_item)));
            return (warnings, false);
        }
    }

    (warnings, true)
}

/// Recursively count keys that still carry untranslated text.
pub fn count_untranslated(record: &Value) -> usize {
    let Value::Mapping(map) = record else {
        return 0;
    };
    let mut count = 0;
    for (key, value) in map {
        if matches!(key, Value::String(name) if UNTRANSLATED_KEYS.contains(&name.as_str())) {
            count += 1;
        }
        match value {
            Value::Mapping(_) => count += count_untranslated(value),
            Value::Sequence(items) => {
                for item in items {
                    if item.is_mapping() {
                        count += count_untranslated(item);
                    }
                }
            }
            _ => {}
        }
    }
    count
}

fn is_ignored(key: &Value) -> bool {
    matches!(key, Value::String(name) if IGNORED_KEYS.contains(&name.as_str()))
}

fn significant_keys(map: &serde_yaml::Mapping) -> BTreeSet<String> {
    map.keys()
        .filter(|key| !is_ignored(key))
        .map(render_value)
        .collect()
}

fn value_mismatch(path: &str, english: &Value, translated: &Value) -> Vec<String> {
    vec![
        format!("Values don't match at path: {path}:"),
        format!("  English: {}", render_value(english)),
        format!("  Translated: {}", render_value(translated)),
    ]
}

/// Render a value for a warning line; scalars inline, containers as YAML.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Null => "~".to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        Value::String(text) => text.clone(),
        other => serde_yaml::to_string(other)
            .map(|rendered| rendered.trim_end().to_string())
            .unwrap_or_else(|_| "<unrenderable>".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> Value {
        serde_yaml::from_str(yaml).expect("test yaml")
    }

    #[test]
    fn translated_text_keys_do_not_count_as_drift() {
        let english = parse("name: default\ntag: math\nt: \"Hello\"");
        let translated = parse("name: default\ntag: math\nt: \"Bonjour\"");
        let (warnings, matched) = compare_records(&english, &translated, "default:math");
        assert!(matched);
        assert!(warnings.is_empty());
    }

    #[test]
    fn one_sided_ignored_key_is_not_drift() {
        let english = parse("name: default\ntag: math");
        let translated = parse("name: default\ntag: math\noc: \"old comment\"");
        let (_, matched) = compare_records(&english, &translated, "default:math");
        assert!(matched);
    }

    #[test]
    fn one_sided_significant_key_is_reported() {
        let english = parse("name: default\ntag: math\nvariables: []");
        let translated = parse("name: default\ntag: math");
        let (warnings, matched) = compare_records(&english, &translated, "default:math");
        assert!(!matched);
        assert!(warnings[0].contains("default:math"));
        assert!(warnings
            .iter()
            .any(|warning| warning.contains("variables")));
    }

    #[test]
    fn scalar_drift_reports_path_and_both_values() {
        let english = parse("name: default\ntag: math\nmatch: \".\"");
        let translated = parse("name: default\ntag: math\nmatch: \"*\"");
        let (warnings, matched) = compare_records(&english, &translated, "default:math");
        assert!(!matched);
        assert!(warnings[0].contains("default:math['match']"));
        assert!(warnings.iter().any(|warning| warning.contains('.')));
        assert!(warnings.iter().any(|warning| warning.contains('*')));
    }

    #[test]
    fn nested_drift_reports_qualified_path() {
        let english = parse("name: default\ntag: math\nreplace:\n  - test:\n      if: \"x\"");
        let translated = parse("name: default\ntag: math\nreplace:\n  - test:\n      if: \"y\"");
        let (warnings, matched) = compare_records(&english, &translated, "default:math");
        assert!(!matched);
        assert!(warnings[0].contains("default:math['replace'][0]['test']['if']"));
    }

    #[test]
    fn sequence_length_mismatch_is_reported() {
        let english = parse("name: default\ntag: math\nreplace: [a, b]");
        let translated = parse("name: default\ntag: math\nreplace: [a]");
        let (warnings, matched) = compare_records(&english, &translated, "default:math");
        assert!(!matched);
        assert!(warnings[0].contains("same length"));
    }

    #[test]
    fn untranslated_keys_counted_through_nesting() {
        let record = parse(
            "name: default\ntag: math\nt: \"Hello\"\nreplace:\n  - t: \"one\"\n  - test:\n      then:\n        ot: \"two\"",
        );
        assert_eq!(count_untranslated(&record), 3);
    }

    #[test]
    fn untranslated_count_zero_for_scalar_records() {
        assert_eq!(count_untranslated(&parse("plain")), 0);
    }
}
