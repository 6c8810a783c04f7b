//! Report output: human-readable findings and the JSON summary.
use crate::audit::AuditFindings;
use crate::key::{display_key, FileKind};
use crate::registry::Registry;
use crate::rewrite::RewriteCounts;
use anyhow::Result;
use serde::Serialize;

/// Print every finding as warning lines, in the order they were computed.
pub fn print_findings(
    kind: FileKind,
    english_items: usize,
    english: &Registry,
    translated: &Registry,
    findings: &AuditFindings,
) {
    println!();
    println!(
        "Processing {english_items} items in {} mode.",
        kind.label()
    );
    println!();

    for registry in [english, translated] {
        for key in registry.duplicates() {
            println!(
                "Warning: Duplicate key {} in {} file.",
                display_key(key),
                registry.origin().label()
            );
        }
    }

    for (key, count) in &findings.untranslated {
        println!(
            "Rule {} still contains {count} key(s) needing translating.",
            display_key(key)
        );
    }

    for record in &findings.missing {
        println!(
            "Rule {} is missing in the translated file.",
            display_key(&record.key)
        );
    }

    for key in &findings.extra {
        println!(
            "Warning: Rule {} in translated file is not in the English file.",
            display_key(key)
        );
    }

    for (key, warnings) in &findings.differing {
        println!(
            "Warning: Rule {} contains differences other than ones in t, T, OC, oc, CT, ct keys:",
            display_key(key)
        );
        for warning in warnings {
            println!("  - {warning}");
        }
    }
}

/// Per-category annotation counts after a rewrite, non-zero only.
pub fn print_rewrite_counts(counts: &RewriteCounts) {
    if counts.new_rules > 0 {
        println!("  {} new rule(s) that need translation.", counts.new_rules);
    }
    if counts.needs_translation > 0 {
        println!(
            "  {} rule(s) that need translation of keys.",
            counts.needs_translation
        );
    }
    if counts.not_in_english > 0 {
        println!("  {} rule(s) not in English file.", counts.not_in_english);
    }
    if counts.with_differences > 0 {
        println!(
            "  {} rule(s) with differences other than translation.",
            counts.with_differences
        );
    }
}

#[derive(Serialize)]
struct AuditSummary<'a> {
    mode: &'static str,
    english_items: usize,
    translated_items: usize,
    duplicate_keys_in_english: &'a [String],
    duplicate_keys_in_translated: &'a [String],
    untranslated: Vec<UntranslatedEntry<'a>>,
    missing: Vec<&'a str>,
    extra: Vec<&'a str>,
    differing: Vec<DifferenceEntry<'a>>,
}

#[derive(Serialize)]
struct UntranslatedEntry<'a> {
    key: &'a str,
    count: usize,
}

#[derive(Serialize)]
struct DifferenceEntry<'a> {
    key: &'a str,
    warnings: &'a [String],
}

/// Emit the findings as one JSON object on stdout.
pub fn print_json(
    kind: FileKind,
    english_items: usize,
    translated_items: usize,
    english: &Registry,
    translated: &Registry,
    findings: &AuditFindings,
) -> Result<()> {
    let summary = AuditSummary {
        mode: match kind {
            FileKind::Rules => "rules",
            FileKind::Unicode => "unicode",
        },
        english_items,
        translated_items,
        duplicate_keys_in_english: english.duplicates(),
        duplicate_keys_in_translated: translated.duplicates(),
        untranslated: findings
            .untranslated
            .iter()
            .map(|(key, count)| UntranslatedEntry {
                key: key.as_str(),
                count: *count,
            })
            .collect(),
        missing: findings
            .missing
            .iter()
            .map(|record| record.key.as_str())
            .collect(),
        extra: findings.extra.iter().map(String::as_str).collect(),
        differing: findings
            .differing
            .iter()
            .map(|(key, warnings)| DifferenceEntry {
                key: key.as_str(),
                warnings,
            })
            .collect(),
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
