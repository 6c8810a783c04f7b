//! Audit pipeline: parse both files, compute findings, report or rewrite.
//!
//! The duplicate-key precondition is an explicit result checked here, once,
//! before any file mutation; everything else accumulates as findings.
use crate::cli::{Mode, RootArgs, UnicodeFlag};
use crate::diff::{compare_records, count_untranslated};
use crate::key::{path_looks_like_unicode, FileKind};
use crate::publish;
use crate::registry::{FileOrigin, Registry};
use crate::report;
use crate::rewrite;
use crate::segment::LinePatterns;
use anyhow::{bail, Context, Result};
use serde_yaml::Value;
use std::fs;
use std::io::Write as _;
use std::path::Path;
use std::process::ExitCode;

/// A reference record absent from the translated file, and the key of the
/// record it must be inserted after (`None` = start of file).
pub struct MissingRecord {
    pub key: String,
    pub after: Option<String>,
}

/// The four verdict sets consumed by the report and the rewrite pass.
#[derive(Default)]
pub struct AuditFindings {
    /// Translated records still carrying untranslated keys, with counts.
    pub untranslated: Vec<(String, usize)>,
    /// Reference records absent from the translated file, in file order.
    pub missing: Vec<MissingRecord>,
    /// Translated records absent from the English file, in file order.
    pub extra: Vec<String>,
    /// Records present in both files that drift outside translatable keys,
    /// with their mismatch explanations.
    pub differing: Vec<(String, Vec<String>)>,
}

pub fn run(args: &RootArgs) -> Result<ExitCode> {
    let kind = resolve_file_kind(args);
    let english_text = read_rules_text(&args.english_rules)?;
    let translated_text = read_rules_text(&args.translated_rules)?;
    let english_root = parse_root_sequence(&english_text, &args.english_rules)?;
    let translated_root = parse_root_sequence(&translated_text, &args.translated_rules)?;

    let english = Registry::build(&english_root, kind, FileOrigin::English);
    let translated = Registry::build(&translated_root, kind, FileOrigin::Translated);
    let findings = collect_findings(&english, &translated);

    let json_mode = args.json && args.mode == Mode::Report;
    if json_mode {
        report::print_json(kind, english_root.len(), translated_root.len(), &english, &translated, &findings)?;
    } else {
        report::print_findings(kind, english_root.len(), &english, &translated, &findings);
    }

    // Duplicate keys make every later lookup ambiguous: stop before any
    // write action.
    if !english.duplicates().is_empty() || !translated.duplicates().is_empty() {
        if !json_mode {
            println!();
            println!("Stopping: Duplicate keys in the English or translated file may cause incorrect results.");
        }
        return Ok(ExitCode::FAILURE);
    }

    if args.mode == Mode::Rewrite {
        rewrite_translated_file(args, kind, &translated_text, &findings)?;
    }
    Ok(ExitCode::SUCCESS)
}

fn resolve_file_kind(args: &RootArgs) -> FileKind {
    match args.unicode {
        UnicodeFlag::True => FileKind::Unicode,
        UnicodeFlag::False => FileKind::Rules,
        UnicodeFlag::Auto => {
            if path_looks_like_unicode(&args.translated_rules) {
                FileKind::Unicode
            } else {
                FileKind::Rules
            }
        }
    }
}

fn read_rules_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("read {}", path.display()))
}

/// Parse a whole file into its root sequence. Tabs become spaces first so
/// indentation levels stay comparable.
fn parse_root_sequence(text: &str, path: &Path) -> Result<Vec<Value>> {
    let value: Value = serde_yaml::from_str(&text.replace('\t', " "))
        .with_context(|| format!("parse {}", path.display()))?;
    match value {
        Value::Sequence(items) => Ok(items),
        _ => bail!(
            "{} does not contain a root sequence of records",
            path.display()
        ),
    }
}

/// Compute all four verdict sets from the two registries.
pub fn collect_findings(english: &Registry, translated: &Registry) -> AuditFindings {
    let mut findings = AuditFindings::default();

    for key in translated.keys() {
        let Some(record) = translated.get(key) else {
            continue;
        };
        let count = count_untranslated(record);
        if count > 0 {
            findings.untranslated.push((key.clone(), count));
        }
    }

    for key in english.keys() {
        if !translated.contains(key) {
            let after = english.occurs_after(key).cloned().unwrap_or(None);
            findings.missing.push(MissingRecord {
                key: key.clone(),
                after,
            });
        }
    }

    for key in translated.keys() {
        if !english.contains(key) {
            findings.extra.push(key.clone());
        }
    }

    for key in english.keys() {
        let (Some(english_record), Some(translated_record)) =
            (english.get(key), translated.get(key))
        else {
            continue;
        };
        let (warnings, matched) = compare_records(english_record, translated_record, key);
        if !matched {
            findings.differing.push((key.clone(), warnings));
        }
    }

    findings
}

fn rewrite_translated_file(
    args: &RootArgs,
    kind: FileKind,
    translated_text: &str,
    findings: &AuditFindings,
) -> Result<()> {
    println!();
    println!("Creating new version of translated file with comments where translation is needed.");
    if !findings.missing.is_empty() {
        println!();
        println!("Missing rules:");
        for record in &findings.missing {
            match &record.after {
                Some(after) => println!("  {} is missing after {}", record.key, after),
                None => println!("  {} is missing at the start of the file", record.key),
            }
        }
    }
    println!();

    let patterns = LinePatterns::compile();
    let staged = publish::stage_next_to(&args.translated_rules)?;
    let mut writer = std::io::BufWriter::new(staged.as_file());
    let outcome = rewrite::write_annotated(
        &mut writer,
        translated_text,
        &args.english_rules,
        kind,
        &patterns,
        findings,
    )?;
    writer.flush().context("flush staged rewrite")?;
    drop(writer);

    if outcome.changed() {
        let backup = publish::replace_with_backup(&args.translated_rules, staged)?;
        tracing::info!(
            path = %args.translated_rules.display(),
            backup = %backup.display(),
            annotations = outcome.counts.total(),
            "replaced translated file"
        );
        println!(
            "New version of {} created. Original backed up to {}.",
            args.translated_rules.display(),
            backup.display()
        );
        report::print_rewrite_counts(&outcome.counts);
    } else {
        // Dropping the staged temp file deletes it.
        println!("No changes needed to {}.", args.translated_rules.display());
    }
    Ok(())
}
