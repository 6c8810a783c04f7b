//! Annotated rewrite of the translated file.
//!
//! Drives the block scanner over the translated file's raw lines, passing
//! original content through untouched while inserting audit comments and
//! splicing in missing records extracted verbatim from the English file.
//! Audit comments from a previous run are discarded so every output is
//! derived fresh.
use crate::audit::AuditFindings;
use crate::extract::grab_missing_record_lines;
use crate::key::FileKind;
use crate::segment::{BlockScanner, LinePatterns, AUDIT_MARKER};
use anyhow::Result;
use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::path::Path;

/// How many annotations of each kind were inserted.
#[derive(Clone, Copy, Debug, Default)]
pub struct RewriteCounts {
    pub new_rules: usize,
    pub needs_translation: usize,
    pub not_in_english: usize,
    pub with_differences: usize,
}

impl RewriteCounts {
    pub fn total(&self) -> usize {
        self.new_rules + self.needs_translation + self.not_in_english + self.with_differences
    }
}

/// Result of one rewrite pass.
#[derive(Clone, Copy, Debug, Default)]
pub struct RewriteOutcome {
    pub counts: RewriteCounts,
    /// Whether the input already carried audit comments (now discarded).
    pub discarded_audit_comments: bool,
}

impl RewriteOutcome {
    /// The rewritten file replaces the original if anything was discarded or
    /// inserted; otherwise the pass was a byte-for-byte copy.
    pub fn changed(&self) -> bool {
        self.discarded_audit_comments || self.counts.total() > 0
    }
}

struct RewritePass<'a> {
    out: &'a mut dyn Write,
    english_path: &'a Path,
    kind: FileKind,
    patterns: &'a LinePatterns,
    untranslated: HashMap<&'a str, usize>,
    extra: HashSet<&'a str>,
    differing: HashSet<&'a str>,
    /// Predecessor key (None = start of file) -> first missing key after it.
    /// Entries are consumed as chains are resolved.
    missing_after: HashMap<Option<String>, String>,
    outcome: RewriteOutcome,
}

/// Write the annotated version of `translated_text` to `out`.
pub fn write_annotated(
    out: &mut dyn Write,
    translated_text: &str,
    english_path: &Path,
    kind: FileKind,
    patterns: &LinePatterns,
    findings: &AuditFindings,
) -> Result<RewriteOutcome> {
    let mut pass = RewritePass {
        out,
        english_path,
        kind,
        patterns,
        untranslated: findings
            .untranslated
            .iter()
            .map(|(key, count)| (key.as_str(), *count))
            .collect(),
        extra: findings.extra.iter().map(String::as_str).collect(),
        differing: findings
            .differing
            .iter()
            .map(|(key, _)| key.as_str())
            .collect(),
        missing_after: findings
            .missing
            .iter()
            .map(|record| (record.after.clone(), record.key.clone()))
            .collect(),
        outcome: RewriteOutcome::default(),
    };
    pass.run(translated_text)?;
    Ok(pass.outcome)
}

impl RewritePass<'_> {
    fn run(&mut self, translated_text: &str) -> Result<()> {
        let mut scanner = BlockScanner::new(self.patterns, self.kind);
        let mut header: Vec<String> = Vec::new();

        for line in translated_text.split_inclusive('\n') {
            if self.patterns.is_audit_comment(line) {
                self.outcome.discarded_audit_comments = true;
                continue;
            }

            if !scanner.past_document_start() {
                if scanner.observe_document_start(line) {
                    // First real content line: the document header (start
                    // marker and document-level comments) passes through.
                    self.write_lines(header.drain(..))?;
                } else {
                    header.push(line.to_string());
                    continue;
                }
            }

            if scanner.is_record_boundary(line) {
                let block = scanner.take_block();
                self.write_lines(block)?;
                let mut anchor = scanner.current_key().map(str::to_string);
                self.splice_missing_chain(&mut anchor, scanner.root_indentation())?;
                scanner.reset_key();
            }

            scanner.buffer_line(line);
            if scanner.detect_key(line)? {
                self.annotate_record_start(&mut scanner)?;
            }
        }

        // EOF: header-only files never transition, records missing after the
        // final record still get spliced, and trailing comments flush last.
        if !scanner.past_document_start() {
            self.write_lines(header.drain(..))?;
        }
        let mut anchor = scanner.current_key().map(str::to_string);
        if self.missing_after.contains_key(&anchor) {
            let block = scanner.take_block();
            self.write_lines(block)?;
            self.splice_missing_chain(&mut anchor, scanner.root_indentation())?;
        }
        let remaining = scanner.take_all();
        self.write_lines(remaining)?;
        Ok(())
    }

    /// Emit the per-record annotations once the starting record's key is
    /// known, after its leading comments and separating blank lines.
    fn annotate_record_start(&mut self, scanner: &mut BlockScanner<'_>) -> Result<()> {
        let leading = scanner.take_lines_before_name();
        self.write_lines(leading)?;

        let Some(key) = scanner.current_key().map(str::to_string) else {
            return Ok(());
        };
        let indent = " ".repeat(scanner.root_indentation().unwrap_or(0));

        if let Some(count) = self.untranslated.get(key.as_str()).copied() {
            let blanks = scanner.take_leading_blank_lines();
            self.write_lines(blanks)?;
            writeln!(
                self.out,
                "{indent}# {AUDIT_MARKER} RULE '{key}' NEEDS TRANSLATION OF {count} KEYS"
            )?;
            self.outcome.counts.needs_translation += 1;
        }
        if self.extra.contains(key.as_str()) {
            let blanks = scanner.take_leading_blank_lines();
            self.write_lines(blanks)?;
            writeln!(
                self.out,
                "{indent}# {AUDIT_MARKER} RULE '{key}' NOT IN ENGLISH FILE"
            )?;
            self.outcome.counts.not_in_english += 1;
        }
        if self.differing.contains(key.as_str()) {
            let blanks = scanner.take_leading_blank_lines();
            self.write_lines(blanks)?;
            writeln!(
                self.out,
                "{indent}# {AUDIT_MARKER} RULE '{key}' HAS DIFFERENCES OTHER THAN TRANSLATION"
            )?;
            self.outcome.counts.with_differences += 1;
        }
        Ok(())
    }

    /// Splice every record chained as missing after `anchor`, advancing the
    /// anchor through the chain so consecutive missing records land in their
    /// original order.
    fn splice_missing_chain(
        &mut self,
        anchor: &mut Option<String>,
        root_indentation: Option<usize>,
    ) -> Result<()> {
        let indent = " ".repeat(root_indentation.unwrap_or(0));
        while let Some(missing_key) = self.missing_after.remove(&*anchor) {
            let lines = grab_missing_record_lines(
                &missing_key,
                self.english_path,
                self.kind,
                self.patterns,
            )?;
            let mut annotated = false;
            for line in &lines {
                let at_record_start = match self.kind {
                    FileKind::Unicode => true,
                    FileKind::Rules => self.patterns.is_record_first_line(line),
                };
                if !annotated && at_record_start {
                    if anchor.is_none() {
                        // Splicing at the start of the file: keep the new
                        // record separated from the document header.
                        self.out.write_all(b"\n")?;
                    }
                    writeln!(
                        self.out,
                        "{indent}# {AUDIT_MARKER} NEW RULE '{missing_key}' THAT NEEDS TRANSLATION"
                    )?;
                    self.outcome.counts.new_rules += 1;
                    annotated = true;
                }
                self.out.write_all(line.as_bytes())?;
            }
            *anchor = Some(missing_key);
        }
        Ok(())
    }

    fn write_lines<I>(&mut self, lines: I) -> Result<()>
    where
        I: IntoIterator<Item = String>,
    {
        for line in lines {
            self.out.write_all(line.as_bytes())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{collect_findings, MissingRecord};
    use crate::registry::{FileOrigin, Registry};
    use serde_yaml::Value;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    fn write_file(text: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(text.as_bytes()).expect("write fixture");
        file
    }

    fn root(yaml: &str) -> Vec<Value> {
        let parsed: Value = serde_yaml::from_str(yaml).expect("test yaml");
        parsed.as_sequence().expect("root sequence").clone()
    }

    fn findings_for(english_text: &str, translated_text: &str, kind: FileKind) -> AuditFindings {
        let english = Registry::build(&root(english_text), kind, FileOrigin::English);
        let translated = Registry::build(&root(translated_text), kind, FileOrigin::Translated);
        collect_findings(&english, &translated)
    }

    fn rewrite(english_text: &str, translated_text: &str, kind: FileKind) -> (String, RewriteOutcome) {
        let english = write_file(english_text);
        let patterns = LinePatterns::compile();
        let findings = findings_for(english_text, translated_text, kind);
        let mut out = Vec::new();
        let outcome = write_annotated(
            &mut out,
            translated_text,
            english.path(),
            kind,
            &patterns,
            &findings,
        )
        .expect("rewrite pass");
        (String::from_utf8(out).expect("utf-8 output"), outcome)
    }

    const ENGLISH_ABCD: &str = "---\n- name: a\n  tag: t1\n  t: \"one\"\n\n- name: b\n  tag: t2\n  t: \"two\"\n\n- name: c\n  tag: t3\n  t: \"three\"\n\n- name: d\n  tag: t4\n  t: \"four\"\n";

    #[test]
    fn consecutive_missing_records_splice_in_order() {
        let translated = "---\n- name: a\n  tag: t1\n  t: \"un\"\n\n- name: d\n  tag: t4\n  t: \"quatre\"\n";
        let (output, outcome) = rewrite(ENGLISH_ABCD, translated, FileKind::Rules);

        let a = output.find("- name: a").expect("a present");
        let b = output.find("- name: b").expect("b spliced");
        let c = output.find("- name: c").expect("c spliced");
        let d = output.find("- name: d").expect("d present");
        assert!(a < b && b < c && c < d);
        assert_eq!(outcome.counts.new_rules, 2);
        assert!(output.contains("# [AUDIT] NEW RULE 'b:t2' THAT NEEDS TRANSLATION"));
        assert!(output.contains("# [AUDIT] NEW RULE 'c:t3' THAT NEEDS TRANSLATION"));
        // Spliced text is the English file's own bytes.
        assert!(output.contains("- name: b\n  tag: t2\n  t: \"two\"\n"));
    }

    #[test]
    fn three_consecutive_missing_records_follow_the_chain() {
        let translated = "---\n- name: a\n  tag: t1\n  t: \"un\"\n";
        let (output, outcome) = rewrite(ENGLISH_ABCD, translated, FileKind::Rules);
        assert_eq!(outcome.counts.new_rules, 3);
        let b = output.find("- name: b").expect("b spliced");
        let c = output.find("- name: c").expect("c spliced");
        let d = output.find("- name: d").expect("d spliced");
        assert!(b < c && c < d);
    }

    #[test]
    fn missing_first_record_splices_at_start_of_file() {
        let translated = "---\n- name: b\n  tag: t2\n  t: \"deux\"\n\n- name: c\n  tag: t3\n  t: \"trois\"\n\n- name: d\n  tag: t4\n  t: \"quatre\"\n";
        let (output, outcome) = rewrite(ENGLISH_ABCD, translated, FileKind::Rules);
        assert_eq!(outcome.counts.new_rules, 1);
        let annotation = output
            .find("# [AUDIT] NEW RULE 'a:t1'")
            .expect("a annotated");
        let b = output.find("- name: b").expect("b present");
        assert!(annotation < b);
    }

    #[test]
    fn untranslated_and_difference_annotations_precede_the_record() {
        let english = "---\n- name: a\n  tag: t1\n  t: \"one\"\n  match: \".\"\n";
        let translated = "---\n- name: a\n  tag: t1\n  t: \"one\"\n  match: \"*\"\n";
        let (output, outcome) = rewrite(english, translated, FileKind::Rules);
        assert_eq!(outcome.counts.needs_translation, 1);
        assert_eq!(outcome.counts.with_differences, 1);
        let needs = output
            .find("NEEDS TRANSLATION OF 1 KEYS")
            .expect("needs-translation annotation");
        let differs = output
            .find("HAS DIFFERENCES OTHER THAN TRANSLATION")
            .expect("difference annotation");
        let record = output.find("- name: a").expect("record present");
        assert!(needs < differs && differs < record);
    }

    #[test]
    fn extra_record_is_annotated() {
        let english = "---\n- name: a\n  tag: t1\n";
        let translated = "---\n- name: a\n  tag: t1\n\n- name: z\n  tag: t9\n";
        let (output, outcome) = rewrite(english, translated, FileKind::Rules);
        assert_eq!(outcome.counts.not_in_english, 1);
        assert!(output.contains("# [AUDIT] RULE 'z:t9' NOT IN ENGLISH FILE"));
    }

    #[test]
    fn prior_audit_comments_are_discarded_and_regenerated() {
        let english = "---\n- name: a\n  tag: t1\n  t: \"one\"\n";
        let translated = "---\n- name: a\n  tag: t1\n  t: \"one\"\n";
        let (first, first_outcome) = rewrite(english, translated, FileKind::Rules);
        assert!(first_outcome.changed());

        let (second, second_outcome) = rewrite(english, &first, FileKind::Rules);
        assert!(second_outcome.discarded_audit_comments);
        assert_eq!(first, second);
    }

    #[test]
    fn clean_translation_is_a_byte_for_byte_copy() {
        let english = "---\n# header\n\n- name: a\n  tag: t1\n  match: \".\"\n";
        let translated = "---\n# header\n\n- name: a\n  tag: t1\n  match: \".\"\n";
        let (output, outcome) = rewrite(english, translated, FileKind::Rules);
        assert!(!outcome.changed());
        assert_eq!(output, translated);
    }

    #[test]
    fn unicode_splice_annotates_first_line() {
        let english = "---\n - \"a\": [t: letter a]\n - \"b\": [t: letter b]\n";
        let translated = "---\n - \"a\": [T: bokstav a]\n";
        let (output, outcome) = rewrite(english, translated, FileKind::Unicode);
        assert_eq!(outcome.counts.new_rules, 1);
        assert!(output.contains(" # [AUDIT] NEW RULE 'b' THAT NEEDS TRANSLATION\n - \"b\": [t: letter b]\n"));
    }

    #[test]
    fn missing_after_map_consumes_entries_transitively() {
        // Direct check of the chain map shape used by the pass.
        let findings = findings_for(
            ENGLISH_ABCD,
            "---\n- name: a\n  tag: t1\n  t: \"un\"\n",
            FileKind::Rules,
        );
        let chain: HashMap<Option<String>, String> = findings
            .missing
            .iter()
            .map(|record: &MissingRecord| (record.after.clone(), record.key.clone()))
            .collect();
        assert_eq!(chain.get(&Some("a:t1".to_string())), Some(&"b:t2".to_string()));
        assert_eq!(chain.get(&Some("b:t2".to_string())), Some(&"c:t3".to_string()));
        assert_eq!(chain.get(&Some("c:t3".to_string())), Some(&"d:t4".to_string()));
    }
}
