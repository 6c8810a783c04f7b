//! Line segmentation: mapping logical records onto exact source-line spans.
//!
//! The scanner never parses the whole document. It watches raw lines for
//! root-sequence boundaries and detects each record's key incrementally,
//! parsing at most the minimal buffered span when a composite key completes.
//! Comments and blank lines trailing a record are ambiguous until the next
//! record starts, so blocks are finalized one boundary late.
use crate::key::{record_key, FileKind};
use anyhow::{Context, Result};
use regex::Regex;
use serde_yaml::Value;

/// Marker carried by every inserted audit comment, and used to recognize and
/// discard annotations from a previous run.
pub const AUDIT_MARKER: &str = "[AUDIT]";

/// Compiled line patterns shared by the scanner, extractor, and rewriter.
pub struct LinePatterns {
    single_key_double_quoted: Regex,
    single_key_single_quoted: Regex,
    name_key: Regex,
    tag_key: Regex,
    record_first_line: Regex,
    audit_comment: Regex,
}

impl LinePatterns {
    pub fn compile() -> LinePatterns {
        LinePatterns {
            single_key_double_quoted: Regex::new(r#"^\s*-\s*"([^"]*)"\s*:"#)
                .expect("regex for double-quoted keys"),
            single_key_single_quoted: Regex::new(r"^\s*-\s+'(.+?)'\s*:")
                .expect("regex for single-quoted keys"),
            name_key: Regex::new(r"^\s*-*\s*name:\s*\S+").expect("regex for name keys"),
            tag_key: Regex::new(r"^\s*tag:\s*\S+").expect("regex for tag keys"),
            record_first_line: Regex::new(r"^\s*-\s*name:").expect("regex for record first lines"),
            audit_comment: Regex::new(r"^\s*#\s*\[AUDIT\]").expect("regex for audit comments"),
        }
    }

    /// Extract a single-key record's key from its own line, if present.
    pub fn key_from_line(&self, line: &str) -> Option<String> {
        if let Some(captures) = self.single_key_double_quoted.captures(line) {
            return Some(captures[1].to_string());
        }
        self.single_key_single_quoted
            .captures(line)
            .map(|captures| captures[1].to_string())
    }

    pub fn is_audit_comment(&self, line: &str) -> bool {
        self.audit_comment.is_match(line)
    }

    pub fn is_normal_comment(&self, line: &str) -> bool {
        line.trim_start().starts_with('#') && !self.is_audit_comment(line)
    }

    /// Line that opens a rules record (`- name: ...`), where the NEW RULE
    /// annotation belongs.
    pub fn is_record_first_line(&self, line: &str) -> bool {
        self.record_first_line.is_match(line)
    }
}

/// Blank check tolerant of non-breaking spaces in translated files.
pub fn line_is_blank(line: &str) -> bool {
    line.replace('\u{a0}', " ").trim().is_empty()
}

pub fn line_is_document_start(line: &str) -> bool {
    line.starts_with("---")
}

/// Per-file scanning state: document-start tracking, root indentation, the
/// in-progress block buffer, and incremental key detection.
pub struct BlockScanner<'p> {
    patterns: &'p LinePatterns,
    kind: FileKind,
    past_document_start: bool,
    root_indentation: Option<usize>,
    buffered: Vec<String>,
    /// One past the index of the last buffered non-blank, non-comment line.
    last_content: Option<usize>,
    current_key: Option<String>,
    found_name_key: bool,
    /// 1-based buffered index of the line holding the `name` key.
    name_line: Option<usize>,
}

impl<'p> BlockScanner<'p> {
    pub fn new(patterns: &'p LinePatterns, kind: FileKind) -> BlockScanner<'p> {
        BlockScanner {
            patterns,
            kind,
            past_document_start: false,
            root_indentation: None,
            buffered: Vec::new(),
            last_content: None,
            current_key: None,
            found_name_key: false,
            name_line: None,
        }
    }

    pub fn past_document_start(&self) -> bool {
        self.past_document_start
    }

    /// Note a line while still in the document header. Returns true exactly
    /// once, on the first line that is real content (not a `---` marker or an
    /// ordinary comment).
    pub fn observe_document_start(&mut self, line: &str) -> bool {
        if self.past_document_start {
            return false;
        }
        if self.patterns.is_normal_comment(line) || line_is_document_start(line) {
            return false;
        }
        self.past_document_start = true;
        true
    }

    /// Whether this content-phase line starts a new root-sequence record.
    /// The first sequence-item line fixes the root indentation.
    pub fn is_record_boundary(&mut self, line: &str) -> bool {
        let stripped = line.trim_start();
        if !stripped.starts_with("- ") {
            return false;
        }
        let indentation = line.len() - stripped.len();
        let root = *self.root_indentation.get_or_insert(indentation);
        indentation == root
    }

    pub fn root_indentation(&self) -> Option<usize> {
        self.root_indentation
    }

    pub fn buffer_line(&mut self, line: &str) {
        self.buffered.push(line.to_string());
        if !line_is_blank(line) && !self.patterns.is_normal_comment(line) {
            self.last_content = Some(self.buffered.len());
        }
    }

    pub fn current_key(&self) -> Option<&str> {
        self.current_key.as_deref()
    }

    pub fn reset_key(&mut self) {
        self.current_key = None;
        self.found_name_key = false;
        self.name_line = None;
    }

    /// Incremental key detection. Returns true when this line completed the
    /// record's key. Single-key files resolve on the key line itself; rules
    /// files wait for `name:` followed by `tag:`, then parse only the
    /// buffered span.
    pub fn detect_key(&mut self, line: &str) -> Result<bool> {
        if self.root_indentation.is_none() || self.current_key.is_some() {
            return Ok(false);
        }
        match self.kind {
            FileKind::Unicode => {
                if let Some(key) = self.patterns.key_from_line(line) {
                    self.current_key = Some(key);
                    return Ok(true);
                }
            }
            FileKind::Rules => {
                if self.patterns.name_key.is_match(line) {
                    self.found_name_key = true;
                    self.name_line = Some(self.buffered.len());
                }
                if self.found_name_key && self.patterns.tag_key.is_match(line) {
                    self.current_key = key_from_buffered_span(&self.buffered)?;
                    return Ok(self.current_key.is_some());
                }
            }
        }
        Ok(false)
    }

    /// Drain the finalized block: everything up to the last non-blank,
    /// non-comment line. Trailing comments stay buffered for the next record.
    pub fn take_block(&mut self) -> Vec<String> {
        let cut = self.last_content.take().unwrap_or(0);
        let block: Vec<String> = self.buffered.drain(..cut).collect();
        self.shift_indexes(cut);
        block
    }

    /// Drain everything still buffered.
    pub fn take_all(&mut self) -> Vec<String> {
        self.last_content = None;
        self.name_line = None;
        std::mem::take(&mut self.buffered)
    }

    /// Drop buffered lines after the last non-blank, non-comment line
    /// (trailing comments belong to the record that never arrived).
    pub fn trim_trailing(&mut self) {
        let cut = self.last_content.unwrap_or(0);
        self.buffered.truncate(cut);
    }

    /// Drain the lines buffered before the `name` line: the record's leading
    /// comments, which must be emitted before any annotation is inserted.
    pub fn take_lines_before_name(&mut self) -> Vec<String> {
        let Some(name_line) = self.name_line.take() else {
            return Vec::new();
        };
        if name_line <= 1 {
            return Vec::new();
        }
        let cut = name_line - 1;
        let block: Vec<String> = self.buffered.drain(..cut).collect();
        self.shift_indexes(cut);
        block
    }

    /// Drain blank lines from the head of the buffer so annotations land
    /// after a record's separating whitespace.
    pub fn take_leading_blank_lines(&mut self) -> Vec<String> {
        let mut count = 0;
        while count < self.buffered.len() && line_is_blank(&self.buffered[count]) {
            count += 1;
        }
        let block: Vec<String> = self.buffered.drain(..count).collect();
        self.shift_indexes(count);
        block
    }

    fn shift_indexes(&mut self, removed: usize) {
        self.last_content = self
            .last_content
            .map(|index| index.saturating_sub(removed))
            .filter(|index| *index > 0);
        self.name_line = self
            .name_line
            .map(|index| index.saturating_sub(removed))
            .filter(|index| *index > 0);
    }
}

/// Parse just the buffered span (one record plus its leading comments) to
/// derive a composite key, avoiding any whole-document reparse.
fn key_from_buffered_span(lines: &[String]) -> Result<Option<String>> {
    let text = lines.concat().replace('\t', " ");
    let parsed: Value =
        serde_yaml::from_str(&text).context("parse buffered record span for key detection")?;
    let Some(items) = parsed.as_sequence() else {
        return Ok(None);
    };
    if items.len() != 1 {
        return Ok(None);
    }
    Ok(record_key(&items[0], FileKind::Rules))
}
