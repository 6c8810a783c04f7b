//! Verbatim extraction of one record's source lines from the English file.
//!
//! Reuses the block scanner, but keeps buffering until the record *after* the
//! target starts; only then is the target's trailing-comment boundary known.
//! The returned lines are byte-identical to the English file's own text.
use crate::key::FileKind;
use crate::segment::{BlockScanner, LinePatterns};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Grab the lines for `missing_key` from the English file, including its
/// leading comments and blank lines, trimmed to its last content line.
/// Returns an empty list when the key is never found.
pub fn grab_missing_record_lines(
    missing_key: &str,
    english_path: &Path,
    kind: FileKind,
    patterns: &LinePatterns,
) -> Result<Vec<String>> {
    tracing::debug!(key = missing_key, "scanning English file for missing record");
    let text = fs::read_to_string(english_path)
        .with_context(|| format!("read {}", english_path.display()))?;

    let mut scanner = BlockScanner::new(patterns, kind);
    for line in text.split_inclusive('\n') {
        scanner.observe_document_start(line);
        if !scanner.past_document_start() || patterns.is_audit_comment(line) {
            continue;
        }

        if scanner.is_record_boundary(line) {
            if scanner.current_key() == Some(missing_key) {
                // The buffer now holds the target record plus comments that
                // belong to the record after it; trim below.
                break;
            }
            scanner.take_block();
            scanner.reset_key();
        }

        scanner.buffer_line(line);
        scanner.detect_key(line)?;
    }

    if scanner.current_key() != Some(missing_key) {
        return Ok(Vec::new());
    }
    scanner.trim_trailing();
    Ok(scanner.take_all())
}
