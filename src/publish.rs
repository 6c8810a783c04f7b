//! Backup naming and atomic replacement of the translated file.
//!
//! The rewritten content is staged to a temp file in the target's directory;
//! replacement is backup-then-rename so observers only ever see the fully-old
//! or fully-new file.
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// First free backup name: `<file>.bak`, then `<file>-2.bak`, `<file>-3.bak`.
pub fn backup_path(target: &Path) -> PathBuf {
    let base = target.display().to_string();
    let mut candidate = PathBuf::from(format!("{base}.bak"));
    let mut counter = 2;
    while candidate.exists() {
        candidate = PathBuf::from(format!("{base}-{counter}.bak"));
        counter += 1;
    }
    candidate
}

/// Create the staging temp file next to the target so the final rename stays
/// on one filesystem.
pub fn stage_next_to(target: &Path) -> Result<NamedTempFile> {
    let dir = target
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let prefix = target
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "staged".to_string());
    tempfile::Builder::new()
        .prefix(&prefix)
        .tempfile_in(dir)
        .with_context(|| format!("create staging file in {}", dir.display()))
}

/// Move the target aside to a fresh backup name, then persist the staged
/// file over the target path.
pub fn replace_with_backup(target: &Path, staged: NamedTempFile) -> Result<PathBuf> {
    let backup = backup_path(target);
    std::fs::rename(target, &backup)
        .with_context(|| format!("back up {} to {}", target.display(), backup.display()))?;
    staged
        .persist(target)
        .map_err(|err| err.error)
        .with_context(|| format!("replace {}", target.display()))?;
    Ok(backup)
}
