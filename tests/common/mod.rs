//! Shared test infrastructure for integration tests.
//!
//! Each fixture is a fresh temp directory holding an English and a translated
//! rules file; tests run the real binary against them and inspect stdout,
//! exit status, and the files left behind.

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

pub struct AuditFixture {
    pub dir: TempDir,
    pub english: PathBuf,
    pub translated: PathBuf,
}

impl AuditFixture {
    pub fn new(english_text: &str, translated_text: &str) -> AuditFixture {
        AuditFixture::with_names(
            "english.yaml",
            english_text,
            "translated.yaml",
            translated_text,
        )
    }

    pub fn with_names(
        english_name: &str,
        english_text: &str,
        translated_name: &str,
        translated_text: &str,
    ) -> AuditFixture {
        let dir = TempDir::new().expect("create fixture dir");
        let english = dir.path().join(english_name);
        let translated = dir.path().join(translated_name);
        fs::write(&english, english_text).expect("write english fixture");
        fs::write(&translated, translated_text).expect("write translated fixture");
        AuditFixture {
            dir,
            english,
            translated,
        }
    }

    /// Run taudit against the fixture files with extra CLI arguments.
    pub fn run(&self, extra_args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_taudit"))
            .arg(&self.english)
            .arg(&self.translated)
            .args(extra_args)
            .output()
            .expect("run taudit")
    }

    pub fn translated_text(&self) -> String {
        fs::read_to_string(&self.translated).expect("read translated file")
    }

    /// Backup files created next to the translated file, sorted by name.
    pub fn backups(&self) -> Vec<PathBuf> {
        let mut backups: Vec<PathBuf> = fs::read_dir(self.dir.path())
            .expect("list fixture dir")
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| path.to_string_lossy().ends_with(".bak"))
            .collect();
        backups.sort();
        backups
    }
}

pub fn stdout_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}
