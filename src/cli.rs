//! CLI argument parsing for the translation audit.
//!
//! The CLI is intentionally thin: it names the two files and picks a mode;
//! all policy lives in the audit pipeline so the same core logic can be
//! reused elsewhere.
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Root CLI entrypoint for the audit.
#[derive(Parser, Debug)]
#[command(
    name = "taudit",
    version,
    about = "Audit a translated rules file against its English version",
    after_help = "Examples:\n  taudit Rules/Languages/en/general.yaml Rules/Languages/fr/general.yaml\n  taudit --mode rewrite en/unicode.yaml sv/unicode.yaml\n  taudit --json en/general.yaml de/general.yaml"
)]
pub struct RootArgs {
    /// The English version of the rules YAML file
    #[arg(value_name = "ENGLISH_RULES")]
    pub english_rules: PathBuf,

    /// The translated version of the rules YAML file
    #[arg(value_name = "TRANSLATED_RULES")]
    pub translated_rules: PathBuf,

    /// Report differences (default) or rewrite the translated file with
    /// audit comments where translation is needed
    #[arg(long, value_enum, default_value = "report")]
    pub mode: Mode,

    /// Force unicode-definitions handling on or off; 'auto' inspects the
    /// translated file name for 'unicode'
    #[arg(long, value_enum, default_value = "auto")]
    pub unicode: UnicodeFlag,

    /// Emit a machine-readable JSON summary instead of warnings (report mode)
    #[arg(long)]
    pub json: bool,
}

/// What to do with the findings.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// List differences between the files as warnings
    Report,
    /// Create a new version of the translated file with audit comments
    Rewrite,
}

/// How to decide between rules-file and unicode-file addressing.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnicodeFlag {
    /// Treat the files as unicode definitions
    True,
    /// Treat the files as ordinary rules
    False,
    /// Detect from the translated file name
    Auto,
}
