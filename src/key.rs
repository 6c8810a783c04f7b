//! Record identity: how a parsed rule yields a stable, displayable key.
//!
//! Rules files address records by the `name` and `tag` fields; unicode
//! definition files address them by the record's sole mapping key. Records
//! lacking the identity fields have no key and are excluded from registries.
use serde_yaml::Value;
use std::path::Path;

/// How records in a file are addressed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileKind {
    /// Composite `name:tag` keys.
    Rules,
    /// Single-key records (unicode char definitions).
    Unicode,
}

impl FileKind {
    pub fn label(self) -> &'static str {
        match self {
            FileKind::Rules => "Non-Unicode",
            FileKind::Unicode => "Unicode",
        }
    }
}

/// True when a file path names a unicode definitions file.
pub fn path_looks_like_unicode(path: &Path) -> bool {
    path.to_string_lossy().to_lowercase().contains("unicode")
}

/// Derive a record's key, or `None` when the identity fields are absent.
pub fn record_key(record: &Value, kind: FileKind) -> Option<String> {
    let map = record.as_mapping()?;
    match kind {
        FileKind::Unicode => {
            let (key, _) = map.iter().next()?;
            scalar_to_string(key)
        }
        FileKind::Rules => {
            let name = scalar_to_string(map.get("name")?)?;
            let tag = render_tag(map.get("tag")?)?;
            Some(format!("{name}:{tag}"))
        }
    }
}

/// A sequence-valued tag is normalized by sorting so element order never
/// changes the key.
fn render_tag(tag: &Value) -> Option<String> {
    match tag {
        Value::Sequence(items) => {
            let mut rendered = items
                .iter()
                .map(scalar_to_string)
                .collect::<Option<Vec<String>>>()?;
            rendered.sort();
            Some(format!("[{}]", rendered.join(", ")))
        }
        other => scalar_to_string(other),
    }
}

/// Render a scalar identity value; containers and null have no key form.
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// Quote a key for display; single-char keys also show their code point so
/// unicode-name records can be audited by eye.
pub fn display_key(key: &str) -> String {
    let mut chars = key.chars();
    if let (Some(only), None) = (chars.next(), chars.next()) {
        return format!("'{key}' (Unicode char: \\u{:04x})", only as u32);
    }
    format!("'{key}'")
}
