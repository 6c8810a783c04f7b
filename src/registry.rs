//! Order-preserving key registry for one file's root sequence.
//!
//! Ordering is an explicit property here: the registry keeps the key list in
//! file order alongside the lookup map, plus each key's predecessor so
//! insertion points for missing records can be reconstructed later.
use crate::key::{record_key, FileKind};
use serde_yaml::Value;
use std::collections::HashMap;

/// Which file a registry was built from, for duplicate reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileOrigin {
    English,
    Translated,
}

impl FileOrigin {
    pub fn label(self) -> &'static str {
        match self {
            FileOrigin::English => "english",
            FileOrigin::Translated => "translated",
        }
    }
}

/// Key-addressed view of a file's records, in file order.
pub struct Registry {
    keys: Vec<String>,
    records: HashMap<String, Value>,
    occurs_after: HashMap<String, Option<String>>,
    duplicates: Vec<String>,
    origin: FileOrigin,
}

impl Registry {
    /// Walk the root sequence in order, registering each keyed record once.
    ///
    /// Records without identity fields are skipped (logged, not reported);
    /// duplicate keys keep the first occurrence and are recorded as a fatal
    /// finding. The predecessor anchor advances past duplicates so later
    /// records still chain to the record physically before them.
    pub fn build(root: &[Value], kind: FileKind, origin: FileOrigin) -> Registry {
        let mut registry = Registry {
            keys: Vec::new(),
            records: HashMap::new(),
            occurs_after: HashMap::new(),
            duplicates: Vec::new(),
            origin,
        };

        let mut previous_key: Option<String> = None;
        for (index, record) in root.iter().enumerate() {
            let Some(key) = record_key(record, kind) else {
                tracing::debug!(
                    index,
                    origin = origin.label(),
                    "record lacks identity fields; excluded from registry"
                );
                continue;
            };
            if registry.records.contains_key(&key) {
                registry.duplicates.push(key.clone());
            } else {
                registry.keys.push(key.clone());
                registry.records.insert(key.clone(), record.clone());
                registry.occurs_after.insert(key.clone(), previous_key);
            }
            previous_key = Some(key);
        }

        registry
    }

    /// Keys in file order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.keys.iter()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.records.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.records.get(key)
    }

    /// Key of the record physically preceding `key`, `None` for the first.
    pub fn occurs_after(&self, key: &str) -> Option<&Option<String>> {
        self.occurs_after.get(key)
    }

    /// Duplicate keys found while building, in discovery order.
    pub fn duplicates(&self) -> &[String] {
        &self.duplicates
    }

    pub fn origin(&self) -> FileOrigin {
        self.origin
    }
}
