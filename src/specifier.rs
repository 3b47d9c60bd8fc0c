//! Import specifier normalization and tier classification.
//!
//! Build tooling hands us import records in many shapes: a bare string, a
//! list, a keyed table, or records naming the specifier under one of a few
//! field names. [`extract_specifiers`] turns any of them into one ordered,
//! deduplicated list.

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// Where a specifier's package comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Builtin,
    Local,
    Registry,
}

impl Tier {
    /// Classify a specifier. `namespace_prefix` is e.g. `@builtin/`.
    pub fn classify(specifier: &str, namespace_prefix: &str) -> Tier {
        if specifier.starts_with(namespace_prefix) {
            Tier::Builtin
        } else if specifier.starts_with("./") || specifier.starts_with("../") {
            Tier::Local
        } else {
            Tier::Registry
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Tier::Builtin => "builtin",
            Tier::Local => "local",
            Tier::Registry => "registry",
        };
        f.write_str(s)
    }
}

/// The package a specifier addresses, dropping any subpath:
/// `@scope/pkg/sub` -> `@scope/pkg`, `left-pad/lib/x` -> `left-pad`.
/// Local specifiers name a directory and are returned unchanged.
pub fn package_name<'s>(specifier: &'s str, tier: Tier, namespace_prefix: &str) -> &'s str {
    let (skip, rest) = match tier {
        Tier::Local => return specifier.trim_end_matches('/'),
        Tier::Builtin => (namespace_prefix.len(), &specifier[namespace_prefix.len()..]),
        Tier::Registry if specifier.starts_with('@') => match specifier.find('/') {
            Some(idx) => (idx + 1, &specifier[idx + 1..]),
            None => return specifier,
        },
        Tier::Registry => (0, specifier),
    };
    match rest.find('/') {
        Some(idx) => &specifier[..skip + idx],
        None => specifier,
    }
}

/// Field names a record may carry its specifier under, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordField {
    Specifier,
    Source,
    Module,
    Path,
}

impl RecordField {
    pub const ALL: [RecordField; 4] = [
        RecordField::Specifier,
        RecordField::Source,
        RecordField::Module,
        RecordField::Path,
    ];

    pub fn key(self) -> &'static str {
        match self {
            RecordField::Specifier => "specifier",
            RecordField::Source => "source",
            RecordField::Module => "module",
            RecordField::Path => "path",
        }
    }
}

/// One recognized import record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportRecord {
    Bare(String),
    Record { field: RecordField, specifier: String },
}

impl ImportRecord {
    /// Recognize a single entry. Returns `None` for anything that carries no
    /// usable specifier.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => non_empty(s).map(ImportRecord::Bare),
            Value::Object(map) => RecordField::ALL.iter().find_map(|field| {
                map.get(field.key())
                    .and_then(Value::as_str)
                    .and_then(non_empty)
                    .map(|specifier| ImportRecord::Record {
                        field: *field,
                        specifier,
                    })
            }),
            _ => None,
        }
    }

    pub fn into_specifier(self) -> String {
        match self {
            ImportRecord::Bare(s) => s,
            ImportRecord::Record { specifier, .. } => specifier,
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Normalize an arbitrary import collection into ordered, unique specifiers.
///
/// Accepts `null`, a string, an array of strings/records, a single record, or
/// an object whose values are strings/records. Entries that match no known
/// shape are dropped.
pub fn extract_specifiers(input: &Value) -> Vec<String> {
    let mut records = Vec::new();

    match input {
        Value::Null => {}
        Value::Array(items) => collect_entries(items.iter(), &mut records),
        Value::Object(map) => match ImportRecord::from_value(input) {
            Some(record) => records.push(record),
            None => collect_entries(map.values(), &mut records),
        },
        other => collect_entries(std::iter::once(other), &mut records),
    }

    dedup_specifiers(records.into_iter().map(ImportRecord::into_specifier))
}

fn collect_entries<'a>(entries: impl Iterator<Item = &'a Value>, out: &mut Vec<ImportRecord>) {
    for entry in entries {
        match ImportRecord::from_value(entry) {
            Some(record) => out.push(record),
            None => debug!("Dropping unrecognized import record: {}", entry),
        }
    }
}

/// Keep the first occurrence of every specifier, preserving order.
pub fn dedup_specifiers(specifiers: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    specifiers
        .into_iter()
        .filter(|s| seen.insert(s.clone()))
        .collect()
}
