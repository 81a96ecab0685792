// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Structured YAML diffing
//!
//! Two parsed documents are walked in parallel and every difference is
//! reported once, addressed by a dot-separated path from the document root.
//! Sequences whose elements carry a stable identifier are compared by that
//! identifier instead of by position, so appending one record to a long list
//! reports one addition rather than a rewrite of the whole list.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use tracing::warn;

/// Summary used when either side fails to parse
pub const PARSE_ERROR_SUMMARY: &str = "Error parsing YAML content";

/// Summary used when the documents are structurally equal
pub const NO_CHANGES_SUMMARY: &str = "No changes detected";

/// Path reported for a change to the document root itself
pub const ROOT_PATH: &str = "(root)";

/// Kind of a single structural change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    /// Present only in the new document
    Added,
    /// Present only in the old document
    Removed,
    /// Present in both with different values
    Modified,
}

impl ChangeType {
    /// The change seen from the other direction
    #[must_use]
    pub fn inverse(self) -> Self {
        match self {
            Self::Added => Self::Removed,
            Self::Removed => Self::Added,
            Self::Modified => Self::Modified,
        }
    }
}

/// One path-addressed change between two documents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// What kind of change this is
    #[serde(rename = "type")]
    pub change_type: ChangeType,
    /// Dot-separated location, or `<field>=<id>` for identified records
    pub path: String,
    /// Value before the change (absent for additions)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<Value>,
    /// Value after the change (absent for removals)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<Value>,
    /// Human readable description
    pub description: String,
}

impl ChangeRecord {
    fn added(path: String, value: &Value) -> Self {
        let description = format!("Added {path}");
        Self {
            change_type: ChangeType::Added,
            path,
            old_value: None,
            new_value: Some(value.clone()),
            description,
        }
    }

    fn removed(path: String, value: &Value) -> Self {
        let description = format!("Removed {path}");
        Self {
            change_type: ChangeType::Removed,
            path,
            old_value: Some(value.clone()),
            new_value: None,
            description,
        }
    }

    fn modified(path: String, old: &Value, new: &Value) -> Self {
        let description = match (render_scalar(old), render_scalar(new)) {
            (Some(o), Some(n)) => format!("Changed {path} from {o} to {n}"),
            _ => format!("Changed {path}"),
        };
        Self {
            change_type: ChangeType::Modified,
            path,
            old_value: Some(old.clone()),
            new_value: Some(new.clone()),
            description,
        }
    }

    fn resized(path: String, old: &[Value], new: &[Value]) -> Self {
        let description = format!(
            "{path} changed from {} to {} items",
            old.len(),
            new.len()
        );
        Self {
            change_type: ChangeType::Modified,
            path,
            old_value: Some(Value::Sequence(old.to_vec())),
            new_value: Some(Value::Sequence(new.to_vec())),
            description,
        }
    }
}

/// Result of comparing two structured documents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredDiffResult {
    /// True when at least one change was found
    pub has_changes: bool,
    /// Changes in document order, one per path
    pub changes: Vec<ChangeRecord>,
    /// Counts by kind, e.g. `2 added, 1 removed`
    pub summary: String,
}

impl StructuredDiffResult {
    /// A result with no changes
    #[must_use]
    pub fn unchanged() -> Self {
        Self::from_changes(Vec::new())
    }

    /// The fixed result returned when either side cannot be parsed
    #[must_use]
    pub fn parse_error() -> Self {
        Self {
            has_changes: false,
            changes: Vec::new(),
            summary: PARSE_ERROR_SUMMARY.to_string(),
        }
    }

    fn from_changes(changes: Vec<ChangeRecord>) -> Self {
        let mut result = Self {
            has_changes: !changes.is_empty(),
            changes,
            summary: String::new(),
        };
        result.summary = result.build_summary();
        result
    }

    /// Number of changes of the given kind
    #[must_use]
    pub fn count(&self, change_type: ChangeType) -> usize {
        self.changes
            .iter()
            .filter(|c| c.change_type == change_type)
            .count()
    }

    /// Find the change reported at a path
    #[must_use]
    pub fn change_at(&self, path: &str) -> Option<&ChangeRecord> {
        self.changes.iter().find(|c| c.path == path)
    }

    fn build_summary(&self) -> String {
        if self.changes.is_empty() {
            return NO_CHANGES_SUMMARY.to_string();
        }
        [
            (ChangeType::Added, "added"),
            (ChangeType::Modified, "modified"),
            (ChangeType::Removed, "removed"),
        ]
        .iter()
        .filter_map(|(kind, label)| match self.count(*kind) {
            0 => None,
            n => Some(format!("{n} {label}")),
        })
        .collect::<Vec<_>>()
        .join(", ")
    }
}

/// Structured diff engine
///
/// A sequence is compared by identity when every element on both sides is a
/// mapping exposing one of `id_fields` with a unique scalar value, and each
/// element also exposes a foreign-key-like field (a key ending in one of
/// `foreign_key_suffixes`). For a document flagged as a record list, the
/// top-level sequence only needs the identifier.
#[derive(Debug, Clone)]
pub struct StructuredDiff {
    /// Candidate identifier fields, in order of preference
    pub id_fields: Vec<String>,
    /// Key suffixes that mark a reference to another record
    pub foreign_key_suffixes: Vec<String>,
}

impl Default for StructuredDiff {
    fn default() -> Self {
        Self {
            id_fields: vec!["uuid".to_string(), "id".to_string()],
            foreign_key_suffixes: ["_id", "_uuid", "Id", "Uuid"]
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        }
    }
}

impl StructuredDiff {
    /// Compare two YAML snapshots with the default engine
    #[must_use]
    pub fn compare_text(old: &str, new: &str, record_list: bool) -> StructuredDiffResult {
        Self::default().diff_text(old, new, record_list)
    }

    /// Parse and compare two YAML snapshots
    ///
    /// Empty text is an empty document (`{}`, or `[]` for a record list).
    /// If either side fails to parse the failure is logged and the
    /// [`StructuredDiffResult::parse_error`] sentinel is returned.
    #[must_use]
    pub fn diff_text(&self, old: &str, new: &str, record_list: bool) -> StructuredDiffResult {
        let parsed = parse_document(old, record_list)
            .and_then(|o| parse_document(new, record_list).map(|n| (o, n)));

        match parsed {
            Ok((old_doc, new_doc)) => self.diff_documents(&old_doc, &new_doc, record_list),
            Err(e) => {
                warn!(error = %e, "Failed to parse YAML content for structured diff");
                StructuredDiffResult::parse_error()
            }
        }
    }

    /// Compare two already parsed documents
    #[must_use]
    pub fn diff_documents(&self, old: &Value, new: &Value, record_list: bool) -> StructuredDiffResult {
        let mut changes = Vec::new();
        self.diff_value("", old, new, record_list, &mut changes);
        StructuredDiffResult::from_changes(changes)
    }

    fn diff_value(
        &self,
        path: &str,
        old: &Value,
        new: &Value,
        record_list: bool,
        out: &mut Vec<ChangeRecord>,
    ) {
        if old == new {
            return;
        }
        match (old, new) {
            (Value::Mapping(a), Value::Mapping(b)) => self.diff_mappings(path, a, b, out),
            (Value::Sequence(a), Value::Sequence(b)) => {
                self.diff_sequences(path, a, b, record_list, out);
            }
            _ => out.push(ChangeRecord::modified(display_path(path), old, new)),
        }
    }

    fn diff_mappings(&self, path: &str, old: &Mapping, new: &Mapping, out: &mut Vec<ChangeRecord>) {
        for (key, old_value) in old {
            let child = join_path(path, &key_token(key));
            match new.get(key) {
                None => out.push(ChangeRecord::removed(child, old_value)),
                Some(new_value) => self.diff_value(&child, old_value, new_value, false, out),
            }
        }
        for (key, new_value) in new {
            if !old.contains_key(key) {
                out.push(ChangeRecord::added(join_path(path, &key_token(key)), new_value));
            }
        }
    }

    fn diff_sequences(
        &self,
        path: &str,
        old: &[Value],
        new: &[Value],
        record_list: bool,
        out: &mut Vec<ChangeRecord>,
    ) {
        if let Some(field) = self.identity_field(old, new, record_list) {
            self.diff_records(path, field, old, new, out);
            return;
        }

        if old.len() != new.len() {
            out.push(ChangeRecord::resized(display_path(path), old, new));
            return;
        }

        for (i, (a, b)) in old.iter().zip(new).enumerate() {
            self.diff_value(&join_path(path, &i.to_string()), a, b, false, out);
        }
    }

    fn diff_records(
        &self,
        path: &str,
        field: &str,
        old: &[Value],
        new: &[Value],
        out: &mut Vec<ChangeRecord>,
    ) {
        let old_ids: Vec<(String, &Value)> = old
            .iter()
            .filter_map(|v| record_id(v, field).map(|id| (id, v)))
            .collect();
        let new_ids: Vec<(String, &Value)> = new
            .iter()
            .filter_map(|v| record_id(v, field).map(|id| (id, v)))
            .collect();
        let old_by_id: HashMap<&str, &Value> =
            old_ids.iter().map(|(id, v)| (id.as_str(), *v)).collect();
        let new_by_id: HashMap<&str, &Value> =
            new_ids.iter().map(|(id, v)| (id.as_str(), *v)).collect();

        for (id, old_value) in &old_ids {
            let token = record_token(path, field, id);
            match new_by_id.get(id.as_str()) {
                None => out.push(ChangeRecord::removed(token, old_value)),
                Some(new_value) if new_value != old_value => {
                    out.push(ChangeRecord::modified(token, old_value, new_value));
                }
                Some(_) => {}
            }
        }
        for (id, new_value) in &new_ids {
            if !old_by_id.contains_key(id.as_str()) {
                let token = record_token(path, field, id);
                out.push(ChangeRecord::added(token, new_value));
            }
        }
    }

    /// Pick the identifier field shared by every element on both sides
    fn identity_field(&self, old: &[Value], new: &[Value], record_list: bool) -> Option<&str> {
        if old.is_empty() && new.is_empty() {
            return None;
        }
        self.id_fields.iter().map(String::as_str).find(|field| {
            [old, new].iter().all(|side| {
                let mut seen = HashSet::new();
                side.iter().all(|element| {
                    let Some(id) = record_id(element, field) else {
                        return false;
                    };
                    seen.insert(id) && (record_list || self.has_foreign_key(element, field))
                })
            })
        })
    }

    fn has_foreign_key(&self, element: &Value, id_field: &str) -> bool {
        let Value::Mapping(map) = element else {
            return false;
        };
        map.keys().filter_map(Value::as_str).any(|key| {
            key != id_field
                && self
                    .foreign_key_suffixes
                    .iter()
                    .any(|suffix| key.len() > suffix.len() && key.ends_with(suffix.as_str()))
        })
    }
}

/// Parse one snapshot, treating empty input as an empty document
fn parse_document(text: &str, record_list: bool) -> Result<Value, serde_yaml::Error> {
    let empty = || {
        if record_list {
            Value::Sequence(Vec::new())
        } else {
            Value::Mapping(Mapping::new())
        }
    };
    if text.trim().is_empty() {
        return Ok(empty());
    }
    match serde_yaml::from_str::<Value>(text)? {
        Value::Null => Ok(empty()),
        doc => Ok(doc),
    }
}

fn record_id(element: &Value, field: &str) -> Option<String> {
    let Value::Mapping(map) = element else {
        return None;
    };
    match map.get(field)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Path segment for a mapping key
///
/// String keys are written bare unless they contain path syntax, in which
/// case they are quoted. Other keys are bracketed, so the integer key `1`
/// reads `[1]` while the string key `"1"` reads `1`.
fn key_token(key: &Value) -> String {
    match key {
        Value::String(s) => quote_segment(s),
        Value::Number(n) => format!("[{n}]"),
        Value::Bool(b) => format!("[{b}]"),
        Value::Null => "[null]".to_string(),
        other => {
            let rendered = serde_yaml::to_string(other).unwrap_or_default();
            format!("[{}]", rendered.trim().replace('\n', " "))
        }
    }
}

fn quote_segment(segment: &str) -> String {
    let needs_quotes = segment.is_empty()
        || segment
            .chars()
            .any(|c| matches!(c, '.' | '"' | '\\' | '[' | ']' | '='));
    if !needs_quotes {
        return segment.to_string();
    }
    let escaped = segment.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

fn record_token(parent: &str, field: &str, id: &str) -> String {
    join_path(parent, &format!("{field}={}", quote_segment(id)))
}

fn join_path(parent: &str, segment: &str) -> String {
    if parent.is_empty() {
        segment.to_string()
    } else {
        format!("{parent}.{segment}")
    }
}

fn display_path(path: &str) -> String {
    if path.is_empty() {
        ROOT_PATH.to_string()
    } else {
        path.to_string()
    }
}

fn render_scalar(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some("null".to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(format!("\"{s}\"")),
        _ => None,
    }
}
