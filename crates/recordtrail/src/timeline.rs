// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Merged change feed for one record
//!
//! A record is a primary file plus an optional satellite file holding its
//! linked data. The timeline interleaves the history of both files, newest
//! first, and puts a synthetic pending entry in front for every file whose
//! working-tree bytes differ from its blob at HEAD.

use std::path::Path;

use recordtrail_diff::{StructuredDiff, line_stats, unified_diff};
use recordtrail_git::{
    CommitRecord, DEFAULT_HISTORY_LIMIT, HistoryOptions, RecordRepo, WorkingState,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Which file of a record an entry came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordSource {
    /// The file holding the record's own fields
    Primary,
    /// The file holding data linked to the record
    Satellite,
}

impl RecordSource {
    /// Display name for entries from this source
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Primary => "Record",
            Self::Satellite => "Linked data",
        }
    }

    /// Satellite files hold a list of identified records
    #[must_use]
    pub fn is_record_list(self) -> bool {
        matches!(self, Self::Satellite)
    }
}

/// One commit (or pending edit) in a record's timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    /// The revision data
    #[serde(flatten)]
    pub commit: CommitRecord,
    /// File the revision belongs to
    pub source: RecordSource,
    /// Display label, e.g. `Record: ada.yaml`
    pub label: String,
}

impl TimelineEntry {
    /// Tag a commit with the file it came from
    #[must_use]
    pub fn new(commit: CommitRecord, source: RecordSource, path: &Path) -> Self {
        let label = match path.file_name() {
            Some(name) => format!("{}: {}", source.label(), name.to_string_lossy()),
            None => source.label().to_string(),
        };
        Self {
            commit,
            source,
            label,
        }
    }

    /// True for a synthetic uncommitted-edits entry
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.commit.is_pending()
    }
}

/// The merged feed for one record, with per-source counts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordTimeline {
    /// Pending entries first, then commits newest first
    pub entries: Vec<TimelineEntry>,
    /// Number of entries, pending ones included
    pub total_commits: usize,
    /// Entries from the primary file
    pub primary_commits: usize,
    /// Entries from the satellite file
    pub satellite_commits: usize,
}

impl RecordTimeline {
    /// Order tagged entries and count them
    ///
    /// Pending entries keep their relative order and sort ahead of every
    /// commit; commits sort by timestamp, newest first.
    #[must_use]
    pub fn merge(mut entries: Vec<TimelineEntry>) -> Self {
        entries.sort_by(|a, b| {
            b.is_pending()
                .cmp(&a.is_pending())
                .then_with(|| match (a.is_pending(), b.is_pending()) {
                    (true, true) => std::cmp::Ordering::Equal,
                    _ => b.commit.timestamp.cmp(&a.commit.timestamp),
                })
        });

        let primary_commits = entries
            .iter()
            .filter(|e| e.source == RecordSource::Primary)
            .count();

        Self {
            total_commits: entries.len(),
            satellite_commits: entries.len() - primary_commits,
            primary_commits,
            entries,
        }
    }

    /// Whether the record has neither commits nor pending edits
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Synthetic entries for uncommitted edits
    pub fn pending(&self) -> impl Iterator<Item = &TimelineEntry> {
        self.entries.iter().filter(|e| e.is_pending())
    }
}

/// Builds [`RecordTimeline`]s from a repository handle
#[derive(Debug, Clone)]
pub struct TimelineAggregator<'a> {
    repo: &'a RecordRepo,
    limit: usize,
}

impl<'a> TimelineAggregator<'a> {
    /// Create an aggregator with the default per-file commit limit
    #[must_use]
    pub fn new(repo: &'a RecordRepo) -> Self {
        Self {
            repo,
            limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    /// Bound the number of commits read for each file
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Build the timeline for a primary file and its optional satellite
    ///
    /// A satellite that does not exist on disk is skipped. Outside a
    /// repository the timeline is empty.
    #[must_use]
    pub fn build(&self, primary: &Path, satellite: Option<&Path>) -> RecordTimeline {
        if !self.repo.is_repository() {
            debug!(path = %primary.display(), "Not a repository, empty timeline");
            return RecordTimeline::default();
        }

        let mut entries = self.collect(primary, RecordSource::Primary);
        if let Some(satellite) = satellite {
            if self.exists(satellite) {
                entries.extend(self.collect(satellite, RecordSource::Satellite));
            } else {
                debug!(path = %satellite.display(), "Satellite file missing, skipping");
            }
        }

        let timeline = RecordTimeline::merge(entries);
        debug!(
            path = %primary.display(),
            total = timeline.total_commits,
            primary = timeline.primary_commits,
            satellite = timeline.satellite_commits,
            "Built record timeline"
        );
        timeline
    }

    fn exists(&self, path: &Path) -> bool {
        match self.repo.root() {
            Some(root) if path.is_relative() => root.join(path).exists(),
            _ => path.exists(),
        }
    }

    /// History of one file, tagged, with its pending entry if any
    fn collect(&self, path: &Path, source: RecordSource) -> Vec<TimelineEntry> {
        let options = HistoryOptions::latest(self.limit)
            .with_diff()
            .with_structured_diff()
            .record_list(source.is_record_list());
        let history = self.repo.file_history_with(path, &options);

        let pending = self.pending_entry(path, source);
        history
            .commits
            .into_iter()
            .map(|commit| TimelineEntry::new(commit, source, path))
            .chain(pending)
            .collect()
    }

    /// Entry for uncommitted edits, comparing the working file byte for byte
    /// with its blob at HEAD
    fn pending_entry(&self, path: &Path, source: RecordSource) -> Option<TimelineEntry> {
        let working = match self.repo.working_bytes(path) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read working-tree content");
                return None;
            }
        };
        let relative = match self.repo.relative_path(path) {
            Ok(relative) => relative,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cannot compare file outside repository");
                return None;
            }
        };
        let committed = match self.repo.head_bytes(&relative) {
            Ok(bytes) => bytes.unwrap_or_default(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read committed content");
                return None;
            }
        };

        if committed == working {
            return None;
        }

        let commit = pending_commit(
            &relative,
            &String::from_utf8_lossy(&committed),
            &String::from_utf8_lossy(&working),
            source,
            self.repo.file_state(path),
        );
        debug!(path = %path.display(), source = source.label(), "Found uncommitted changes");
        Some(TimelineEntry::new(commit, source, path))
    }
}

fn pending_commit(
    relative: &Path,
    committed: &str,
    working: &str,
    source: RecordSource,
    state: WorkingState,
) -> CommitRecord {
    let display = relative.to_string_lossy();
    CommitRecord::pending(
        format!("Uncommitted changes ({})", state.as_str()),
        line_stats(committed, working),
        Some(unified_diff(&display, committed, working)),
        Some(StructuredDiff::compare_text(
            committed,
            working,
            source.is_record_list(),
        )),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use recordtrail_diff::ChangeStats;
    use similar_asserts::assert_eq;

    fn commit(hash: &str, seconds: i64) -> CommitRecord {
        CommitRecord {
            hash: hash.to_string(),
            short_hash: hash.chars().take(7).collect(),
            author: "Test Author".to_string(),
            author_email: "test@example.com".to_string(),
            timestamp: Utc.timestamp_opt(seconds, 0).single().expect("valid timestamp"),
            message: format!("Commit {hash}"),
            stats: ChangeStats::default(),
            diff: None,
            structured_diff: None,
        }
    }

    fn pending() -> CommitRecord {
        CommitRecord::pending("Uncommitted changes (modified)", ChangeStats::default(), None, None)
    }

    fn entry(commit: CommitRecord, source: RecordSource) -> TimelineEntry {
        TimelineEntry::new(commit, source, Path::new("people/ada.yaml"))
    }

    #[test]
    fn test_source_labels() {
        assert_eq!(RecordSource::Primary.label(), "Record");
        assert_eq!(RecordSource::Satellite.label(), "Linked data");
        assert!(RecordSource::Satellite.is_record_list());
        assert!(!RecordSource::Primary.is_record_list());
    }

    #[test]
    fn test_entry_label_uses_file_name() {
        let e = TimelineEntry::new(commit("a", 1), RecordSource::Satellite, Path::new("links/ada.yaml"));
        assert_eq!(e.label, "Linked data: ada.yaml");
    }

    #[test]
    fn test_merge_puts_pending_first_then_newest() {
        let timeline = RecordTimeline::merge(vec![
            entry(commit("t1", 100), RecordSource::Primary),
            entry(commit("t2", 200), RecordSource::Primary),
            entry(commit("t15", 150), RecordSource::Satellite),
            entry(pending(), RecordSource::Satellite),
        ]);

        let hashes: Vec<&str> = timeline.entries.iter().map(|e| e.commit.hash.as_str()).collect();
        assert_eq!(hashes, vec!["pending", "t2", "t15", "t1"]);
        assert_eq!(timeline.total_commits, 4);
        assert_eq!(timeline.primary_commits, 2);
        assert_eq!(timeline.satellite_commits, 2);
        assert_eq!(timeline.pending().count(), 1);
    }

    #[test]
    fn test_merge_empty() {
        let timeline = RecordTimeline::merge(Vec::new());
        assert!(timeline.is_empty());
        assert_eq!(timeline, RecordTimeline::default());
    }

    #[test]
    fn test_entry_serializes_flattened() {
        let e = entry(commit("abc1234def", 100), RecordSource::Primary);
        let json = serde_json::to_value(&e).expect("serialize");
        assert_eq!(json["hash"], serde_json::json!("abc1234def"));
        assert_eq!(json["source"], serde_json::json!("primary"));
        assert_eq!(json["label"], serde_json::json!("Record: ada.yaml"));
        assert!(json.get("commit").is_none());
    }

    #[test]
    fn test_pending_commit_diffs_against_committed() {
        let record = pending_commit(
            Path::new("links/ada.yaml"),
            "- uuid: l1\n  note: a\n",
            "- uuid: l1\n  note: a\n- uuid: l2\n  note: b\n",
            RecordSource::Satellite,
            WorkingState::Modified,
        );

        assert!(record.is_pending());
        assert_eq!(record.message, "Uncommitted changes (modified)");
        assert_eq!(record.stats.insertions, 2);
        let structured = record.structured_diff.expect("structured diff");
        assert_eq!(structured.summary, "1 added");
        assert_eq!(structured.changes[0].path, "uuid=l2");
        assert!(record.diff.expect("diff").starts_with("--- a/links/ada.yaml\n"));
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn arb_entry() -> impl Strategy<Value = TimelineEntry> {
            (any::<bool>(), 0i64..1_000_000, any::<bool>()).prop_map(|(is_pending, seconds, primary)| {
                let source = if primary {
                    RecordSource::Primary
                } else {
                    RecordSource::Satellite
                };
                let c = if is_pending { pending() } else { commit("c", seconds) };
                entry(c, source)
            })
        }

        proptest! {
            #[test]
            fn merge_orders_pending_then_newest(entries in prop::collection::vec(arb_entry(), 0..20)) {
                let timeline = RecordTimeline::merge(entries);

                let first_real = timeline.entries.iter().position(|e| !e.is_pending());
                if let Some(idx) = first_real {
                    prop_assert!(timeline.entries[idx..].iter().all(|e| !e.is_pending()));
                    for pair in timeline.entries[idx..].windows(2) {
                        prop_assert!(pair[0].commit.timestamp >= pair[1].commit.timestamp);
                    }
                }
            }

            #[test]
            fn merge_counts_add_up(entries in prop::collection::vec(arb_entry(), 0..20)) {
                let n = entries.len();
                let timeline = RecordTimeline::merge(entries);
                prop_assert_eq!(timeline.total_commits, n);
                prop_assert_eq!(timeline.primary_commits + timeline.satellite_commits, n);
            }
        }
    }
}
