//! Commit and file history types

use chrono::{DateTime, TimeZone, Utc};
use recordtrail_diff::{ChangeStats, StructuredDiffResult};
use serde::{Deserialize, Serialize};

/// Hash carried by synthetic entries for uncommitted edits
pub const PENDING_HASH: &str = "pending";

/// Author label carried by synthetic entries for uncommitted edits
pub const CURRENT_USER: &str = "current user";

/// One revision of a file, as seen from that file's history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitRecord {
    /// The full commit SHA (40 hex characters), or `pending`
    pub hash: String,
    /// The first 7 characters of the hash
    pub short_hash: String,
    /// Author name
    pub author: String,
    /// Author email
    pub author_email: String,
    /// Author timestamp
    pub timestamp: DateTime<Utc>,
    /// Commit message, untrimmed
    pub message: String,
    /// Line changes to the file in this revision
    pub stats: ChangeStats,
    /// Unified diff of the file against its parent revision (if requested)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff: Option<String>,
    /// Structured diff of the file against its parent revision (if requested)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_diff: Option<StructuredDiffResult>,
}

impl CommitRecord {
    /// Build a record from a git2 commit, without diff information
    pub(crate) fn from_git2(commit: &git2::Commit<'_>) -> Self {
        let author = commit.author();
        let timestamp = Utc
            .timestamp_opt(author.when().seconds(), 0)
            .single()
            .unwrap_or_else(Utc::now);
        let hash = commit.id().to_string();

        Self {
            short_hash: short(&hash).to_string(),
            hash,
            author: author.name().unwrap_or("Unknown").to_string(),
            author_email: author.email().unwrap_or("").to_string(),
            timestamp,
            message: commit.message().unwrap_or("").to_string(),
            stats: ChangeStats::default(),
            diff: None,
            structured_diff: None,
        }
    }

    /// A synthetic record standing for uncommitted working-tree edits
    #[must_use]
    pub fn pending(
        message: impl Into<String>,
        stats: ChangeStats,
        diff: Option<String>,
        structured_diff: Option<StructuredDiffResult>,
    ) -> Self {
        Self {
            hash: PENDING_HASH.to_string(),
            short_hash: PENDING_HASH.to_string(),
            author: CURRENT_USER.to_string(),
            author_email: String::new(),
            timestamp: Utc::now(),
            message: message.into(),
            stats,
            diff,
            structured_diff,
        }
    }

    /// True for a synthetic uncommitted-edits record
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.hash == PENDING_HASH
    }

    /// Get the first line of the commit message (subject)
    #[must_use]
    pub fn subject(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }
}

fn short(hash: &str) -> &str {
    &hash[..7.min(hash.len())]
}

/// Revision history of a single file, newest first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileHistory {
    /// The path the history was requested for
    pub path: String,
    /// Commits that touched the path, newest first
    pub commits: Vec<CommitRecord>,
    /// Number of commits returned
    pub total_commits: usize,
    /// The oldest commit returned (last element)
    pub first_commit: Option<CommitRecord>,
    /// The newest commit (first element)
    pub last_commit: Option<CommitRecord>,
}

impl FileHistory {
    /// Build a history from commits ordered newest first
    #[must_use]
    pub fn new(path: impl Into<String>, commits: Vec<CommitRecord>) -> Self {
        Self {
            path: path.into(),
            total_commits: commits.len(),
            first_commit: commits.last().cloned(),
            last_commit: commits.first().cloned(),
            commits,
        }
    }

    /// A history with no commits
    #[must_use]
    pub fn empty(path: impl Into<String>) -> Self {
        Self::new(path, Vec::new())
    }

    /// True when no commit touched the path
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }
}
