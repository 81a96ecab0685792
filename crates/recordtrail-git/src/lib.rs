// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! recordtrail-git: per-file git history for record files
//!
//! This library crate reads the revision history of individual files in a
//! git working tree, retrieves their content at any revision, and compares
//! the checked out branch with its remote.

#![warn(missing_docs)]

//! # Example
//!
//! ```no_run
//! use recordtrail_git::{HistoryOptions, RecordRepo};
//!
//! let repo = RecordRepo::discover(".");
//! let history = repo.file_history_with(
//!     "people/ada.yaml",
//!     &HistoryOptions::latest(10).with_structured_diff(),
//! );
//!
//! for c in &history.commits {
//!     println!("{} - {} (+{} -{})", c.short_hash, c.subject(), c.stats.insertions, c.stats.deletions);
//! }
//! ```

pub mod branch;
pub mod commit;
pub mod error;
pub mod repository;

pub use branch::{BranchInfo, PullOutcome, RepositoryStatus};
pub use commit::{CURRENT_USER, CommitRecord, FileHistory, PENDING_HASH};
pub use error::GitError;
pub use repository::{DEFAULT_HISTORY_LIMIT, HistoryOptions, RecordRepo, WorkingState};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::branch::{BranchInfo, PullOutcome, RepositoryStatus};
    pub use crate::commit::{CommitRecord, FileHistory};
    pub use crate::error::GitError;
    pub use crate::repository::{HistoryOptions, RecordRepo, WorkingState};
}
