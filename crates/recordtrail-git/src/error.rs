// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Error types for recordtrail-git
//!
//! These never cross the read API: [`crate::RecordRepo`] logs them and
//! degrades to an empty result. The `try_*` methods expose them for callers
//! that want to tell the cases apart.

use thiserror::Error;

/// Failures while reading record history from git
#[derive(Debug, Error)]
pub enum GitError {
    /// libgit2 reported a failure
    #[error("Git error: {0}")]
    Git2(#[from] git2::Error),

    /// No working tree was found from the starting directory
    #[error("No git working tree found from {path}")]
    RepositoryNotFound {
        /// Directory the search started from
        path: String,
    },

    /// A revision or branch name that does not resolve to a commit
    #[error("Unknown revision or branch: {reference}")]
    InvalidReference {
        /// The unresolved name
        reference: String,
    },

    /// A record path that is not inside the working tree
    #[error("Path is outside the repository: {path}")]
    PathOutsideRepository {
        /// The record path as given
        path: String,
    },

    /// A working-tree file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
