// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Per-file history over a git working tree
//!
//! [`RecordRepo`] is a caller-owned handle: it resolves the repository root
//! once and opens a fresh `git2::Repository` for every call, so one handle
//! can be shared across threads and several handles can point at different
//! repositories in the same process.
//!
//! Read operations never fail. A missing repository, a file that was never
//! committed and a backend error all produce the same empty result; backend
//! errors are logged once. The `try_*` variants return the underlying error.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use git2::{ErrorCode, Oid, Repository, Sort, Status, Tree};
use recordtrail_diff::{ChangeStats, StructuredDiff, line_stats, unified_diff};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::commit::{CommitRecord, FileHistory};
use crate::error::GitError;

/// Default bound on the number of commits returned for one file
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Configuration for retrieving a file's history
#[derive(Debug, Clone, Default)]
pub struct HistoryOptions {
    /// Maximum number of commits to retrieve
    pub limit: Option<usize>,
    /// Attach a unified diff against the parent revision
    pub include_diff: bool,
    /// Attach a structured diff against the parent revision
    pub include_structured: bool,
    /// Parse the file as a list of identified records
    pub record_list: bool,
}

impl HistoryOptions {
    /// Create options for the N most recent commits
    #[must_use]
    pub fn latest(n: usize) -> Self {
        Self {
            limit: Some(n),
            ..Default::default()
        }
    }

    /// Create options with unified diff rendering enabled
    #[must_use]
    pub fn with_diff(mut self) -> Self {
        self.include_diff = true;
        self
    }

    /// Create options with structured diffing enabled
    #[must_use]
    pub fn with_structured_diff(mut self) -> Self {
        self.include_structured = true;
        self
    }

    /// Treat the file as a record list when diffing
    #[must_use]
    pub fn record_list(mut self, record_list: bool) -> Self {
        self.record_list = record_list;
        self
    }
}

/// Working-tree state of a single file relative to HEAD and the index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkingState {
    /// Identical to HEAD
    Clean,
    /// Edited in the working tree
    Modified,
    /// Changed in the index only
    Staged,
    /// Not known to git
    Untracked,
    /// Removed from the working tree or index
    Deleted,
    /// Matched by an ignore rule
    Ignored,
    /// State could not be determined
    Unknown,
}

impl WorkingState {
    fn from_status(status: Status) -> Self {
        if status.is_empty() {
            Self::Clean
        } else if status.is_ignored() {
            Self::Ignored
        } else if status.is_wt_new() {
            Self::Untracked
        } else if status.is_wt_deleted() || status.is_index_deleted() {
            Self::Deleted
        } else if status.intersects(Status::WT_MODIFIED | Status::WT_TYPECHANGE | Status::WT_RENAMED) {
            Self::Modified
        } else {
            Self::Staged
        }
    }

    /// Lowercase name, as serialized
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clean => "clean",
            Self::Modified => "modified",
            Self::Staged => "staged",
            Self::Untracked => "untracked",
            Self::Deleted => "deleted",
            Self::Ignored => "ignored",
            Self::Unknown => "unknown",
        }
    }
}

/// Handle on the repository containing a set of record files
#[derive(Debug, Clone)]
pub struct RecordRepo {
    start: PathBuf,
    root: Option<PathBuf>,
    pub(crate) refresh_remotes: bool,
}

impl RecordRepo {
    /// Discover the repository containing `path`
    ///
    /// This walks up the directory tree to find a `.git` directory. A path
    /// outside any repository yields a handle for which
    /// [`is_repository`](Self::is_repository) is false.
    pub fn discover(path: impl AsRef<Path>) -> Self {
        let start = path.as_ref().to_path_buf();
        let root = match Repository::discover(&start) {
            Ok(repo) => match repo.workdir() {
                Some(workdir) => Some(canonical(workdir)),
                None => {
                    debug!(path = %start.display(), "Repository is bare, no working tree");
                    None
                }
            },
            Err(e) => {
                debug!(path = %start.display(), error = %e, "No repository found");
                None
            }
        };
        Self {
            start,
            root,
            refresh_remotes: true,
        }
    }

    /// Discover the repository containing `path`, failing if there is none
    ///
    /// # Errors
    ///
    /// Returns `GitError::RepositoryNotFound` if no repository is found.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, GitError> {
        let repo = Self::discover(path);
        if repo.root.is_none() {
            return Err(repo.not_found());
        }
        Ok(repo)
    }

    /// Enable or disable fetching from remotes during branch comparison
    #[must_use]
    pub fn with_remote_refresh(mut self, refresh: bool) -> Self {
        self.refresh_remotes = refresh;
        self
    }

    /// The working-tree root, if a repository was found
    #[must_use]
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Whether the handle points at a usable repository
    #[must_use]
    pub fn is_repository(&self) -> bool {
        self.repository().is_ok()
    }

    pub(crate) fn repository(&self) -> Result<Repository, GitError> {
        let root = self.root.as_ref().ok_or_else(|| self.not_found())?;
        Repository::open(root).map_err(|_| self.not_found())
    }

    fn not_found(&self) -> GitError {
        GitError::RepositoryNotFound {
            path: self.start.display().to_string(),
        }
    }

    /// Resolve `path` relative to the repository root
    ///
    /// Relative inputs are taken relative to the root. The file itself does
    /// not need to exist.
    ///
    /// # Errors
    ///
    /// Returns `GitError::PathOutsideRepository` if the path is not inside
    /// the working tree.
    pub fn relative_path(&self, path: impl AsRef<Path>) -> Result<PathBuf, GitError> {
        let path = path.as_ref();
        let root = self.root.as_ref().ok_or_else(|| self.not_found())?;
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            root.join(path)
        };
        canonical(&absolute)
            .strip_prefix(root)
            .map(Path::to_path_buf)
            .map_err(|_| GitError::PathOutsideRepository {
                path: path.display().to_string(),
            })
    }

    /// Retrieve up to `limit` commits that touched `path`, newest first
    ///
    /// A file that was never committed, or any failure, yields an empty
    /// history.
    #[must_use]
    pub fn file_history(&self, path: impl AsRef<Path>, limit: usize) -> FileHistory {
        self.file_history_with(path, &HistoryOptions::latest(limit))
    }

    /// Retrieve a file's history with explicit options
    #[must_use]
    pub fn file_history_with(&self, path: impl AsRef<Path>, options: &HistoryOptions) -> FileHistory {
        let path = path.as_ref();
        if !self.is_repository() {
            return FileHistory::empty(path.display().to_string());
        }
        match self.try_file_history(path, options) {
            Ok(history) => history,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read file history");
                FileHistory::empty(path.display().to_string())
            }
        }
    }

    /// Retrieve a file's history, reporting backend failures
    ///
    /// # Errors
    ///
    /// Returns `GitError` if the repository cannot be opened or walked, or
    /// the path is outside it.
    pub fn try_file_history(
        &self,
        path: impl AsRef<Path>,
        options: &HistoryOptions,
    ) -> Result<FileHistory, GitError> {
        let path = path.as_ref();
        let label = path.display().to_string();
        let repo = self.repository()?;
        let relative = self.relative_path(path)?;

        if !has_commits(&repo)? {
            debug!(path = %label, "Repository has no commits yet");
            return Ok(FileHistory::empty(label));
        }

        let limit = options.limit.unwrap_or(usize::MAX);
        let commits = touching_commits(&repo, &relative, limit)?
            .into_iter()
            .map(|oid| -> Result<CommitRecord, GitError> {
                let git_commit = repo.find_commit(oid)?;
                Ok(revision_record(&repo, &git_commit, &relative, options))
            })
            .collect::<Result<Vec<_>, GitError>>()?;

        debug!(path = %label, commits = commits.len(), "Read file history");
        Ok(FileHistory::new(label, commits))
    }

    /// Content of `relative_path` at `revision`
    ///
    /// `None` means the path did not exist at that revision, or the revision
    /// could not be read.
    #[must_use]
    pub fn content_at(&self, revision: &str, relative_path: impl AsRef<Path>) -> Option<String> {
        let relative_path = relative_path.as_ref();
        if !self.is_repository() {
            return None;
        }
        match self.try_content_at(revision, relative_path) {
            Ok(content) => content,
            Err(e) => {
                warn!(
                    revision,
                    path = %relative_path.display(),
                    error = %e,
                    "Failed to read content at revision"
                );
                None
            }
        }
    }

    /// Content of `relative_path` at `revision`, reporting backend failures
    ///
    /// # Errors
    ///
    /// Returns `GitError::InvalidReference` if the revision cannot be
    /// resolved to a commit.
    pub fn try_content_at(
        &self,
        revision: &str,
        relative_path: impl AsRef<Path>,
    ) -> Result<Option<String>, GitError> {
        let repo = self.repository()?;
        let invalid = || GitError::InvalidReference {
            reference: revision.to_string(),
        };
        let commit = repo
            .revparse_single(revision)
            .map_err(|_| invalid())?
            .peel_to_commit()
            .map_err(|_| invalid())?;
        blob_text(&repo, &commit.tree()?, relative_path.as_ref())
    }

    /// Number of commits that touched `path`
    #[must_use]
    pub fn commit_count(&self, path: impl AsRef<Path>) -> usize {
        let path = path.as_ref();
        if !self.is_repository() {
            return 0;
        }
        match self.try_commit_count(path) {
            Ok(count) => count,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to count commits");
                0
            }
        }
    }

    /// Number of commits that touched `path`, reporting backend failures
    ///
    /// Only the commit graph and tree entries are read; no blob content is
    /// loaded.
    ///
    /// # Errors
    ///
    /// Returns `GitError` if the repository cannot be walked or the path is
    /// outside it.
    pub fn try_commit_count(&self, path: impl AsRef<Path>) -> Result<usize, GitError> {
        let repo = self.repository()?;
        let relative = self.relative_path(path)?;
        if !has_commits(&repo)? {
            return Ok(0);
        }
        Ok(touching_commits(&repo, &relative, usize::MAX)?.len())
    }

    /// The most recent commit that touched `path`
    #[must_use]
    pub fn latest_commit(&self, path: impl AsRef<Path>) -> Option<CommitRecord> {
        self.file_history(path, 1).last_commit
    }

    /// Name of the checked out branch
    ///
    /// On a fresh repository this is the branch HEAD points to, even though
    /// it has no commits yet. A detached HEAD yields `None`.
    #[must_use]
    pub fn current_branch(&self) -> Option<String> {
        let repo = self.repository().ok()?;
        match repo.head() {
            Ok(head) if head.is_branch() => head.shorthand().map(str::to_string),
            Ok(_) => None,
            Err(_) => repo
                .find_reference("HEAD")
                .ok()?
                .symbolic_target()
                .and_then(|target| target.strip_prefix("refs/heads/"))
                .map(str::to_string),
        }
    }

    /// Working-tree state of `path`
    #[must_use]
    pub fn file_state(&self, path: impl AsRef<Path>) -> WorkingState {
        let path = path.as_ref();
        let state = self.repository().and_then(|repo| {
            let relative = self.relative_path(path)?;
            Ok(repo.status_file(&relative)?)
        });
        match state {
            Ok(status) => WorkingState::from_status(status),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Could not determine file state");
                WorkingState::Unknown
            }
        }
    }

    /// Content of `path` in the commit HEAD points to
    ///
    /// `None` when HEAD has no commit yet or the path is absent from it.
    ///
    /// # Errors
    ///
    /// Returns `GitError` if HEAD or the blob cannot be read, or the path is
    /// outside the repository.
    pub fn head_bytes(&self, path: impl AsRef<Path>) -> Result<Option<Vec<u8>>, GitError> {
        let repo = self.repository()?;
        let relative = self.relative_path(path)?;
        if !has_commits(&repo)? {
            return Ok(None);
        }
        let tree = repo.head()?.peel_to_commit()?.tree()?;
        blob_bytes(&repo, &tree, &relative)
    }

    /// Current working-tree bytes of `path`
    ///
    /// Returns `None` when the file does not exist on disk.
    ///
    /// # Errors
    ///
    /// Returns `GitError::Io` if the file exists but cannot be read.
    pub fn working_bytes(&self, path: impl AsRef<Path>) -> Result<Option<Vec<u8>>, GitError> {
        let path = path.as_ref();
        let absolute = match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        };
        match std::fs::read(&absolute) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Current working-tree content of `path`, as text
    ///
    /// Returns `None` when the file does not exist on disk.
    ///
    /// # Errors
    ///
    /// Returns `GitError::Io` if the file exists but cannot be read.
    pub fn working_content(&self, path: impl AsRef<Path>) -> Result<Option<String>, GitError> {
        Ok(self
            .working_bytes(path)?
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
    }
}

/// Canonicalize a path that may not exist yet
fn canonical(path: &Path) -> PathBuf {
    if let Ok(resolved) = std::fs::canonicalize(path) {
        return resolved;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => canonical(parent).join(name),
        _ => path.to_path_buf(),
    }
}

fn blob_id(tree: &Tree<'_>, path: &Path) -> Option<Oid> {
    tree.get_path(path).ok().map(|entry| entry.id())
}

fn has_commits(repo: &Repository) -> Result<bool, GitError> {
    match repo.head() {
        Ok(_) => Ok(true),
        Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Up to `limit` commits reachable from HEAD that changed `path`, newest first
///
/// Follows git's default history simplification. A commit whose entry at
/// `path` matches one of its parents is not listed, and only the first such
/// parent is followed; its other parents are pruned unless reached some other
/// way. A root commit is listed when it contains the path.
fn touching_commits(repo: &Repository, path: &Path, limit: usize) -> Result<Vec<Oid>, GitError> {
    let head = repo.head()?.peel_to_commit()?.id();
    let mut revwalk = repo.revwalk()?;
    revwalk.set_sorting(Sort::TIME | Sort::TOPOLOGICAL)?;
    revwalk.push(head)?;

    // Topological order visits every child before its parents
    let mut interesting = HashSet::from([head]);
    let mut touching = Vec::new();

    for oid_result in revwalk {
        if touching.len() >= limit {
            break;
        }
        let oid = oid_result?;
        if !interesting.remove(&oid) {
            continue;
        }

        let commit = repo.find_commit(oid)?;
        let current = blob_id(&commit.tree()?, path);
        let mut parents = Vec::with_capacity(commit.parent_count());
        for parent in commit.parents() {
            parents.push((parent.id(), blob_id(&parent.tree()?, path)));
        }

        match parents.iter().find(|(_, blob)| *blob == current) {
            Some((same, _)) => {
                interesting.insert(*same);
            }
            None => {
                interesting.extend(parents.iter().map(|(id, _)| *id));
                if !parents.is_empty() || current.is_some() {
                    touching.push(oid);
                }
            }
        }
    }
    Ok(touching)
}

fn blob_bytes(repo: &Repository, tree: &Tree<'_>, path: &Path) -> Result<Option<Vec<u8>>, GitError> {
    let entry = match tree.get_path(path) {
        Ok(entry) => entry,
        Err(e) if e.code() == ErrorCode::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let blob = entry.to_object(repo)?.peel_to_blob()?;
    Ok(Some(blob.content().to_vec()))
}

fn blob_text(repo: &Repository, tree: &Tree<'_>, path: &Path) -> Result<Option<String>, GitError> {
    Ok(blob_bytes(repo, tree, path)?.map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
}

/// Build the record for one commit, comparing against its first parent
fn revision_record(
    repo: &Repository,
    git_commit: &git2::Commit<'_>,
    path: &Path,
    options: &HistoryOptions,
) -> CommitRecord {
    let mut record = CommitRecord::from_git2(git_commit);

    let old = match git_commit.parent(0) {
        Ok(parent) => parent
            .tree()
            .map_err(GitError::from)
            .and_then(|tree| blob_text(repo, &tree, path)),
        Err(_) => Ok(None),
    };
    let new = git_commit
        .tree()
        .map_err(GitError::from)
        .and_then(|tree| blob_text(repo, &tree, path));

    let (old, new) = match (old, new) {
        (Ok(old), Ok(new)) => (old.unwrap_or_default(), new.unwrap_or_default()),
        (Err(e), _) | (_, Err(e)) => {
            warn!(
                sha = %record.hash,
                path = %path.display(),
                error = %e,
                "Failed to read revision content, stats unavailable"
            );
            record.stats = ChangeStats::unavailable();
            return record;
        }
    };

    record.stats = line_stats(&old, &new);
    if options.include_diff {
        record.diff = Some(unified_diff(&path.to_string_lossy(), &old, &new));
    }
    if options.include_structured {
        record.structured_diff = Some(StructuredDiff::compare_text(&old, &new, options.record_list));
    }
    record
}
