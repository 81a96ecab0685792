// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Async facade over the record history operations
//!
//! `git2` calls block, so every operation runs on tokio's blocking pool.
//! The service holds no mutable state and can be cloned freely.

use std::path::PathBuf;
use std::sync::Arc;

use recordtrail_git::{
    CommitRecord, FileHistory, HistoryOptions, PullOutcome, RecordRepo, RepositoryStatus,
};
use tracing::{debug, warn};

use crate::locator::{LocatorError, RecordLocator, StaticLocator};
use crate::timeline::{RecordTimeline, TimelineAggregator};

/// Errors returned by [`HistoryService`]
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The record identifier could not be resolved
    #[error(transparent)]
    Locator(#[from] LocatorError),

    /// The blocking task panicked or was cancelled
    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// History queries for one repository
#[derive(Clone)]
pub struct HistoryService {
    repo: Arc<RecordRepo>,
    locator: Arc<dyn RecordLocator>,
}

impl std::fmt::Debug for HistoryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryService")
            .field("repo", &self.repo)
            .finish_non_exhaustive()
    }
}

impl HistoryService {
    /// Create a service with an empty record locator
    #[must_use]
    pub fn new(repo: RecordRepo) -> Self {
        Self::with_locator(repo, Arc::new(StaticLocator::new()))
    }

    /// Create a service that resolves record identifiers through `locator`
    #[must_use]
    pub fn with_locator(repo: RecordRepo, locator: Arc<dyn RecordLocator>) -> Self {
        Self {
            repo: Arc::new(repo),
            locator,
        }
    }

    /// The repository handle
    #[must_use]
    pub fn repo(&self) -> &RecordRepo {
        &self.repo
    }

    /// Run blocking repository work off the async executor
    async fn run<T, F>(&self, f: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&RecordRepo) -> T + Send + 'static,
        T: Send + 'static,
    {
        let repo = Arc::clone(&self.repo);
        Ok(tokio::task::spawn_blocking(move || f(repo.as_ref())).await?)
    }

    /// Like [`run`](Self::run), degrading to `fallback` if the task fails
    async fn read<T, F>(&self, operation: &'static str, fallback: T, f: F) -> T
    where
        F: FnOnce(&RecordRepo) -> T + Send + 'static,
        T: Send + 'static,
    {
        match self.run(f).await {
            Ok(value) => value,
            Err(e) => {
                warn!(operation, error = %e, "History task failed");
                fallback
            }
        }
    }

    /// Whether the handle points at a usable repository
    pub async fn is_repository(&self) -> bool {
        self.read("is_repository", false, RecordRepo::is_repository)
            .await
    }

    /// Up to `limit` commits that touched `path`, newest first
    pub async fn file_history(&self, path: impl Into<PathBuf>, limit: usize) -> FileHistory {
        self.file_history_with(path, HistoryOptions::latest(limit))
            .await
    }

    /// A file's history with explicit options
    pub async fn file_history_with(
        &self,
        path: impl Into<PathBuf>,
        options: HistoryOptions,
    ) -> FileHistory {
        let path = path.into();
        let fallback = FileHistory::empty(path.display().to_string());
        self.read("file_history", fallback, move |repo| {
            repo.file_history_with(&path, &options)
        })
        .await
    }

    /// Content of `relative_path` at `revision`
    pub async fn content_at(
        &self,
        revision: impl Into<String>,
        relative_path: impl Into<PathBuf>,
    ) -> Option<String> {
        let revision = revision.into();
        let relative_path = relative_path.into();
        self.read("content_at", None, move |repo| {
            repo.content_at(&revision, &relative_path)
        })
        .await
    }

    /// Number of commits that touched `path`
    pub async fn commit_count(&self, path: impl Into<PathBuf>) -> usize {
        let path = path.into();
        self.read("commit_count", 0, move |repo| repo.commit_count(&path))
            .await
    }

    /// The most recent commit that touched `path`
    pub async fn latest_commit(&self, path: impl Into<PathBuf>) -> Option<CommitRecord> {
        let path = path.into();
        self.read("latest_commit", None, move |repo| repo.latest_commit(&path))
            .await
    }

    /// Name of the checked out branch
    pub async fn current_branch(&self) -> Option<String> {
        self.read("current_branch", None, RecordRepo::current_branch)
            .await
    }

    /// Repository, branch and remote comparison
    pub async fn status(&self) -> RepositoryStatus {
        self.read(
            "status",
            RepositoryStatus::not_a_repository(),
            RecordRepo::status,
        )
        .await
    }

    /// Fast-forward the current branch to its remote
    pub async fn pull_latest(&self) -> PullOutcome {
        match self.run(RecordRepo::pull_latest).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "Pull task failed");
                PullOutcome {
                    success: false,
                    message: format!("Pull failed: {e}"),
                }
            }
        }
    }

    /// Merged timeline for a primary file and its optional satellite
    pub async fn build_timeline(
        &self,
        primary: impl Into<PathBuf>,
        satellite: Option<PathBuf>,
        limit: usize,
    ) -> RecordTimeline {
        let primary = primary.into();
        self.read("build_timeline", RecordTimeline::default(), move |repo| {
            TimelineAggregator::new(repo)
                .with_limit(limit)
                .build(&primary, satellite.as_deref())
        })
        .await
    }

    /// Merged timeline for a record, resolving its files through the locator
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Locator` if the record cannot be resolved.
    pub async fn timeline_for_record(
        &self,
        record_id: &str,
        limit: usize,
    ) -> Result<RecordTimeline, ServiceError> {
        let paths = self.locator.locate(record_id).await?;
        debug!(
            record_id,
            primary = %paths.primary.display(),
            satellite = ?paths.satellite,
            "Resolved record files"
        );
        Ok(self
            .build_timeline(paths.primary, paths.satellite, limit)
            .await)
    }
}
