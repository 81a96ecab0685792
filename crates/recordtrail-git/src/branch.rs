// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Branch comparison against remotes, repository status and fast-forward pull

use std::collections::HashSet;

use chrono::{DateTime, TimeZone, Utc};
use git2::{BranchType, Oid, Repository, build::CheckoutBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::GitError;
use crate::repository::RecordRepo;

/// How a local branch compares with its remote counterpart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchInfo {
    /// Local branch name
    pub current_branch: String,
    /// Local has commits the remote lacks
    pub is_ahead: bool,
    /// Remote has commits the local branch lacks
    pub is_behind: bool,
    /// Number of local-only commits
    pub ahead_count: usize,
    /// Number of remote-only commits
    pub behind_count: usize,
    /// Author date of the branch tip
    pub last_commit_date: Option<DateTime<Utc>>,
    /// Message of the branch tip
    pub last_commit_message: Option<String>,
    /// Same as `is_ahead`
    pub has_unpushed_changes: bool,
}

/// Summary of the repository for status displays
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryStatus {
    /// A repository was found
    pub is_repository: bool,
    /// Checked out branch, if any
    pub current_branch: Option<String>,
    /// Remote comparison for the current branch
    pub branch_info: Option<BranchInfo>,
    /// The remote has commits to fast-forward to
    pub can_pull: bool,
    /// There are local commits to push
    pub can_push: bool,
}

impl RepositoryStatus {
    /// The neutral status reported outside a repository
    #[must_use]
    pub fn not_a_repository() -> Self {
        Self {
            is_repository: false,
            current_branch: None,
            branch_info: None,
            can_pull: false,
            can_push: false,
        }
    }
}

/// Result of a fast-forward update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullOutcome {
    /// Whether the branch is now level with its remote
    pub success: bool,
    /// What happened, suitable for display
    pub message: String,
}

impl PullOutcome {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

impl RecordRepo {
    /// Compare a local branch with its remote counterpart
    ///
    /// Every configured remote is refreshed first (unless disabled with
    /// [`with_remote_refresh`](Self::with_remote_refresh)); a remote that
    /// cannot be reached is skipped. Without a remote-tracking branch the
    /// counts are zero and only the local tip is reported.
    #[must_use]
    pub fn branch_info(&self, branch: &str) -> Option<BranchInfo> {
        match self.try_branch_info(branch) {
            Ok(info) => Some(info),
            Err(e) => {
                warn!(branch, error = %e, "Failed to compare branch with remote");
                None
            }
        }
    }

    /// Compare a local branch with its remote counterpart, reporting failures
    ///
    /// # Errors
    ///
    /// Returns `GitError::InvalidReference` if the branch does not exist, or
    /// `GitError` if history cannot be walked.
    pub fn try_branch_info(&self, branch: &str) -> Result<BranchInfo, GitError> {
        let repo = self.repository()?;
        let local_branch = repo
            .find_branch(branch, BranchType::Local)
            .map_err(|_| GitError::InvalidReference {
                reference: branch.to_string(),
            })?;
        let tip = local_branch.get().peel_to_commit()?;
        let local = reachable(&repo, tip.id())?;

        if self.refresh_remotes {
            refresh_remotes(&repo);
        }

        let (ahead_count, behind_count) = match tracking_tip(&repo, &local_branch, branch) {
            Some(remote_tip) => {
                let remote = reachable(&repo, remote_tip)?;
                (
                    local.difference(&remote).count(),
                    remote.difference(&local).count(),
                )
            }
            None => {
                debug!(branch, "No remote-tracking branch found");
                (0, 0)
            }
        };

        Ok(BranchInfo {
            current_branch: branch.to_string(),
            is_ahead: ahead_count > 0,
            is_behind: behind_count > 0,
            ahead_count,
            behind_count,
            last_commit_date: Utc.timestamp_opt(tip.author().when().seconds(), 0).single(),
            last_commit_message: tip.message().map(str::to_string),
            has_unpushed_changes: ahead_count > 0,
        })
    }

    /// Repository, branch and remote comparison in one value
    ///
    /// Any internal failure degrades to [`RepositoryStatus::not_a_repository`].
    #[must_use]
    pub fn status(&self) -> RepositoryStatus {
        if !self.is_repository() {
            return RepositoryStatus::not_a_repository();
        }
        match self.try_status() {
            Ok(status) => status,
            Err(e) => {
                warn!(error = %e, "Failed to read repository status");
                RepositoryStatus::not_a_repository()
            }
        }
    }

    fn try_status(&self) -> Result<RepositoryStatus, GitError> {
        let current_branch = self.current_branch();
        let branch_info = match current_branch.as_deref() {
            Some(branch) => match self.try_branch_info(branch) {
                Ok(info) => Some(info),
                // Branch with no commits yet
                Err(GitError::InvalidReference { .. }) => None,
                Err(e) => return Err(e),
            },
            None => None,
        };

        Ok(RepositoryStatus {
            is_repository: true,
            can_pull: branch_info.as_ref().is_some_and(|i| i.is_behind),
            can_push: branch_info.as_ref().is_some_and(|i| i.is_ahead),
            current_branch,
            branch_info,
        })
    }

    /// Fast-forward the current branch to its remote
    ///
    /// The fetched tip is checked out before the branch reference moves, so a
    /// checkout that would overwrite local edits leaves the branch untouched.
    #[must_use]
    pub fn pull_latest(&self) -> PullOutcome {
        if !self.is_repository() {
            return PullOutcome::failed("Not a git repository");
        }
        let Some(branch) = self.current_branch() else {
            return PullOutcome::failed("No current branch");
        };
        match self.try_pull(&branch) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(branch = %branch, error = %e, "Pull failed");
                PullOutcome::failed(format!("Pull failed: {e}"))
            }
        }
    }

    fn try_pull(&self, branch: &str) -> Result<PullOutcome, GitError> {
        let repo = self.repository()?;
        let Ok(local_branch) = repo.find_branch(branch, BranchType::Local) else {
            return Ok(PullOutcome::failed(format!("Branch '{branch}' has no commits")));
        };
        let Some(remote_name) = upstream_remote(&repo, branch) else {
            return Ok(PullOutcome::failed(format!(
                "No remote configured for branch '{branch}'"
            )));
        };

        repo.find_remote(&remote_name)?
            .fetch(&[] as &[&str], None, None)?;

        let remote_tip = match local_branch.upstream() {
            Ok(upstream) => upstream.get().target(),
            Err(_) => repo
                .find_reference(&format!("refs/remotes/{remote_name}/{branch}"))
                .ok()
                .and_then(|r| r.target()),
        };
        let Some(remote_tip) = remote_tip else {
            return Ok(PullOutcome::failed(format!(
                "Remote '{remote_name}' has no branch '{branch}'"
            )));
        };

        let fetched = repo.find_annotated_commit(remote_tip)?;
        let (analysis, _) = repo.merge_analysis(&[&fetched])?;
        if analysis.is_up_to_date() {
            return Ok(PullOutcome::ok("Already up to date"));
        }
        if !analysis.is_fast_forward() {
            return Ok(PullOutcome::failed(
                "Cannot fast-forward: local and remote histories have diverged",
            ));
        }

        let target = repo.find_object(remote_tip, None)?;
        repo.checkout_tree(&target, Some(CheckoutBuilder::new().safe()))?;
        repo.find_reference(&format!("refs/heads/{branch}"))?
            .set_target(remote_tip, &format!("recordtrail: fast-forward {branch}"))?;

        let short = remote_tip.to_string();
        info!(branch, remote = %remote_name, target = %short, "Fast-forwarded branch");
        Ok(PullOutcome::ok(format!(
            "Fast-forwarded {branch} to {}",
            &short[..7.min(short.len())]
        )))
    }
}

/// All commits reachable from `tip`
fn reachable(repo: &Repository, tip: Oid) -> Result<HashSet<Oid>, GitError> {
    let mut revwalk = repo.revwalk()?;
    revwalk.push(tip)?;
    Ok(revwalk.collect::<Result<HashSet<_>, _>>()?)
}

/// Fetch every configured remote, ignoring the ones that fail
fn refresh_remotes(repo: &Repository) {
    let Ok(names) = repo.remotes() else {
        return;
    };
    for name in names.iter().flatten() {
        let fetched = repo
            .find_remote(name)
            .and_then(|mut remote| remote.fetch(&[] as &[&str], None, None));
        match fetched {
            Ok(()) => debug!(remote = name, "Refreshed remote"),
            Err(e) => debug!(remote = name, error = %e, "Remote refresh failed, skipping"),
        }
    }
}

/// Tip of the remote branch a local branch is compared against
///
/// The configured upstream wins; otherwise the first remote carrying a
/// branch of the same name.
fn tracking_tip(repo: &Repository, local: &git2::Branch<'_>, branch: &str) -> Option<Oid> {
    if let Ok(upstream) = local.upstream() {
        if let Some(oid) = upstream.get().target() {
            return Some(oid);
        }
    }
    let names = repo.remotes().ok()?;
    names.iter().flatten().find_map(|remote| {
        repo.find_reference(&format!("refs/remotes/{remote}/{branch}"))
            .ok()?
            .target()
    })
}

/// Remote to pull `branch` from: its upstream, then `origin`, then the first remote
fn upstream_remote(repo: &Repository, branch: &str) -> Option<String> {
    if let Ok(buf) = repo.branch_upstream_remote(&format!("refs/heads/{branch}")) {
        if let Some(name) = buf.as_str() {
            return Some(name.to_string());
        }
    }
    let names = repo.remotes().ok()?;
    if names.iter().flatten().any(|n| n == "origin") {
        return Some("origin".to_string());
    }
    names.iter().flatten().next().map(str::to_string)
}
