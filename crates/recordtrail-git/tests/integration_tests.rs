// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Integration tests for recordtrail-git
//!
//! These tests build throwaway repositories and check history, content,
//! branch comparison and pull behavior against them.


use std::fs;

use recordtrail_git::{
    GitError, HistoryOptions, RecordRepo, RepositoryStatus, WorkingState,
};
use similar_asserts::assert_eq;
use test_utils::{BareRemote, T0, TestRepo, repo_with_remote};

// ============================================================================
// Outside a repository
// ============================================================================

#[test]
fn test_reads_degrade_outside_repository() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("a.yaml"), "a: 1\n").expect("write");
    let repo = RecordRepo::discover(dir.path());

    assert!(!repo.is_repository());
    let history = repo.file_history(dir.path().join("a.yaml"), 50);
    assert!(history.commits.is_empty());
    assert_eq!(history.total_commits, 0);
    assert_eq!(repo.commit_count(dir.path().join("a.yaml")), 0);
    assert!(repo.latest_commit(dir.path().join("a.yaml")).is_none());
    assert!(repo.content_at("HEAD", "a.yaml").is_none());
    assert!(repo.current_branch().is_none());
    assert_eq!(repo.status(), RepositoryStatus::not_a_repository());
}

#[test]
fn test_pull_outside_repository_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let outcome = RecordRepo::discover(dir.path()).pull_latest();
    assert!(!outcome.success);
    assert_eq!(outcome.message, "Not a git repository");
}

// ============================================================================
// File history
// ============================================================================

#[test]
fn test_untracked_file_has_empty_history() {
    let test = TestRepo::new();
    test.commit_file("people/ada.yaml", "name: Ada\n", "Add Ada", T0);
    let path = test.write("people/grace.yaml", "name: Grace\n");

    let repo = RecordRepo::discover(test.path());
    let history = repo.file_history(&path, 50);

    assert_eq!(history.path, path.display().to_string());
    assert!(history.commits.is_empty());
    assert_eq!(history.total_commits, 0);
    assert!(history.first_commit.is_none());
    assert!(history.last_commit.is_none());
}

#[test]
fn test_history_of_file_in_fresh_repository_is_empty() {
    let test = TestRepo::new();
    let path = test.write("people/ada.yaml", "name: Ada\n");
    let repo = RecordRepo::discover(test.path());

    assert!(repo.is_repository());
    assert!(repo.file_history(&path, 50).is_empty());
    assert_eq!(repo.commit_count(&path), 0);
}

#[test]
fn test_history_is_newest_first_and_filtered_by_path() {
    let test = TestRepo::new();
    let first = test.commit_file("people/ada.yaml", "name: Ada\n", "Add Ada", T0);
    test.commit_file("people/grace.yaml", "name: Grace\n", "Add Grace", T0 + 10);
    let second = test.commit_file(
        "people/ada.yaml",
        "name: Ada\nborn: 1815\n",
        "Add birth year",
        T0 + 20,
    );

    let repo = RecordRepo::discover(test.path());
    let history = repo.file_history(test.file("people/ada.yaml"), 50);

    assert_eq!(history.total_commits, 2);
    let hashes: Vec<String> = history.commits.iter().map(|c| c.hash.clone()).collect();
    assert_eq!(hashes, vec![second.to_string(), first.to_string()]);
    assert_eq!(history.last_commit.as_ref(), history.commits.first());
    assert_eq!(history.first_commit.as_ref(), history.commits.last());

    let newest = &history.commits[0];
    assert_eq!(newest.hash, second.to_string());
    assert_eq!(newest.short_hash, newest.hash[..7].to_string());
    assert_eq!(newest.author, "Test Author");
    assert_eq!(newest.author_email, "test@example.com");
    assert_eq!(newest.message, "Add birth year");
    assert_eq!(newest.timestamp.timestamp(), T0 + 20);
    assert_eq!(newest.stats.insertions, 1);
    assert_eq!(newest.stats.deletions, 0);
    assert!(newest.diff.is_none());
}

#[test]
fn test_history_respects_limit() {
    let test = TestRepo::new();
    for i in 0..5 {
        test.commit_file("log.yaml", &format!("n: {i}\n"), &format!("Edit {i}"), T0 + i);
    }

    let repo = RecordRepo::discover(test.path());
    let history = repo.file_history(test.file("log.yaml"), 3);
    assert_eq!(history.total_commits, 3);
    assert_eq!(history.commits[0].message, "Edit 4");
    assert_eq!(history.commits[2].message, "Edit 2");
    assert_eq!(repo.commit_count(test.file("log.yaml")), 5);
}

#[test]
fn test_relative_paths_resolve_against_root() {
    let test = TestRepo::new();
    test.commit_file("people/ada.yaml", "name: Ada\n", "Add Ada", T0);

    let repo = RecordRepo::discover(test.path());
    assert_eq!(repo.file_history("people/ada.yaml", 50).total_commits, 1);
}

#[test]
fn test_first_commit_renders_as_insertions() {
    let test = TestRepo::new();
    test.commit_file("people/ada.yaml", "name: Ada\nborn: 1815\n", "Add Ada", T0);

    let repo = RecordRepo::discover(test.path());
    let options = HistoryOptions::latest(10).with_diff().with_structured_diff();
    let history = repo.file_history_with(test.file("people/ada.yaml"), &options);

    let commit = &history.commits[0];
    assert_eq!(commit.stats.insertions, 2);
    assert_eq!(commit.stats.deletions, 0);
    assert_eq!(commit.stats.files_touched, 1);

    let diff = commit.diff.as_deref().expect("diff requested");
    assert!(diff.starts_with("--- a/people/ada.yaml\n+++ b/people/ada.yaml\n@@ -0,0 +1,2 @@\n"));
    assert!(diff.contains("+name: Ada\n"));

    let structured = commit.structured_diff.as_ref().expect("structured diff requested");
    assert_eq!(structured.summary, "2 added");
}

#[test]
fn test_structured_diff_against_parent_revision() {
    let test = TestRepo::new();
    test.commit_file("people/ada.yaml", "name: Ada\nplace: Marylebone\n", "Add Ada", T0);
    test.commit_file("people/ada.yaml", "name: Ada\nplace: London\n", "Fix place", T0 + 1);

    let repo = RecordRepo::discover(test.path());
    let options = HistoryOptions::latest(1).with_structured_diff();
    let history = repo.file_history_with(test.file("people/ada.yaml"), &options);

    let structured = history.commits[0]
        .structured_diff
        .as_ref()
        .expect("structured diff requested");
    assert_eq!(structured.summary, "1 modified");
    assert_eq!(structured.changes[0].path, "place");
}

#[test]
fn test_record_list_history_diffs_by_identity() {
    let test = TestRepo::new();
    let v1 = "- uuid: l1\n  note: first\n- uuid: l2\n  note: second\n";
    let v2 = "- uuid: l1\n  note: first\n- uuid: l2\n  note: second\n- uuid: l3\n  note: third\n";
    test.commit_file("links/ada.yaml", v1, "Add links", T0);
    test.commit_file("links/ada.yaml", v2, "Add third link", T0 + 1);

    let repo = RecordRepo::discover(test.path());
    let options = HistoryOptions::latest(1).with_structured_diff().record_list(true);
    let history = repo.file_history_with(test.file("links/ada.yaml"), &options);

    let structured = history.commits[0].structured_diff.as_ref().expect("structured");
    assert_eq!(structured.summary, "1 added");
    assert_eq!(structured.changes[0].path, "uuid=l3");
}

#[test]
fn test_deletion_commit_is_part_of_history() {
    let test = TestRepo::new();
    test.commit_file("people/ada.yaml", "name: Ada\nborn: 1815\n", "Add Ada", T0);
    test.commit_file("keep.yaml", "k: v\n", "Keep something", T0 + 1);
    test.remove_file("people/ada.yaml", "Remove Ada", T0 + 2);

    let repo = RecordRepo::discover(test.path());
    let history = repo.file_history(test.file("people/ada.yaml"), 50);

    assert_eq!(history.total_commits, 2);
    assert_eq!(history.commits[0].message, "Remove Ada");
    assert_eq!(history.commits[0].stats.deletions, 2);
    assert_eq!(history.commits[0].stats.insertions, 0);
}

#[test]
fn test_path_outside_repository_is_empty_history() {
    let test = TestRepo::new();
    test.commit_file("a.yaml", "a: 1\n", "Add a", T0);
    let elsewhere = tempfile::tempdir().expect("tempdir");

    let repo = RecordRepo::discover(test.path());
    let outside = elsewhere.path().join("a.yaml");
    assert!(repo.file_history(&outside, 50).is_empty());
    assert!(matches!(
        repo.try_file_history(&outside, &HistoryOptions::default()),
        Err(GitError::PathOutsideRepository { .. })
    ));
}

#[test]
fn test_latest_commit_matches_history_head() {
    let test = TestRepo::new();
    test.commit_file("a.yaml", "a: 1\n", "One", T0);
    test.commit_file("a.yaml", "a: 2\n", "Two", T0 + 1);

    let repo = RecordRepo::discover(test.path());
    let latest = repo.latest_commit(test.file("a.yaml")).expect("latest");
    let history = repo.file_history(test.file("a.yaml"), 50);
    assert_eq!(Some(&latest), history.commits.first());
    assert_eq!(latest.message, "Two");
}

// ============================================================================
// Merges
// ============================================================================

#[test]
fn test_merge_discarding_side_edit_hides_side_branch() {
    let test = TestRepo::new();
    let base = test.commit_file("a.yaml", "a: 1\n", "base", T0);
    test.commit_file("other.yaml", "b: 1\n", "unrelated", T0 + 10);
    let side = test.commit_on(base, "a.yaml", "a: 2\n", "side edit", T0 + 20);
    test.merge_ours(side, "merge keeping ours", T0 + 30);

    let repo = RecordRepo::discover(test.path());
    let history = repo.file_history("a.yaml", 50);
    let messages: Vec<&str> = history.commits.iter().map(|c| c.message.as_str()).collect();

    assert_eq!(messages, vec!["base"]);
    assert_eq!(repo.commit_count("a.yaml"), 1);
    assert_eq!(
        repo.latest_commit("a.yaml").map(|c| c.hash),
        Some(base.to_string())
    );
}

#[test]
fn test_merge_taking_side_edit_keeps_side_commit() {
    let test = TestRepo::new();
    let base = test.commit_file("a.yaml", "a: 1\n", "base", T0);
    let side = test.commit_on(base, "a.yaml", "a: 2\n", "side edit", T0 + 20);
    test.merge_theirs(side, "merge taking theirs", T0 + 30);

    let repo = RecordRepo::discover(test.path());
    let history = repo.file_history("a.yaml", 50);
    let messages: Vec<&str> = history.commits.iter().map(|c| c.message.as_str()).collect();

    assert_eq!(messages, vec!["side edit", "base"]);
    assert_eq!(repo.commit_count("a.yaml"), 2);
    assert_eq!(repo.content_at("HEAD", "a.yaml").as_deref(), Some("a: 2\n"));
}

#[test]
fn test_merge_combining_both_sides_is_listed() {
    let test = TestRepo::new();
    let base = test.commit_file("a.yaml", "a: 1\n", "base", T0);
    test.commit_file("a.yaml", "a: 1\nb: 1\n", "ours", T0 + 10);
    let side = test.commit_on(base, "a.yaml", "a: 2\n", "side edit", T0 + 20);

    test.write("a.yaml", "a: 2\nb: 1\n");
    let mut index = test.git().index().expect("index");
    index.add_path(std::path::Path::new("a.yaml")).expect("stage");
    index.write().expect("write index");
    let tree = index.write_tree().expect("tree");
    let merge = test.merge_with_tree(tree, side, "resolve", T0 + 30);

    let repo = RecordRepo::discover(test.path());
    let hashes: Vec<String> = repo
        .file_history("a.yaml", 50)
        .commits
        .into_iter()
        .map(|c| c.hash)
        .collect();

    assert_eq!(hashes.len(), 4);
    assert_eq!(hashes[0], merge.to_string());
    assert_eq!(repo.commit_count("a.yaml"), 4);
}

#[test]
fn test_count_agrees_with_unbounded_history() {
    let test = TestRepo::new();
    let base = test.commit_file("a.yaml", "a: 1\n", "base", T0);
    let side = test.commit_on(base, "a.yaml", "a: 2\n", "side edit", T0 + 10);
    test.merge_ours(side, "merge keeping ours", T0 + 20);
    test.commit_file("a.yaml", "a: 3\n", "later", T0 + 30);

    let repo = RecordRepo::discover(test.path());
    let history = repo.file_history_with("a.yaml", &HistoryOptions::default());
    assert_eq!(repo.commit_count("a.yaml"), history.total_commits);
    assert_eq!(repo.try_commit_count("a.yaml").expect("count"), 2);
}

// ============================================================================
// Content at revision
// ============================================================================

#[test]
fn test_content_at_revision() {
    let test = TestRepo::new();
    let first = test.commit_file("a.yaml", "a: 1\n", "One", T0);
    test.commit_file("a.yaml", "a: 2\n", "Two", T0 + 1);

    let repo = RecordRepo::discover(test.path());
    assert_eq!(repo.content_at(&first.to_string(), "a.yaml").as_deref(), Some("a: 1\n"));
    assert_eq!(repo.content_at("HEAD", "a.yaml").as_deref(), Some("a: 2\n"));
}

#[test]
fn test_content_at_before_file_existed_is_none() {
    let test = TestRepo::new();
    let first = test.commit_file("a.yaml", "a: 1\n", "One", T0);
    test.commit_file("b.yaml", "b: 1\n", "Two", T0 + 1);

    let repo = RecordRepo::discover(test.path());
    assert!(repo.content_at(&first.to_string(), "b.yaml").is_none());
    assert!(matches!(repo.try_content_at(&first.to_string(), "b.yaml"), Ok(None)));
}

#[test]
fn test_content_at_invalid_revision() {
    let test = TestRepo::new();
    test.commit_file("a.yaml", "a: 1\n", "One", T0);

    let repo = RecordRepo::discover(test.path());
    assert!(repo.content_at("no-such-revision", "a.yaml").is_none());
    assert!(matches!(
        repo.try_content_at("no-such-revision", "a.yaml"),
        Err(GitError::InvalidReference { .. })
    ));
}

// ============================================================================
// Working tree
// ============================================================================

#[test]
fn test_file_state_tracks_working_tree() {
    let test = TestRepo::new();
    test.commit_file("a.yaml", "a: 1\n", "One", T0);
    test.write("new.yaml", "n: 1\n");

    let repo = RecordRepo::discover(test.path());
    assert_eq!(repo.file_state(test.file("a.yaml")), WorkingState::Clean);
    assert_eq!(repo.file_state(test.file("new.yaml")), WorkingState::Untracked);

    test.write("a.yaml", "a: 22\n");
    assert_eq!(repo.file_state(test.file("a.yaml")), WorkingState::Modified);
}

#[test]
fn test_working_content() {
    let test = TestRepo::new();
    test.write("a.yaml", "a: 1\n");

    let repo = RecordRepo::discover(test.path());
    assert_eq!(
        repo.working_content(test.file("a.yaml")).expect("read").as_deref(),
        Some("a: 1\n")
    );
    assert_eq!(repo.working_content("a.yaml").expect("read").as_deref(), Some("a: 1\n"));
    assert!(repo.working_content("missing.yaml").expect("read").is_none());
}

#[test]
fn test_head_and_working_bytes_are_raw() {
    let test = TestRepo::new();
    let repo = RecordRepo::discover(test.path());
    assert!(repo.head_bytes("a.bin").expect("unborn").is_none());

    fs::write(test.file("a.bin"), [0xff, 0x00, 0xfe]).expect("write");
    let mut index = test.git().index().expect("index");
    index.add_path(std::path::Path::new("a.bin")).expect("stage");
    index.write().expect("write index");
    test.commit_index("binary", T0);
    fs::write(test.file("a.bin"), [0xfe, 0x00, 0xff]).expect("write");

    assert_eq!(repo.head_bytes("a.bin").expect("head"), Some(vec![0xff, 0x00, 0xfe]));
    assert_eq!(repo.working_bytes("a.bin").expect("working"), Some(vec![0xfe, 0x00, 0xff]));
    assert!(repo.head_bytes("missing.bin").expect("absent").is_none());
    assert!(repo.working_bytes("missing.bin").expect("absent").is_none());
}

// ============================================================================
// Branches
// ============================================================================

#[test]
fn test_current_branch() {
    let test = TestRepo::new();
    let repo = RecordRepo::discover(test.path());
    // Unborn branch still has a name
    assert_eq!(repo.current_branch().as_deref(), Some("main"));

    test.commit_file("a.yaml", "a: 1\n", "One", T0);
    assert_eq!(repo.current_branch().as_deref(), Some("main"));

    test.git().set_head_detached(test.head()).expect("detach");
    assert!(repo.current_branch().is_none());
}

#[test]
fn test_branch_info_without_remote() {
    let test = TestRepo::new();
    test.commit_file("a.yaml", "a: 1\n", "First record\n", T0);

    let repo = RecordRepo::discover(test.path());
    let info = repo.branch_info("main").expect("branch info");

    assert_eq!(info.current_branch, "main");
    assert!(!info.is_ahead);
    assert!(!info.is_behind);
    assert_eq!(info.ahead_count, 0);
    assert_eq!(info.behind_count, 0);
    assert!(!info.has_unpushed_changes);
    assert_eq!(info.last_commit_message.as_deref(), Some("First record\n"));
    assert_eq!(info.last_commit_date.map(|d| d.timestamp()), Some(T0));
}

#[test]
fn test_branch_info_with_unreachable_remote() {
    let test = TestRepo::new();
    test.commit_file("a.yaml", "a: 1\n", "First record", T0);
    let gone = tempfile::tempdir().expect("tempdir");
    let url = gone.path().join("does-not-exist").display().to_string();
    test.add_remote("origin", &url);

    let repo = RecordRepo::discover(test.path());
    let info = repo.branch_info("main").expect("branch info");

    assert!(!info.is_ahead);
    assert!(!info.is_behind);
    assert!(!info.has_unpushed_changes);
    assert_eq!(info.last_commit_message.as_deref(), Some("First record"));
    assert!(info.last_commit_date.is_some());
}

#[test]
fn test_branch_info_unknown_branch() {
    let test = TestRepo::new();
    test.commit_file("a.yaml", "a: 1\n", "One", T0);

    let repo = RecordRepo::discover(test.path());
    assert!(repo.branch_info("no-such-branch").is_none());
    assert!(matches!(
        repo.try_branch_info("no-such-branch"),
        Err(GitError::InvalidReference { .. })
    ));
}

#[test]
fn test_branch_info_ahead_of_remote() {
    let (test, _remote) = repo_with_remote();
    test.commit_file("people/ada.yaml", "name: Ada\nborn: 1815\n", "Local edit", T0 + 1);
    test.commit_file("people/ada.yaml", "name: Ada\nborn: 1816\n", "Local fix", T0 + 2);

    let repo = RecordRepo::discover(test.path());
    let info = repo.branch_info("main").expect("branch info");
    assert!(info.is_ahead);
    assert!(!info.is_behind);
    assert_eq!(info.ahead_count, 2);
    assert_eq!(info.behind_count, 0);
    assert!(info.has_unpushed_changes);

    let status = repo.status();
    assert!(status.is_repository);
    assert_eq!(status.current_branch.as_deref(), Some("main"));
    assert!(status.can_push);
    assert!(!status.can_pull);
}

#[test]
fn test_branch_info_behind_remote() {
    let (test, remote) = repo_with_remote();
    let other = TestRepo::clone_from(&remote.url());
    other.commit_file("people/grace.yaml", "name: Grace\n", "Add Grace", T0 + 5);
    other.push("origin");

    let repo = RecordRepo::discover(test.path());
    let info = repo.branch_info("main").expect("branch info");
    assert!(info.is_behind);
    assert_eq!(info.behind_count, 1);
    assert_eq!(info.ahead_count, 0);

    let status = repo.status();
    assert!(status.can_pull);
    assert!(!status.can_push);
}

#[test]
fn test_offline_handle_does_not_fetch() {
    let (test, remote) = repo_with_remote();
    let other = TestRepo::clone_from(&remote.url());
    other.commit_file("people/grace.yaml", "name: Grace\n", "Add Grace", T0 + 5);
    other.push("origin");

    let repo = RecordRepo::discover(test.path()).with_remote_refresh(false);
    let info = repo.branch_info("main").expect("branch info");
    assert_eq!(info.behind_count, 0);
}

#[test]
fn test_status_of_fresh_repository() {
    let test = TestRepo::new();
    let status = RecordRepo::discover(test.path()).status();
    assert!(status.is_repository);
    assert_eq!(status.current_branch.as_deref(), Some("main"));
    assert!(status.branch_info.is_none());
}

// ============================================================================
// Pull
// ============================================================================

#[test]
fn test_pull_fast_forwards() {
    let (test, remote) = repo_with_remote();
    let other = TestRepo::clone_from(&remote.url());
    let upstream = other.commit_file("people/ada.yaml", "name: Ada Lovelace\n", "Full name", T0 + 5);
    other.push("origin");

    let repo = RecordRepo::discover(test.path());
    let outcome = repo.pull_latest();

    assert!(outcome.success, "pull failed: {}", outcome.message);
    assert!(outcome.message.starts_with("Fast-forwarded main"));
    assert_eq!(test.head(), upstream);
    assert_eq!(
        fs::read_to_string(test.file("people/ada.yaml")).expect("read"),
        "name: Ada Lovelace\n".to_string()
    );

    let again = repo.pull_latest();
    assert!(again.success);
    assert_eq!(again.message, "Already up to date");
}

#[test]
fn test_pull_refuses_diverged_history() {
    let (test, remote) = repo_with_remote();
    let other = TestRepo::clone_from(&remote.url());
    other.commit_file("people/grace.yaml", "name: Grace\n", "Remote edit", T0 + 5);
    other.push("origin");
    let local = test.commit_file("people/ada.yaml", "name: Ada\nborn: 1815\n", "Local edit", T0 + 6);

    let outcome = RecordRepo::discover(test.path()).pull_latest();
    assert!(!outcome.success);
    assert!(outcome.message.contains("diverged"));
    assert_eq!(test.head(), local);
}

#[test]
fn test_pull_without_remote_fails() {
    let test = TestRepo::new();
    test.commit_file("a.yaml", "a: 1\n", "One", T0);

    let outcome = RecordRepo::discover(test.path()).pull_latest();
    assert!(!outcome.success);
    assert!(outcome.message.contains("No remote"));
}

#[test]
fn test_pull_with_unreachable_remote_fails() {
    let test = TestRepo::new();
    let head = test.commit_file("a.yaml", "a: 1\n", "One", T0);
    let gone = tempfile::tempdir().expect("tempdir");
    test.add_remote("origin", &gone.path().join("missing").display().to_string());

    let outcome = RecordRepo::discover(test.path()).pull_latest();
    assert!(!outcome.success);
    assert!(outcome.message.starts_with("Pull failed"));
    assert_eq!(test.head(), head);
}

#[test]
fn test_pull_on_detached_head_fails() {
    let test = TestRepo::new();
    test.commit_file("a.yaml", "a: 1\n", "One", T0);
    test.git().set_head_detached(test.head()).expect("detach");

    let outcome = RecordRepo::discover(test.path()).pull_latest();
    assert!(!outcome.success);
    assert_eq!(outcome.message, "No current branch");
}

#[test]
fn test_bare_remote_is_not_a_working_repository() {
    let remote = BareRemote::new();
    assert!(!RecordRepo::discover(remote.url()).is_repository());
}
