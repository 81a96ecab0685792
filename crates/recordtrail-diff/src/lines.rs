// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Line-based revision diffing
//!
//! Counts are a positional O(n) approximation: line `i` of the old text is
//! compared with line `i` of the new text. They are advisory magnitudes for
//! display and never used to apply patches.

use serde::{Deserialize, Serialize};

/// Insertion/deletion counts for a single revision of a file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeStats {
    /// Lines added
    pub insertions: usize,
    /// Lines removed
    pub deletions: usize,
    /// Files touched by the change
    pub files_touched: usize,
}

impl ChangeStats {
    /// Stats reported when one side of the comparison could not be read
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            insertions: 0,
            deletions: 0,
            files_touched: 1,
        }
    }

    /// True when no line was added or removed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.insertions == 0 && self.deletions == 0
    }
}

/// Count changed lines between two snapshots of one file
///
/// A position present only in `new` is one insertion, present only in `old`
/// is one deletion, and present in both but different is one of each.
#[must_use]
pub fn line_stats(old: &str, new: &str) -> ChangeStats {
    let old_lines: Vec<&str> = old.lines().collect();
    let new_lines: Vec<&str> = new.lines().collect();

    let mut stats = ChangeStats {
        files_touched: 1,
        ..Default::default()
    };

    for i in 0..old_lines.len().max(new_lines.len()) {
        match (old_lines.get(i), new_lines.get(i)) {
            (None, Some(_)) => stats.insertions += 1,
            (Some(_), None) => stats.deletions += 1,
            (Some(a), Some(b)) if a != b => {
                stats.insertions += 1;
                stats.deletions += 1;
            }
            _ => {}
        }
    }

    stats
}

/// Render a unified diff of one file as a single hunk spanning the whole file
///
/// The walk is greedy: a mismatched old line is dropped when the current new
/// line reappears further down the old side, a new line is inserted when the
/// current old line reappears further down the new side, and otherwise the
/// pair is emitted as a replacement.
#[must_use]
pub fn unified_diff(path: &str, old: &str, new: &str) -> String {
    let old_lines: Vec<&str> = old.lines().collect();
    let new_lines: Vec<&str> = new.lines().collect();

    let mut out = String::new();
    out.push_str(&format!("--- a/{path}\n+++ b/{path}\n"));
    out.push_str(&format!(
        "@@ -{} +{} @@\n",
        hunk_range(old_lines.len()),
        hunk_range(new_lines.len())
    ));

    let (mut i, mut j) = (0, 0);
    while i < old_lines.len() || j < new_lines.len() {
        match (old_lines.get(i), new_lines.get(j)) {
            (Some(a), Some(b)) if a == b => {
                push_line(&mut out, ' ', a);
                i += 1;
                j += 1;
            }
            (Some(a), Some(b)) => {
                if old_lines[i + 1..].contains(b) {
                    push_line(&mut out, '-', a);
                    i += 1;
                } else if new_lines[j + 1..].contains(a) {
                    push_line(&mut out, '+', b);
                    j += 1;
                } else {
                    push_line(&mut out, '-', a);
                    push_line(&mut out, '+', b);
                    i += 1;
                    j += 1;
                }
            }
            (Some(a), None) => {
                push_line(&mut out, '-', a);
                i += 1;
            }
            (None, Some(b)) => {
                push_line(&mut out, '+', b);
                j += 1;
            }
            (None, None) => break,
        }
    }

    out
}

fn hunk_range(len: usize) -> String {
    if len == 0 {
        "0,0".to_string()
    } else {
        format!("1,{len}")
    }
}

fn push_line(out: &mut String, marker: char, line: &str) {
    out.push(marker);
    out.push_str(line);
    out.push('\n');
}
