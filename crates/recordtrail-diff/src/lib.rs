// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! recordtrail-diff: change detection between record snapshots
//!
//! Two independent comparisons are provided:
//!
//! - [`lines`]: cheap positional line counts and a single-hunk unified diff
//!   rendering, used for commit stats.
//! - [`structured`]: a path-addressed comparison of two parsed YAML documents,
//!   with identity-based matching for lists of identified records.

#![warn(missing_docs)]

//! # Example
//!
//! ```
//! use recordtrail_diff::{StructuredDiff, line_stats};
//!
//! let result = StructuredDiff::compare_text("name: a\n", "name: b\n", false);
//! assert!(result.has_changes);
//! assert_eq!(result.summary, "1 modified");
//!
//! let stats = line_stats("a\nb\nc", "a\nx\nc");
//! assert_eq!((stats.insertions, stats.deletions), (1, 1));
//! ```

pub mod lines;
pub mod structured;

pub use lines::{ChangeStats, line_stats, unified_diff};
pub use structured::{ChangeRecord, ChangeType, StructuredDiff, StructuredDiffResult};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::lines::{ChangeStats, line_stats, unified_diff};
    pub use crate::structured::{ChangeRecord, ChangeType, StructuredDiff, StructuredDiffResult};
}
