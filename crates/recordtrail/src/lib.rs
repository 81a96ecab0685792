//! recordtrail library
//!
//! Change history for records kept as files in a git working tree: per-file
//! history, merged record timelines that include uncommitted edits, and an
//! async service wrapping both for use from a transport layer.

pub mod config;
pub mod locator;
pub mod service;
pub mod timeline;

pub use locator::{LocatorError, RecordLocator, RecordPaths, StaticLocator};
pub use service::{HistoryService, ServiceError};
pub use timeline::{RecordSource, RecordTimeline, TimelineAggregator, TimelineEntry};
