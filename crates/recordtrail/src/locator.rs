// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Mapping from record identifiers to the files that hold them
//!
//! Where records live on disk is decided elsewhere; the history service only
//! asks a [`RecordLocator`] and never guesses paths itself.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Files holding one logical record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordPaths {
    /// The record's own fields
    pub primary: PathBuf,
    /// Linked data for the record, if it has any
    pub satellite: Option<PathBuf>,
}

impl RecordPaths {
    /// Paths for a record without a satellite file
    #[must_use]
    pub fn new(primary: impl Into<PathBuf>) -> Self {
        Self {
            primary: primary.into(),
            satellite: None,
        }
    }

    /// Attach a satellite file
    #[must_use]
    pub fn with_satellite(mut self, satellite: impl Into<PathBuf>) -> Self {
        self.satellite = Some(satellite.into());
        self
    }
}

/// Errors raised while resolving a record identifier
#[derive(Debug, thiserror::Error)]
pub enum LocatorError {
    /// No record has this identifier
    #[error("Record not found: {0}")]
    NotFound(String),

    /// The lookup itself failed
    #[error("Record lookup failed: {0}")]
    Lookup(String),
}

/// Resolves a record identifier to its files
#[async_trait]
pub trait RecordLocator: Send + Sync {
    /// Paths of the primary and satellite files for `record_id`
    async fn locate(&self, record_id: &str) -> Result<RecordPaths, LocatorError>;
}

/// A locator backed by a fixed in-memory table
#[derive(Debug, Clone, Default)]
pub struct StaticLocator {
    records: HashMap<String, RecordPaths>,
}

impl StaticLocator {
    /// Create an empty locator
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a record, replacing any previous entry for the identifier
    pub fn insert(&mut self, record_id: impl Into<String>, paths: RecordPaths) {
        self.records.insert(record_id.into(), paths);
    }

    /// Builder form of [`insert`](Self::insert)
    #[must_use]
    pub fn with_record(mut self, record_id: impl Into<String>, paths: RecordPaths) -> Self {
        self.insert(record_id, paths);
        self
    }

    /// Number of registered records
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no records are registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl RecordLocator for StaticLocator {
    async fn locate(&self, record_id: &str) -> Result<RecordPaths, LocatorError> {
        self.records
            .get(record_id)
            .cloned()
            .ok_or_else(|| LocatorError::NotFound(record_id.to_string()))
    }
}
