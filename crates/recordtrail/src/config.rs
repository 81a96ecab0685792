//! Configuration for the recordtrail command line
//!
//! This module provides the CLI definition, including the repository
//! location, history bounds, and logging options.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use recordtrail_git::DEFAULT_HISTORY_LIMIT;

/// Recordtrail - change history for git-tracked record files
#[derive(Parser, Debug, Clone)]
#[command(name = "recordtrail")]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Subcommand to run (defaults to `status`)
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Directory from which the repository is discovered
    ///
    /// Relative record paths are resolved against the repository root.
    /// Defaults to the current working directory.
    #[arg(short, long, env = "RECORDTRAIL_REPO")]
    pub repo: Option<PathBuf>,

    /// Maximum number of commits to read per file
    #[arg(short, long, default_value_t = DEFAULT_HISTORY_LIMIT)]
    pub limit: usize,

    /// Do not fetch from remotes when comparing branches
    #[arg(long, default_value = "false")]
    pub offline: bool,

    /// Enable verbose logging (debug level)
    ///
    /// Logs are written to stderr; stdout carries only JSON output.
    #[arg(short, long, default_value = "false")]
    pub verbose: bool,

    /// Quiet mode - suppress info-level logs
    ///
    /// Only errors and warnings will be logged.
    #[arg(short, long, default_value = "false")]
    pub quiet: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Commits that touched a file, newest first
    History {
        /// Record file
        path: PathBuf,

        /// Include a unified diff for each commit
        #[arg(long)]
        diff: bool,

        /// Include a structured diff for each commit
        #[arg(long)]
        structured: bool,

        /// Diff the file as a list of identified records
        #[arg(long, requires = "structured")]
        record_list: bool,
    },

    /// Merged timeline of a record and its linked data, with uncommitted edits
    Timeline {
        /// Primary record file
        primary: PathBuf,

        /// Satellite file holding the record's linked data
        #[arg(short, long)]
        satellite: Option<PathBuf>,
    },

    /// Content of a file at a revision
    Show {
        /// Commit hash, branch, tag or other revision expression
        revision: String,

        /// File path relative to the repository root
        path: PathBuf,
    },

    /// Number of commits that touched a file
    Count {
        /// Record file
        path: PathBuf,
    },

    /// The most recent commit that touched a file
    Latest {
        /// Record file
        path: PathBuf,
    },

    /// Repository, branch and remote status
    Status,

    /// Fast-forward the current branch to its remote
    Pull,

    /// Structured diff of two files on disk
    Diff {
        /// Old version
        old: PathBuf,

        /// New version
        new: PathBuf,

        /// Compare the top-level list by record identifier
        #[arg(long)]
        record_list: bool,
    },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            command: None,
            repo: None,
            limit: DEFAULT_HISTORY_LIMIT,
            offline: false,
            verbose: false,
            quiet: false,
        }
    }
}

impl Config {
    /// Get the repository search path, using the current directory as default
    ///
    /// Returns `None` if no path is specified and the current directory
    /// cannot be determined.
    #[must_use]
    pub fn repo_path(&self) -> Option<PathBuf> {
        self.repo.clone().or_else(|| std::env::current_dir().ok())
    }

    /// The subcommand to run
    #[must_use]
    pub fn subcommand(&self) -> Command {
        self.command.clone().unwrap_or(Command::Status)
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the repository path is specified but doesn't
    /// exist or is not a directory.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ref repo) = self.repo {
            if !repo.exists() {
                return Err(ConfigError::RepoNotFound(repo.clone()));
            }
            if !repo.is_dir() {
                return Err(ConfigError::RepoNotDirectory(repo.clone()));
            }
        }
        Ok(())
    }

    /// Get the log level based on verbose/quiet flags
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        if self.verbose {
            tracing::Level::DEBUG
        } else if self.quiet {
            tracing::Level::WARN
        } else {
            tracing::Level::INFO
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Repository path not found
    #[error("Repository path not found: {0}")]
    RepoNotFound(PathBuf),

    /// Repository path is not a directory
    #[error("Repository path is not a directory: {0}")]
    RepoNotDirectory(PathBuf),
}
