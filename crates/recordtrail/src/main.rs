//! recordtrail: change history for git-tracked record files
//!
//! Every subcommand prints its result as JSON on stdout. Logs go to stderr.

use std::path::Path;

use anyhow::{Context, Result, bail};
use clap::Parser;
use recordtrail::config::{Command, Config};
use recordtrail::service::HistoryService;
use recordtrail_diff::StructuredDiff;
use recordtrail_git::{HistoryOptions, RecordRepo};
use serde::Serialize;
use tracing::{debug, info};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(config.log_level().into()),
        )
        .init();

    config.validate()?;
    let start = config
        .repo_path()
        .context("Cannot determine the current directory; pass --repo")?;
    let repo = RecordRepo::discover(&start).with_remote_refresh(!config.offline);
    debug!(start = %start.display(), root = ?repo.root(), "Opened repository handle");
    let service = HistoryService::new(repo);

    match config.subcommand() {
        Command::History {
            path,
            diff,
            structured,
            record_list,
        } => {
            let mut options = HistoryOptions::latest(config.limit).record_list(record_list);
            if diff {
                options = options.with_diff();
            }
            if structured {
                options = options.with_structured_diff();
            }
            print_json(&service.file_history_with(path, options).await)
        }
        Command::Timeline { primary, satellite } => {
            print_json(&service.build_timeline(primary, satellite, config.limit).await)
        }
        Command::Show { revision, path } => {
            let Some(content) = service.content_at(revision.clone(), path.clone()).await else {
                bail!("'{}' does not exist at {revision}", path.display());
            };
            print!("{content}");
            Ok(())
        }
        Command::Count { path } => print_json(&service.commit_count(path).await),
        Command::Latest { path } => print_json(&service.latest_commit(path).await),
        Command::Status => print_json(&service.status().await),
        Command::Pull => {
            let outcome = service.pull_latest().await;
            print_json(&outcome)?;
            if !outcome.success {
                bail!("{}", outcome.message);
            }
            info!(message = %outcome.message, "Pull complete");
            Ok(())
        }
        Command::Diff {
            old,
            new,
            record_list,
        } => {
            let result = StructuredDiff::compare_text(&read_file(&old)?, &read_file(&new)?, record_list);
            print_json(&result)
        }
    }
}

/// Read a file for diffing; a missing file counts as empty
fn read_file(path: &Path) -> Result<String> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
