use crate::schema::{BenchmarkData, Entry};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, PartialEq)]
pub enum AppendError {
    #[error("entry for commit {0} has no benches")]
    NoBenches(String),
    #[error("suite {suite} already has an entry for commit {commit}")]
    DuplicateCommit { suite: String, commit: String },
    #[error("entry dated {date} is older than the last entry of suite {suite} ({last})")]
    OutOfOrder { suite: String, date: u64, last: u64 },
}

#[derive(Debug, Clone, Default)]
pub struct AppendOptions {
    /// Oldest entries beyond this count are dropped from the suite. Zero means no limit.
    ///
    /// Setting it gives up the append-only history: trimmed entries are deleted
    /// from the file for good. Leave it `None` to keep every entry.
    pub max_items: Option<usize>,
    /// Replaces `repoUrl` when set.
    pub repo_url: Option<String>,
}

#[derive(Debug)]
pub struct Appended {
    /// Last entry of the suite before this one, for comparison.
    pub previous: Option<Entry>,
    pub trimmed: usize,
}

pub fn append(
    data: &mut BenchmarkData,
    suite: &str,
    entry: Entry,
    options: &AppendOptions,
) -> Result<Appended, AppendError> {
    if entry.benches.is_empty() {
        return Err(AppendError::NoBenches(entry.commit.id));
    }

    let entries = data.entries.entry(suite.to_string()).or_default();

    if entries.iter().any(|e| e.commit.id == entry.commit.id) {
        return Err(AppendError::DuplicateCommit {
            suite: suite.to_string(),
            commit: entry.commit.id,
        });
    }

    if let Some(last) = entries.last().filter(|last| last.date > entry.date) {
        return Err(AppendError::OutOfOrder {
            suite: suite.to_string(),
            date: entry.date,
            last: last.date,
        });
    }

    let previous = entries.last().cloned();
    entries.push(entry);

    let mut trimmed = 0;
    if let Some(max_items) = options.max_items.filter(|max| *max > 0) {
        if entries.len() > max_items {
            trimmed = entries.len() - max_items;
            entries.drain(..trimmed);
            debug!("Trimmed {} old entries from suite {}", trimmed, suite);
        }
    }

    if let Some(repo_url) = &options.repo_url {
        data.repo_url = repo_url.clone();
    }
    data.last_update = data
        .latest_date()
        .map_or(data.last_update, |latest| latest.max(data.last_update));

    Ok(Appended { previous, trimmed })
}
