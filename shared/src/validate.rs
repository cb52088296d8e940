//! Consistency checks over a whole dataset.

use crate::extra::ExtraError;
use crate::schema::{BenchmarkData, Entry};
use chrono::DateTime;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Violation {
    #[error("lastUpdate {last_update} is older than the newest entry date {latest}")]
    LastUpdate { last_update: u64, latest: u64 },
    #[error("{suite}[{index}]: date must be positive")]
    ZeroDate { suite: String, index: usize },
    #[error("{suite}[{index}]: date {date} is older than the previous entry ({previous})")]
    DateDecreases {
        suite: String,
        index: usize,
        date: u64,
        previous: u64,
    },
    #[error("{suite}[{index}]: commit {commit} appears more than once")]
    DuplicateCommit {
        suite: String,
        index: usize,
        commit: String,
    },
    #[error("{suite}[{index}]: commit timestamp {timestamp:?} is not ISO-8601")]
    BadTimestamp {
        suite: String,
        index: usize,
        timestamp: String,
    },
    #[error("{suite}[{index}]: run date {date} precedes commit timestamp {timestamp}")]
    DateBeforeCommit {
        suite: String,
        index: usize,
        date: u64,
        timestamp: String,
    },
    #[error("{suite}[{index}]: no benches")]
    NoBenches { suite: String, index: usize },
    #[error("{suite}[{index}] {bench}: value {value} is not a non-negative number")]
    BadValue {
        suite: String,
        index: usize,
        bench: String,
        value: f64,
    },
    #[error("{suite}[{index}] {bench}: empty unit")]
    EmptyUnit {
        suite: String,
        index: usize,
        bench: String,
    },
    #[error("{suite}[{index}] {bench}: invalid extra: {error}")]
    BadExtra {
        suite: String,
        index: usize,
        bench: String,
        error: ExtraError,
    },
}

pub fn validate(data: &BenchmarkData) -> Vec<Violation> {
    let mut violations = Vec::new();

    if let Some(latest) = data.latest_date() {
        if data.last_update < latest {
            violations.push(Violation::LastUpdate {
                last_update: data.last_update,
                latest,
            });
        }
    }

    for (suite, entries) in &data.entries {
        let mut commits = HashSet::new();
        let mut previous: Option<u64> = None;

        for (index, entry) in entries.iter().enumerate() {
            if entry.date == 0 {
                violations.push(Violation::ZeroDate {
                    suite: suite.clone(),
                    index,
                });
            }
            if let Some(previous) = previous.filter(|p| *p > entry.date) {
                violations.push(Violation::DateDecreases {
                    suite: suite.clone(),
                    index,
                    date: entry.date,
                    previous,
                });
            }
            previous = Some(entry.date);

            if !commits.insert(entry.commit.id.as_str()) {
                violations.push(Violation::DuplicateCommit {
                    suite: suite.clone(),
                    index,
                    commit: entry.commit.id.clone(),
                });
            }

            check_timestamp(suite, index, entry, &mut violations);
            check_benches(suite, index, entry, &mut violations);
        }
    }

    violations
}

fn check_timestamp(suite: &str, index: usize, entry: &Entry, violations: &mut Vec<Violation>) {
    let Some(timestamp) = &entry.commit.timestamp else {
        return;
    };

    match DateTime::parse_from_rfc3339(timestamp) {
        Ok(committed) => {
            if (entry.date as i64) < committed.timestamp_millis() {
                violations.push(Violation::DateBeforeCommit {
                    suite: suite.to_string(),
                    index,
                    date: entry.date,
                    timestamp: timestamp.clone(),
                });
            }
        }
        Err(_) => violations.push(Violation::BadTimestamp {
            suite: suite.to_string(),
            index,
            timestamp: timestamp.clone(),
        }),
    }
}

fn check_benches(suite: &str, index: usize, entry: &Entry, violations: &mut Vec<Violation>) {
    if entry.benches.is_empty() {
        violations.push(Violation::NoBenches {
            suite: suite.to_string(),
            index,
        });
    }

    for bench in &entry.benches {
        if !bench.value.is_finite() || bench.value < 0.0 {
            violations.push(Violation::BadValue {
                suite: suite.to_string(),
                index,
                bench: bench.name.clone(),
                value: bench.value,
            });
        }
        if bench.unit.trim().is_empty() {
            violations.push(Violation::EmptyUnit {
                suite: suite.to_string(),
                index,
                bench: bench.name.clone(),
            });
        }
        // Only Julia extras have a known layout.
        if entry.tool == crate::julia::TOOL {
            if let Some(Err(error)) = bench.julia_extra() {
                violations.push(Violation::BadExtra {
                    suite: suite.to_string(),
                    index,
                    bench: bench.name.clone(),
                    error,
                });
            }
        }
    }
}
