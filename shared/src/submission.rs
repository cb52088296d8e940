use crate::julia::{self, JuliaError};
use crate::schema::{Bench, Commit, Entry, PendingEntry};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const DEFAULT_SUITE: &str = "Benchmark";

#[derive(Error, Debug)]
pub enum SubmissionError {
    #[error("failed to read Julia benchmark output")]
    Julia(#[from] JuliaError),
    #[error("output for tool {tool} must be a list of benches")]
    Benches {
        tool: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("output for tool {0} contains no benches")]
    Empty(String),
    #[error("{field} {value:?} cannot be used as a path segment")]
    PathSegment { field: &'static str, value: String },
}

/// What a benchmark job reports for one commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    #[serde(default = "default_suite")]
    pub suite: String,
    #[serde(default = "default_tool")]
    pub tool: String,
    pub commit: Commit,
    /// Epoch milliseconds of the run, when the job knows it.
    #[serde(default)]
    pub date: Option<u64>,
    /// A `BenchmarkTools` export for `julia`, otherwise a list of benches.
    pub output: Value,
}

impl Submission {
    pub fn benches(&self) -> Result<Vec<Bench>, SubmissionError> {
        if self.tool == julia::TOOL {
            return Ok(julia::extract_value(&self.output)?);
        }

        let benches: Vec<Bench> =
            serde_json::from_value(self.output.clone()).map_err(|source| {
                SubmissionError::Benches {
                    tool: self.tool.clone(),
                    source,
                }
            })?;
        if benches.is_empty() {
            return Err(SubmissionError::Empty(self.tool.clone()));
        }
        Ok(benches)
    }

    /// Builds the staged entry, dating it `fallback_date` when the job did not.
    pub fn into_pending(self, fallback_date: u64) -> Result<PendingEntry, SubmissionError> {
        check_segment("suite", &self.suite)?;
        check_segment("commit id", &self.commit.id)?;
        let benches = self.benches()?;

        Ok(PendingEntry {
            suite: self.suite,
            entry: Entry {
                commit: self.commit,
                date: self.date.unwrap_or(fallback_date),
                tool: self.tool,
                benches,
            },
        })
    }
}

/// Suite names and commit ids end up in staging paths and object keys.
fn check_segment(field: &'static str, value: &str) -> Result<(), SubmissionError> {
    if value.is_empty() || value == "." || value.contains(['/', '\\']) || value.contains("..") {
        return Err(SubmissionError::PathSegment {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

fn default_suite() -> String {
    DEFAULT_SUITE.to_string()
}

fn default_tool() -> String {
    julia::TOOL.to_string()
}
