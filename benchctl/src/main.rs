mod config;
mod pending;
mod summary;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use shared::alert::DEFAULT_THRESHOLD;
use shared::append::AppendOptions;
use shared::publish::{publish, PublishOptions, PublishReport};
use shared::submission::{Submission, DEFAULT_SUITE};
use shared::{data_js, julia, Commit, PendingEntry};
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about = "Maintains a window.BENCHMARK_DATA history file")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check a data.js file for consistency problems
    Validate { data: PathBuf },
    /// Print every entry with its measurements
    Summary {
        data: PathBuf,
        #[arg(long)]
        suite: Option<String>,
    },
    /// Append one measured commit to a data.js file
    Append {
        #[command(flatten)]
        submission: SubmissionArgs,
        #[arg(long)]
        data: PathBuf,
        #[arg(long)]
        repo_url: Option<String>,
        #[arg(long)]
        max_items: Option<NonZeroUsize>,
        #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
        alert_threshold: f64,
        /// Exit with an error when a regression is detected
        #[arg(long)]
        fail_on_alert: bool,
    },
    /// Write one measured commit into a pending directory for `publish`
    Stage {
        #[command(flatten)]
        submission: SubmissionArgs,
        #[arg(long)]
        pending: PathBuf,
    },
    /// Append every pending entry described by a publisher.yml
    Publish {
        #[arg(long, default_value = "publisher.yml")]
        config: PathBuf,
    },
}

#[derive(Args, Debug)]
struct SubmissionArgs {
    /// Commit metadata as JSON
    #[arg(long)]
    commit: PathBuf,
    /// BenchmarkTools export for `julia`, a list of benches otherwise
    #[arg(long)]
    output: PathBuf,
    #[arg(long, default_value = DEFAULT_SUITE)]
    suite: String,
    #[arg(long, default_value = julia::TOOL)]
    tool: String,
    /// Run time in epoch milliseconds, now when omitted
    #[arg(long)]
    date: Option<u64>,
}

fn main() -> Result<()> {
    shared::log::init_cli();

    let cli = Cli::parse();
    match cli.command {
        Command::Validate { data } => validate(&data),
        Command::Summary { data, suite } => {
            let data = data_js::load(&data)?;
            print!("{}", summary::render(&data, suite.as_deref()));
            Ok(())
        }
        Command::Append {
            submission,
            data,
            repo_url,
            max_items,
            alert_threshold,
            fail_on_alert,
        } => {
            let options = PublishOptions {
                append: AppendOptions {
                    max_items: max_items.map(NonZeroUsize::get),
                    repo_url,
                },
                alert_threshold,
            };
            let report = append(&submission, &data, &options)?;
            if fail_on_alert && !report.alerts.is_empty() {
                bail!("{} regression(s) detected", report.alerts.len());
            }
            Ok(())
        }
        Command::Stage {
            submission,
            pending: pending_dir,
        } => {
            let entry = submission.load()?;
            let path = pending::write_entry(&pending_dir, &entry)?;
            info!("Staged {}", path.display());
            Ok(())
        }
        Command::Publish { config } => publish_pending(&config),
    }
}

impl SubmissionArgs {
    fn load(&self) -> Result<PendingEntry> {
        let commit = fs::read_to_string(&self.commit)
            .with_context(|| format!("failed to read {}", self.commit.display()))?;
        let commit: Commit = serde_json::from_str(&commit)
            .with_context(|| format!("{} is not commit metadata", self.commit.display()))?;

        let output = fs::read_to_string(&self.output)
            .with_context(|| format!("failed to read {}", self.output.display()))?;
        let output = serde_json::from_str(&output)
            .with_context(|| format!("{} is not JSON", self.output.display()))?;

        let submission = Submission {
            suite: self.suite.clone(),
            tool: self.tool.clone(),
            commit,
            date: self.date,
            output,
        };
        let now = u64::try_from(chrono::Utc::now().timestamp_millis())?;

        Ok(submission.into_pending(now)?)
    }
}

fn validate(path: &Path) -> Result<()> {
    let data = data_js::load(path)?;
    let violations = shared::validate::validate(&data);

    if violations.is_empty() {
        info!(
            "{}: {} entries, no problems found",
            path.display(),
            data.entry_count()
        );
        return Ok(());
    }

    for violation in &violations {
        error!("{}", violation);
    }
    bail!("{} problem(s) found in {}", violations.len(), path.display())
}

fn append(submission: &SubmissionArgs, path: &Path, options: &PublishOptions) -> Result<PublishReport> {
    let pending = submission.load()?;
    let repo_url = options.append.repo_url.as_deref().unwrap_or_default();
    let mut data = data_js::load_or_default(path, repo_url)?;

    let report = publish(&mut data, vec![pending], options);
    if let Some(rejected) = report.rejected.first() {
        bail!("{}", rejected);
    }

    data_js::save(path, &data)?;
    info!("Saved {}", path.display());

    Ok(report)
}

fn publish_pending(config_path: &Path) -> Result<()> {
    let config = config::load_config(config_path)?;
    let loaded = pending::load_pending(&config.pending);
    info!("Pending entries found: {}", loaded.len());

    if loaded.is_empty() {
        return Ok(());
    }

    let (paths, entries): (Vec<PathBuf>, Vec<PendingEntry>) = loaded.into_iter().unzip();
    let mut data = data_js::load_or_default(&config.data, &config.repo_url)?;

    let report = publish(&mut data, entries, &config.publish_options());
    info!(
        "Appended: {} | Rejected: {} | Trimmed: {} | Alerts: {}",
        report.appended,
        report.rejected.len(),
        report.trimmed,
        report.alerts.len()
    );

    if report.appended > 0 {
        data_js::save(&config.data, &data)?;
        info!("Saved {}", config.data.display());
    }

    if config.keep_pending {
        warn!("Keeping {} pending entries", paths.len());
    } else {
        pending::remove_all(&paths)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn append_defaults() {
        let cli = Cli::parse_from([
            "benchctl",
            "append",
            "--data",
            "dev/bench/data.js",
            "--commit",
            "commit.json",
            "--output",
            "output.json",
        ]);

        match cli.command {
            Command::Append {
                submission,
                alert_threshold,
                fail_on_alert,
                max_items,
                ..
            } => {
                assert_eq!(submission.suite, "Benchmark");
                assert_eq!(submission.tool, "julia");
                assert_eq!(submission.date, None);
                assert_eq!(alert_threshold, 2.0);
                assert_eq!(max_items, None);
                assert!(!fail_on_alert);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    const COMMIT: &str = r#"{
        "author": {"email": "njericha@math.ubc.ca", "name": "Nicholas", "username": "njericha"},
        "committer": {"email": "njericha@math.ubc.ca", "name": "Nicholas", "username": "njericha"},
        "distinct": true,
        "id": "ec749b689c5400609231037e4259749a56423ed4",
        "message": "add missing reference to Pkg",
        "timestamp": "2025-11-18T10:54:30-08:00",
        "tree_id": "f920f226932ee58daa835846d4ca6efedebec877",
        "url": "https://github.com/MPF-Optimization-Laboratory/BlockTensorFactorization.jl/commit/ec749b689c5400609231037e4259749a56423ed4"
    }"#;

    const OUTPUT: &str = r#"[{"Julia":"1.11.7"},[["BenchmarkGroup",{"data":{"factorize":["BenchmarkGroup",{"data":{"1":["TrialEstimate",{"allocs":113709,"time":1.54974405e7,"memory":10040808,"params":["Parameters",{"gctrial":true,"time_tolerance":0.05,"evals_set":false,"samples":10000,"evals":1,"gcsample":false,"seconds":5.0,"overhead":0.0,"memory_tolerance":0.01}],"gctime":0.0}]},"tags":[]}]},"tags":[]}]]]"#;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("benchctl-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("commit.json"), COMMIT).unwrap();
        fs::write(dir.join("output.json"), OUTPUT).unwrap();
        dir
    }

    fn submission(dir: &Path, date: u64) -> SubmissionArgs {
        SubmissionArgs {
            commit: dir.join("commit.json"),
            output: dir.join("output.json"),
            suite: DEFAULT_SUITE.to_string(),
            tool: julia::TOOL.to_string(),
            date: Some(date),
        }
    }

    #[test]
    fn append_reproduces_published_sample() {
        let dir = scratch("append");
        let path = dir.join("data.js");
        let options = PublishOptions {
            append: AppendOptions {
                max_items: None,
                repo_url: Some(
                    "https://github.com/MPF-Optimization-Laboratory/BlockTensorFactorization.jl"
                        .to_string(),
                ),
            },
            alert_threshold: DEFAULT_THRESHOLD,
        };

        append(&submission(&dir, 1763492271445), &path, &options).unwrap();

        let mut expected = data_js::parse(include_str!("../../shared/tests/fixtures/data.js")).unwrap();
        expected.last_update = 1763492271445;
        assert_eq!(data_js::load(&path).unwrap(), expected);

        // The same commit cannot be recorded twice.
        assert!(append(&submission(&dir, 1763492300000), &path, &options).is_err());
        assert!(validate(&path).is_ok());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn publish_drains_pending_directory() {
        let dir = scratch("publish");
        let staged = submission(&dir, 1763492271445).load().unwrap();
        pending::write_entry(&dir.join("pending"), &staged).unwrap();
        fs::write(
            dir.join("publisher.yml"),
            "data: site/dev/bench/data.js\npending: pending\nrepo_url: https://example.com/repo\n",
        )
        .unwrap();

        publish_pending(&dir.join("publisher.yml")).unwrap();

        let data = data_js::load(&dir.join("site/dev/bench/data.js")).unwrap();
        assert_eq!(data.repo_url, "https://example.com/repo");
        assert_eq!(data.entry_count(), 1);
        assert_eq!(data.last_update, 1763492271445);
        assert!(pending::load_pending(&dir.join("pending")).is_empty());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn publish_defaults_to_local_config() {
        let cli = Cli::parse_from(["benchctl", "publish"]);

        match cli.command {
            Command::Publish { config } => assert_eq!(config, PathBuf::from("publisher.yml")),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
