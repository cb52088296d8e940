use anyhow::{bail, Result};
use aws_lambda_events::cloudwatch_logs::LogsEvent;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use regex::Regex;
use shared::s3::put;
use shared::submission::Submission;
use shared::PendingEntry;
use tokio::sync::OnceCell;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Error> {
    shared::log::init();

    lambda_runtime::run(service_fn(func)).await?;
    Ok(())
}

/// Optional allow-list of suite names, from `SUITES`.
static SUITES: OnceCell<Option<Vec<String>>> = OnceCell::const_new();
async fn get_suites() -> &'static Option<Vec<String>> {
    SUITES
        .get_or_init(|| async {
            std::env::var("SUITES").ok().map(|suites| {
                suites
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
        })
        .await
}

const PATTERN: &str = r"BENCHMARK_RESULT\s+(?P<payload>\{.*\})";

static REGEX: OnceCell<Regex> = OnceCell::const_new();
async fn get_regex() -> &'static Regex {
    REGEX
        .get_or_init(|| async {
            Regex::new(PATTERN).expect("valid pattern")
        })
        .await
}

static S3: OnceCell<aws_sdk_s3::Client> = OnceCell::const_new();
async fn get_s3() -> &'static aws_sdk_s3::Client {
    S3.get_or_init(shared::s3::client).await
}

async fn func(event: LambdaEvent<LogsEvent>) -> Result<(), Error> {
    let data = event.payload.aws_logs.data;
    let bucket = std::env::var("BUCKET_NAME")?;

    let s3 = get_s3().await;
    let regex = get_regex().await;
    let suites = get_suites().await.as_deref();

    for log in data.log_events {
        let timestamp = u64::try_from(log.timestamp).unwrap_or_default();
        for pending in collect(regex, &log.message, timestamp, suites) {
            info!(
                "Log group: {} | Suite: {} | Commit: {} | Benches: {}",
                &data.log_group,
                &pending.suite,
                &pending.entry.commit.id,
                pending.entry.benches.len()
            );

            put(s3, &bucket, &pending.key(), &pending).await?;
        }
    }

    Ok(())
}

/// Every benchmark submission printed in `message`, dated `timestamp` unless the
/// job supplied its own date. Lines that cannot be staged are logged and skipped.
fn collect(
    regex: &Regex,
    message: &str,
    timestamp: u64,
    suites: Option<&[String]>,
) -> Vec<PendingEntry> {
    regex
        .captures_iter(message)
        .filter_map(|cap| match stage(&cap["payload"], timestamp, suites) {
            Ok(pending) => Some(pending),
            Err(e) => {
                warn!("Skipping benchmark result: {:#}", e);
                None
            }
        })
        .collect()
}

fn stage(payload: &str, timestamp: u64, suites: Option<&[String]>) -> Result<PendingEntry> {
    let submission: Submission = serde_json::from_str(payload)?;

    if let Some(suites) = suites {
        if !suites.iter().any(|s| *s == submission.suite) {
            bail!("Suite {} not found in SUITES", submission.suite);
        }
    }

    Ok(submission.into_pending(timestamp)?)
}
