use crate::alert::{self, Regression};
use crate::append::{append, AppendError, AppendOptions};
use crate::schema::{BenchmarkData, PendingEntry};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct PublishOptions {
    pub append: AppendOptions,
    pub alert_threshold: f64,
}

impl Default for PublishOptions {
    fn default() -> Self {
        Self {
            append: AppendOptions::default(),
            alert_threshold: alert::DEFAULT_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub suite: String,
    pub commit: String,
    pub previous_commit: String,
    pub regression: Regression,
}

#[derive(Debug, Default)]
pub struct PublishReport {
    pub appended: usize,
    pub trimmed: usize,
    pub rejected: Vec<AppendError>,
    pub alerts: Vec<Alert>,
}

/// Appends `pending` to `data` oldest first. Entries that break the suite
/// invariants are skipped and reported rather than aborting the batch.
pub fn publish(
    data: &mut BenchmarkData,
    mut pending: Vec<PendingEntry>,
    options: &PublishOptions,
) -> PublishReport {
    pending.sort_by(|a, b| {
        a.entry
            .date
            .cmp(&b.entry.date)
            .then_with(|| a.suite.cmp(&b.suite))
    });

    let mut report = PublishReport::default();

    for PendingEntry { suite, entry } in pending {
        let current = entry.clone();

        match append(data, &suite, entry, &options.append) {
            Ok(appended) => {
                info!("Appended {} to suite {}", current.commit.id, suite);
                report.appended += 1;
                report.trimmed += appended.trimmed;

                if let Some(previous) = appended.previous {
                    for regression in alert::compare(&previous, &current, options.alert_threshold)
                    {
                        warn!(
                            "Possible regression in {} at {}: {}",
                            suite, current.commit.id, regression
                        );
                        report.alerts.push(Alert {
                            suite: suite.clone(),
                            commit: current.commit.id.clone(),
                            previous_commit: previous.commit.id.clone(),
                            regression,
                        });
                    }
                }
            }
            Err(e) => {
                warn!("Skipping entry: {}", e);
                report.rejected.push(e);
            }
        }
    }

    report
}
