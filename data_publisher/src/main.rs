use anyhow::{Context, Result};
use futures::future::try_join_all;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use shared::append::AppendOptions;
use shared::publish::{publish, PublishOptions};
use shared::s3::{delete_many, get_data_js, get_from_json, list, put_data_js};
use shared::schema::PENDING_PREFIX;
use shared::{BenchmarkData, PendingEntry};
use std::num::NonZeroUsize;
use tracing::info;

const DEFAULT_DATA_KEY: &str = "dev/bench/data.js";

#[derive(Debug)]
struct Settings {
    bucket_name: String,
    bucket_name_public: String,
    data_key: String,
    repo_url: String,
    max_items: Option<usize>,
    alert_threshold: f64,
}

impl Settings {
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| lookup(key).with_context(|| format!("{key} not set"));

        let max_items = lookup("MAX_ITEMS")
            .map(|value| value.parse::<NonZeroUsize>().map(NonZeroUsize::get))
            .transpose()
            .context("MAX_ITEMS must be a positive integer")?;
        let alert_threshold = lookup("ALERT_THRESHOLD")
            .map(|value| value.parse::<f64>())
            .transpose()
            .context("ALERT_THRESHOLD must be a number")?
            .unwrap_or(shared::alert::DEFAULT_THRESHOLD);

        Ok(Self {
            bucket_name: required("BUCKET_NAME")?,
            bucket_name_public: required("BUCKET_NAME_PUBLIC")?,
            data_key: lookup("DATA_KEY").unwrap_or_else(|| DEFAULT_DATA_KEY.to_string()),
            repo_url: required("REPO_URL")?,
            max_items,
            alert_threshold,
        })
    }

    fn publish_options(&self) -> PublishOptions {
        PublishOptions {
            append: AppendOptions {
                max_items: self.max_items,
                repo_url: Some(self.repo_url.clone()),
            },
            alert_threshold: self.alert_threshold,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    shared::log::init();

    lambda_runtime::run(service_fn(func)).await?;
    Ok(())
}

async fn func(_event: LambdaEvent<Value>) -> Result<()> {
    let settings = Settings::from_env()?;
    let s3 = shared::s3::client().await;

    let objects = list(&s3, &settings.bucket_name, PENDING_PREFIX).await?;
    let keys: Vec<String> = objects
        .iter()
        .filter_map(|object| object.key())
        .filter(|key| key.ends_with(".json"))
        .map(str::to_string)
        .collect();
    info!("Pending entries found: {}", keys.len());

    if keys.is_empty() {
        return Ok(());
    }

    let pending = fetch_pending(&s3, &settings.bucket_name, &keys).await?;
    info!("Pending entries fetched: {}", pending.len());

    let mut data = get_data_js(&s3, &settings.bucket_name_public, &settings.data_key)
        .await?
        .unwrap_or_else(|| BenchmarkData::new(&settings.repo_url));

    let report = publish(&mut data, pending, &settings.publish_options());
    info!(
        "Appended: {} | Rejected: {} | Trimmed: {} | Alerts: {}",
        report.appended,
        report.rejected.len(),
        report.trimmed,
        report.alerts.len()
    );

    if report.appended > 0 {
        put_data_js(
            &s3,
            &settings.bucket_name_public,
            &settings.data_key,
            &data,
        )
        .await?;
        info!("Data uploaded: {}", settings.data_key);
    }

    delete_many(&s3, &settings.bucket_name, &keys).await?;
    info!("Pending entries deleted: {}", keys.len());

    Ok(())
}

async fn fetch_pending(
    s3: &aws_sdk_s3::Client,
    bucket_name: &str,
    keys: &[String],
) -> Result<Vec<PendingEntry>> {
    try_join_all(
        keys.iter()
            .map(|key| get_from_json::<PendingEntry>(s3, bucket_name, key)),
    )
    .await
}
