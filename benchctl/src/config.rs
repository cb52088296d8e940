use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use shared::append::AppendOptions;
use shared::publish::PublishOptions;
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

/// Contents of `publisher.yml`. Relative paths are resolved against the
/// directory holding the file.
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PublisherConfig {
    pub data: PathBuf,
    pub pending: PathBuf,
    pub repo_url: String,
    #[serde(default)]
    pub max_items: Option<NonZeroUsize>,
    #[serde(default = "default_alert_threshold")]
    pub alert_threshold: f64,
    #[serde(default)]
    pub keep_pending: bool,
}

pub fn load_config(path: &Path) -> Result<PublisherConfig> {
    let config = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let mut config: PublisherConfig = serde_yaml::from_str(&config)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    let base = path.parent().unwrap_or_else(|| Path::new(""));
    config.data = base.join(&config.data);
    config.pending = base.join(&config.pending);

    Ok(config)
}

impl PublisherConfig {
    pub fn publish_options(&self) -> PublishOptions {
        PublishOptions {
            append: AppendOptions {
                max_items: self.max_items.map(NonZeroUsize::get),
                repo_url: Some(self.repo_url.clone()),
            },
            alert_threshold: self.alert_threshold,
        }
    }
}

fn default_alert_threshold() -> f64 {
    shared::alert::DEFAULT_THRESHOLD
}
