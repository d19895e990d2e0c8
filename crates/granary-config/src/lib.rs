use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

// Unknown keys are tolerated on purpose: the deployed config file also holds
// cloud-SDK credential entries the sink itself never reads.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub bucket_name: String,
    #[serde(default)]
    pub object_path: String,
    #[serde(default)]
    pub append_timestamp_folder: bool,
    #[serde(default)]
    pub sync_batch: Option<u64>,
    #[serde(default)]
    pub sync_if_stream_changes: bool,
    #[serde(default = "default_storage_endpoint")]
    pub storage_endpoint: String,
    #[serde(default)]
    pub storage_token: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bucket_name: String::new(),
            object_path: String::new(),
            append_timestamp_folder: false,
            sync_batch: None,
            sync_if_stream_changes: false,
            storage_endpoint: default_storage_endpoint(),
            storage_token: String::new(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

fn default_storage_endpoint() -> String {
    "https://storage.googleapis.com".to_string()
}

fn default_timeout_seconds() -> f64 {
    300.0
}

pub fn load_config(path: impl AsRef<Path>) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("failed to read config {}", path.as_ref().display()))?;
    let cfg: AppConfig = serde_json::from_str(&content).context("failed to parse JSON config")?;
    Ok(cfg)
}
