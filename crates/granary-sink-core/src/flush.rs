use crate::batch::StreamBatch;
use anyhow::{bail, Context, Result};
use granary_config::AppConfig;
use granary_gcs::GcsClient;
use tracing::{error, info};

// Object key: object_path/stream[/run_ts]/{stream}_{sequence}.json, with
// empty segments skipped.
pub(crate) fn object_key(
    config: &AppConfig,
    stream: &str,
    run_timestamp: Option<&str>,
    sequence: u64,
) -> String {
    let mut segments = Vec::new();
    let prefix = config.object_path.trim_matches('/');
    if !prefix.is_empty() {
        segments.push(prefix.to_string());
    }
    segments.push(stream.to_string());
    if let Some(timestamp) = run_timestamp {
        segments.push(timestamp.to_string());
    }
    segments.push(format!("{stream}_{sequence}.json"));
    segments.join("/")
}

// Returns Ok(true) when an object was uploaded and the spool truncated,
// Ok(false) when the buffer held no records (no object, no log).
pub(crate) async fn flush_stream(
    client: &GcsClient,
    config: &AppConfig,
    stream: &str,
    batch: &mut StreamBatch,
    run_timestamp: Option<&str>,
) -> Result<bool> {
    if batch.is_empty() {
        return Ok(false);
    }

    if config.bucket_name.is_empty() {
        bail!("config is missing required key `bucket_name`");
    }

    let key = object_key(config, stream, run_timestamp, batch.sequence());
    info!("uploading gs://{}/{}", config.bucket_name, key);

    if let Err(exc) = client
        .bucket(&config.bucket_name)
        .object(&key)
        .upload_from_file(batch.path())
        .await
    {
        error!(
            "failed to load to bucket {} from stream {stream}: {exc}",
            config.bucket_name
        );
        return Err(exc)
            .with_context(|| format!("failed to upload gs://{}/{}", config.bucket_name, key));
    }

    batch.truncate()?;
    Ok(true)
}
