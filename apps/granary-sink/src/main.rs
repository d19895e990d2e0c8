mod cli;

use anyhow::{Context, Result};
use granary_config::AppConfig;
use granary_gcs::GcsClient;
use granary_sink_core::{emit_state, persist_lines};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    // stdout is the checkpoint output boundary, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = cli::parse_args();
    let config = match &args.config_path {
        Some(path) => granary_config::load_config(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => AppConfig::default(),
    };

    let client = GcsClient::new(&config)?;

    let stdin = std::io::stdin();
    let state = persist_lines(&config, &client, stdin.lock()).await?;

    let stdout = std::io::stdout();
    emit_state(state.as_ref(), &mut stdout.lock())?;

    debug!("exiting normally");
    Ok(())
}
