// Truth Detective - native messaging host entry point

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use truth_detective::host::{self, NativeBridge, DEFAULT_REPLY_TIMEOUT};
use truth_detective::state::AppState;
use truth_detective::storage::{ConfigOverrides, ConfigService};

#[derive(Parser, Debug)]
#[command(name = "truth-detective-host", version, about = "Truth Detective native messaging host")]
struct Cli {
    /// Host config file (defaults to ~/.truth-detective/host.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for the persisted sync/local scopes
    #[arg(long)]
    storage_dir: Option<PathBuf>,

    /// Free-tier Google AI key
    #[arg(long, env = "TRUTH_DETECTIVE_FREE_TIER_KEY", hide_env_values = true)]
    free_tier_key: Option<String>,

    /// Supadata transcript API key
    #[arg(long, env = "TRUTH_DETECTIVE_TRANSCRIPT_KEY", hide_env_values = true)]
    transcript_key: Option<String>,

    /// Arguments the browser appends (caller origin, parent window)
    #[arg(hide = true, trailing_var_arg = true, allow_hyphen_values = true)]
    caller: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries the protocol, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("truth_detective=info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();
    if let Some(origin) = cli.caller.first() {
        tracing::info!(%origin, "launched by browser");
    }

    let service = match cli.config {
        Some(path) => ConfigService::open(path),
        None => ConfigService::new(),
    }
    .context("failed to load host config")?;
    tracing::info!(path = %service.path().display(), "config loaded");

    let config = service.into_config(ConfigOverrides {
        free_tier_api_key: cli.free_tier_key,
        transcript_api_key: cli.transcript_key,
        storage_dir: cli.storage_dir,
    });

    let (bridge, outbound) = NativeBridge::new(DEFAULT_REPLY_TIMEOUT);
    let state = AppState::new();
    state
        .initialize(config, bridge.clone())
        .await
        .context("failed to initialize host")?;
    let coordinator = state.coordinator().await?;

    host::serve(tokio::io::stdin(), tokio::io::stdout(), coordinator, bridge, outbound)
        .await
        .context("native messaging session failed")?;

    tracing::info!("host exiting");
    Ok(())
}
