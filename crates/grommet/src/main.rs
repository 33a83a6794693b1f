//! Grommet CLI binary.

use anyhow::Result;
use grommet::cli::Cli;
use tracing_subscriber::EnvFilter;

/// Main entry point for the grommet CLI.
///
/// Uses tokio's current_thread runtime: every operation is awaited in turn,
/// and the simulated transfers only need timers.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Logs go to stderr so `--json` output on stdout stays parseable.
    // Example: RUST_LOG=grommet=debug grommet list
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("grommet=info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    tracing::debug!("Starting grommet");

    let cli = Cli::parse_args();
    cli.execute().await?;

    tracing::debug!("Grommet completed successfully");
    Ok(())
}
