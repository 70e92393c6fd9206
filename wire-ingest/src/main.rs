use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use wire_ingest::{PollConfig, PollOrchestrator, PollRequest, WirePoller};

/// Runs one poll of the news wire and prints `{payloads, nextCursor}` as JSON.
#[derive(Debug, Parser)]
#[command(name = "wire-ingest", version)]
struct Cli {
    /// Cursor returned by the previous successful poll. Empty starts from the feed head.
    #[arg(long, env = "WIRE_CURSOR", default_value = "")]
    cursor: String,

    /// API key for the feed.
    #[arg(long, env = "WIRE_API_KEY", hide_env_values = true)]
    credential: Option<String>,

    #[arg(long)]
    attempt_budget: Option<u32>,

    #[arg(long)]
    retry_delay_ms: Option<u64>,

    /// Read the whole invocation as a JSON request from this file.
    /// Takes precedence over the other flags.
    #[arg(long)]
    request: Option<PathBuf>,
}

impl Cli {
    fn into_request(self) -> Result<PollRequest> {
        if let Some(path) = self.request {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("reading request file {}", path.display()))?;
            return serde_json::from_str(&raw).context("parsing poll request");
        }

        Ok(PollRequest {
            credential: self
                .credential
                .context("a credential is required (--credential or WIRE_API_KEY)")?,
            cursor: self.cursor,
            attempt_budget: self.attempt_budget,
            retry_delay_ms: self.retry_delay_ms,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let request = Cli::parse().into_request()?;
    let config = PollConfig::from_env().context("loading configuration")?;
    info!(
        "Polling {} feed (worst case page fetch {:?})",
        config.source.feed_tag,
        config.fetch.worst_case_latency()
    );

    let orchestrator = PollOrchestrator::new(config).context("building poller")?;
    let response = WirePoller::poll(&orchestrator, request).await.context("poll failed")?;

    info!("Polled {} payloads", response.payloads.len());
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
