//! kinesis-pipe binary entry point.
//!
//! Usage: kinesis-pipe --stream-name <name> [--variant delivery] [--json] < input
//!
//! Reads stdin line by line and writes every line to the stream through a
//! buffering adapter. Exits non-zero if the stream turns out not to be ready.

use anyhow::Context;
use clap::Parser;
use kinesis_batch_writer::logging::{init_with_config, LogConfig};
use kinesis_batch_writer::pipe::pipe_lines;
use kinesis_batch_writer::{HttpSinkClient, SinkConfig, SinkVariant, StreamAdapter};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::info;

/// Pipe newline-delimited records from stdin into a stream.
#[derive(Parser, Debug)]
#[command(name = "kinesis-pipe")]
#[command(about = "Pipe newline-delimited records from stdin into a stream")]
struct Args {
    /// Target stream name.
    #[arg(long, env = "KINESIS_STREAM_NAME")]
    stream_name: Option<String>,

    /// Sink variant (partitioned / delivery).
    #[arg(long, env = "KINESIS_STREAM_VARIANT")]
    variant: Option<SinkVariant>,

    /// Buffered records that trigger a flush.
    #[arg(long, env = "KINESIS_THRESHOLD")]
    threshold: Option<usize>,

    /// Service region.
    #[arg(long, env = "AWS_REGION")]
    region: Option<String>,

    /// Explicit endpoint URL (emulator or signing proxy).
    #[arg(long, env = "KINESIS_ENDPOINT")]
    endpoint: Option<String>,

    /// JSON config file, applied before flags.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Parse each line as JSON and send it as a structured record.
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines.
    #[arg(long)]
    log_json: bool,
}

fn build_config(args: &Args) -> anyhow::Result<SinkConfig> {
    let mut config = match &args.config {
        Some(path) => SinkConfig::load_from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => SinkConfig::default(),
    };
    config
        .load_from_env()
        .context("invalid environment configuration")?;

    if let Some(name) = &args.stream_name {
        config.stream_name = name.clone();
    }
    if let Some(variant) = args.variant {
        config.variant = variant;
    }
    if let Some(threshold) = args.threshold {
        config.threshold = threshold;
    }
    if let Some(region) = &args.region {
        config.transport.region = Some(region.clone());
    }
    if let Some(endpoint) = &args.endpoint {
        config.transport.endpoint = Some(endpoint.clone());
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_with_config(LogConfig {
        default_level: args.log_level.clone(),
        json: args.log_json,
    });

    let config = build_config(&args)?;
    let client = Arc::new(HttpSinkClient::from_config(&config));

    info!(
        stream_name = %config.stream_name,
        variant = %config.variant,
        endpoint = %client.endpoint(),
        threshold = config.threshold,
        "Configuration loaded"
    );

    let (adapter, events) =
        StreamAdapter::new(config, client, tokio::runtime::Handle::current())?;

    // ctrl_c fails only when no handler can be installed; then never interrupt.
    let shutdown = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    let stdin = BufReader::new(tokio::io::stdin());
    let written = pipe_lines(adapter, events, stdin, args.json, shutdown).await?;
    info!(records = written, "Done");

    Ok(())
}
