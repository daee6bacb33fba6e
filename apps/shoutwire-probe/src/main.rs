//! Shoutwire Probe - connects to a SHOUTcast/Icecast station and reports
//! what the server negotiated.
//!
//! Prints station and audio details after the handshake and can capture the
//! first bytes of the raw payload to a file for inspection.

mod config;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use clap::Parser;
use serde::Serialize;
use shoutwire_core::{
    AudioInfo, Connector, ErrorCode, HeadersObserver, ShoutResult, ShoutcastStream, StationInfo,
    StreamMetadata, Url,
};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::signal;

use crate::config::ProbeConfig;

/// Bytes read from the stream per capture iteration.
const CAPTURE_CHUNK: usize = 8 * 1024;

/// Shoutwire Probe - SHOUTcast/Icecast handshake inspector.
#[derive(Parser, Debug)]
#[command(name = "shoutwire-probe")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Stream URL (e.g. http://radio.example:8000/stream).
    url: Url,

    /// Path to the configuration file (YAML).
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(short, long, default_value = "info", env = "SHOUTWIRE_LOG_LEVEL")]
    log_level: log::LevelFilter,

    /// User agent (overrides config file).
    #[arg(short = 'u', long)]
    user_agent: Option<String>,

    /// Suffix appended to the URL path (overrides config file).
    #[arg(short = 'r', long)]
    relative_path: Option<String>,

    /// Handshake timeout in seconds, 0 to wait forever (overrides config file).
    #[arg(short = 't', long)]
    timeout: Option<u64>,

    /// Number of payload bytes to capture after the handshake.
    #[arg(short = 'n', long)]
    capture_bytes: Option<usize>,

    /// File receiving captured payload bytes.
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Accept streams with an unrecognized content type.
    #[arg(long)]
    allow_unknown_format: bool,

    /// Print the report as JSON.
    #[arg(long)]
    json: bool,
}

/// Logs every raw header once the handshake succeeds.
struct HeaderLogger;

#[async_trait]
impl HeadersObserver for HeaderLogger {
    async fn headers_received(&self, metadata: &StreamMetadata) -> ShoutResult<()> {
        for entry in metadata.headers.iter() {
            log::debug!("[Probe] {}: {}", entry.key, entry.value);
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct ProbeReport<'a> {
    url: &'a str,
    station: &'a StationInfo,
    audio: &'a AudioInfo,
    metadata_interval: u32,
    captured_bytes: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::new()
        .filter_level(args.log_level)
        .format_timestamp_millis()
        .init();

    log::info!("Shoutwire Probe v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut config =
        ProbeConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    // Apply CLI overrides
    if let Some(user_agent) = args.user_agent.clone() {
        config.user_agent = user_agent;
    }
    if let Some(relative_path) = args.relative_path.clone() {
        config.relative_path = relative_path;
    }
    if let Some(timeout) = args.timeout {
        config.handshake_timeout_secs = timeout;
    }
    if let Some(capture_bytes) = args.capture_bytes {
        config.capture_bytes = capture_bytes;
    }
    if args.allow_unknown_format {
        config.allow_unknown_format = true;
    }
    check_capture_target(&config, args.output.as_deref())?;

    tokio::select! {
        result = probe(&args, &config) => result,
        _ = shutdown_signal() => {
            log::info!("Interrupted, exiting");
            Ok(())
        }
    }
}

async fn probe(args: &Args, config: &ProbeConfig) -> Result<()> {
    let connector = Connector::new(config.to_settings()).with_observer(Arc::new(HeaderLogger));

    let stream = match connector.connect(&args.url).await {
        Ok(stream) => stream,
        Err(e) => {
            log::error!("Handshake failed [{}]: {}", e.code(), e);
            return Err(e).with_context(|| format!("Failed to connect to {}", args.url));
        }
    };

    if !config.allow_unknown_format {
        let playable = stream.audio().ensure_playable();
        if let Err(e) = playable {
            stream.close().await;
            bail!("{} (use --allow-unknown-format to continue anyway)", e);
        }
    }

    let captured = capture(&stream, config.capture_bytes, args.output.as_deref()).await;
    let captured = match captured {
        Ok(captured) => captured,
        Err(e) => {
            stream.close().await;
            return Err(e);
        }
    };

    print_report(args, stream.metadata(), captured)?;
    stream.close().await;
    Ok(())
}

/// Rejects an output file when there is nothing to capture into it.
///
/// `capture_bytes` may come from the config file, so this runs after overrides.
fn check_capture_target(config: &ProbeConfig, output: Option<&Path>) -> Result<()> {
    if let Some(path) = output {
        if config.capture_bytes == 0 {
            bail!(
                "--output {} given but capture_bytes is 0 (set --capture-bytes)",
                path.display()
            );
        }
    }
    Ok(())
}

/// Reads up to `limit` payload bytes, writing them to `output` when given.
async fn capture(
    stream: &ShoutcastStream<TcpStream>,
    limit: usize,
    output: Option<&Path>,
) -> Result<usize> {
    if limit == 0 {
        return Ok(0);
    }

    let mut file = match output {
        Some(path) => Some(
            tokio::fs::File::create(path)
                .await
                .with_context(|| format!("Failed to create output file: {}", path.display()))?,
        ),
        None => None,
    };

    let mut captured = 0;
    while captured < limit {
        let chunk = stream
            .read_raw(CAPTURE_CHUNK.min(limit - captured))
            .await
            .context("Stream ended during capture")?;
        if let Some(file) = file.as_mut() {
            file.write_all(&chunk).await?;
        }
        captured += chunk.len();
    }

    if let Some(mut file) = file {
        file.flush().await?;
    }

    log::info!("Captured {} payload bytes", captured);
    Ok(captured)
}

fn print_report(args: &Args, metadata: &StreamMetadata, captured: usize) -> Result<()> {
    if args.json {
        let report = ProbeReport {
            url: args.url.as_str(),
            station: &metadata.station,
            audio: &metadata.audio,
            metadata_interval: metadata.metadata_interval,
            captured_bytes: captured,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let station = &metadata.station;
    println!("Station:     {}", station.name);
    println!("Genre:       {}", station.genre);
    if let Some(description) = &station.description {
        println!("Description: {}", description);
    }
    if let Some(url) = &station.url {
        println!("Homepage:    {}", url);
    }
    println!(
        "Audio:       {:?} ({}), {} kbps",
        metadata.audio.format, metadata.audio.content_type, metadata.audio.bit_rate
    );
    if metadata.metadata_enabled() {
        println!("Metadata:    every {} bytes", metadata.metadata_interval);
    } else {
        println!("Metadata:    disabled");
    }
    if captured > 0 {
        println!("Captured:    {} bytes", captured);
    }
    Ok(())
}

/// Waits for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            log::warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                log::warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_without_capture_is_rejected() {
        let config = ProbeConfig::default();
        let err = check_capture_target(&config, Some(Path::new("out.mp3"))).unwrap_err();
        assert!(err.to_string().contains("capture_bytes is 0"));
    }

    #[test]
    fn output_with_capture_is_accepted() {
        let config = ProbeConfig {
            capture_bytes: 1024,
            ..ProbeConfig::default()
        };
        assert!(check_capture_target(&config, Some(Path::new("out.mp3"))).is_ok());
        assert!(check_capture_target(&ProbeConfig::default(), None).is_ok());
    }
}
