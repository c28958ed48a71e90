//! vcmsim - VCM protocol simulator
//!
//! Listens for IHU datagrams and plays the vehicle connectivity module side of
//! the WiFi setup exchange, one session per IHU address.

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vcm_engine::{SimulatorConfig, UdpServer};

#[derive(Debug, Parser)]
#[command(name = "vcmsim")]
#[command(about = "VCM simulator - answers IHU WiFi setup traffic over UDP")]
#[command(version)]
struct Cli {
    /// YAML or JSON configuration file
    #[arg(short, long, env = "VCMSIM_CONFIG")]
    config: Option<PathBuf>,

    /// UDP address to listen on
    #[arg(short, long)]
    bind: Option<SocketAddr>,

    /// SSID broadcast period in milliseconds
    #[arg(long, value_name = "MS")]
    broadcast_interval_ms: Option<u64>,

    /// How long a burst waits for an IHU response, in milliseconds
    #[arg(long, value_name = "MS")]
    response_timeout_ms: Option<u64>,

    /// Sequence number of the first simulator-initiated request
    #[arg(long, value_name = "N", value_parser = parse_sequence)]
    first_sequence: Option<u8>,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    /// Defaults, then the config file, then command-line flags.
    fn resolve_config(&self) -> Result<SimulatorConfig> {
        let mut config = match &self.config {
            Some(path) => SimulatorConfig::load(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => SimulatorConfig::default(),
        };

        if let Some(bind) = self.bind {
            config.bind_address = bind;
        }
        if let Some(ms) = self.broadcast_interval_ms {
            config.session.broadcast_interval_ms = ms;
        }
        if let Some(ms) = self.response_timeout_ms {
            config.session.response_timeout_ms = ms;
        }
        if let Some(seq) = self.first_sequence {
            config.session.first_sequence = seq;
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

/// Accepts decimal or `0x`-prefixed hex.
fn parse_sequence(raw: &str) -> Result<u8, String> {
    let parsed = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => raw.parse::<u8>(),
    };
    parsed.map_err(|e| format!("invalid sequence number '{raw}': {e}"))
}

/// Resolves on Ctrl-C or SIGTERM.
///
/// # Errors
///
/// Fails if the SIGTERM handler cannot be registered.
#[cfg(unix)]
fn shutdown_signal() -> Result<impl Future<Output = ()>> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm =
        signal(SignalKind::terminate()).context("Failed to register SIGTERM handler")?;
    Ok(async move {
        tokio::select! {
            result = tokio::signal::ctrl_c() => match result {
                Ok(()) => info!("Received Ctrl-C"),
                Err(e) => error!(error = %e, "failed to listen for Ctrl-C, shutting down"),
            },
            _ = sigterm.recv() => info!("Received SIGTERM"),
        }
    })
}

/// Resolves on Ctrl-C.
///
/// # Errors
///
/// Infallible on this platform.
#[cfg(not(unix))]
fn shutdown_signal() -> Result<impl Future<Output = ()>> {
    Ok(async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl-C"),
            Err(e) => error!(error = %e, "failed to listen for Ctrl-C, shutting down"),
        }
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("vcmsim={log_level},vcm_engine={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config = cli.resolve_config()?;
    info!(
        bind = %config.bind_address,
        broadcast_interval_ms = config.session.broadcast_interval_ms,
        response_timeout_ms = config.session.response_timeout_ms,
        "starting VCM simulator"
    );

    let server = UdpServer::bind(&config)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address))?;

    let shutdown = shutdown_signal()?;
    server.run(shutdown).await?;

    Ok(())
}
