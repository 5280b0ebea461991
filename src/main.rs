//! forza-dsx - Forza telemetry to DualSense haptics over DSX
//!
//! Point Forza's Data Out at this machine's telemetry port (5300 by default), start DSX
//! with UDP enabled, then run the bridge until Ctrl-C.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use forza_dsx::{BridgeError, Config, ForzaDsx, TracingSink};

#[derive(Parser, Debug)]
#[command(name = "forza-dsx")]
#[command(about = "Drive DualSense adaptive triggers and light bar from Forza telemetry")]
#[command(version)]
struct Cli {
    /// YAML configuration file; missing keys use defaults
    #[arg(short, long, env = "FORZA_DSX_CONFIG")]
    config: Option<PathBuf>,

    /// UDP port Forza sends Data Out packets to
    #[arg(long)]
    forza_port: Option<u16>,

    /// Host DSX listens on
    #[arg(long)]
    dsx_host: Option<String>,

    /// UDP port DSX listens on
    #[arg(long)]
    dsx_port: Option<u16>,

    /// DualSense controller index
    #[arg(long)]
    controller: Option<u8>,

    /// Report race summaries (-v) and per-packet diagnostics (-vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Print the effective configuration as YAML and exit
    #[arg(long)]
    print_config: bool,
}

impl Cli {
    fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)
                .with_context(|| format!("loading configuration from {}", path.display()))?,
            None => Config::default(),
        };

        if let Some(port) = self.forza_port {
            config.network.forza_port = port;
        }
        if let Some(host) = &self.dsx_host {
            config.network.dsx_host = host.clone();
        }
        if let Some(port) = self.dsx_port {
            config.network.dsx_port = port;
        }
        if let Some(index) = self.controller {
            config.network.controller_index = index;
        }
        config.verbosity = config.verbosity.max(self.verbose);

        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 | 1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("forza_dsx={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let result = run(cli).await;
    if let Err(e) = &result {
        error!("{:#}", e);
        if let Some(bridge_error) = e.downcast_ref::<BridgeError>() {
            for suggestion in bridge_error.recovery_suggestions() {
                eprintln!("  - {suggestion}");
            }
        }
    }
    result
}

async fn run(cli: Cli) -> Result<()> {
    let config = cli.load_config()?;

    if cli.print_config {
        print!("{}", config.to_yaml()?);
        return Ok(());
    }

    let bridge = ForzaDsx::start(config, Arc::new(TracingSink)).await.context("starting bridge")?;

    let cancel = bridge.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, stopping");
            cancel.cancel();
        }
    });

    let stats = bridge.join().await.context("bridge stopped")?;
    info!(
        packets = stats.packets_received,
        batches = stats.batches_sent,
        "Bridge stopped"
    );
    Ok(())
}
