//! AM-Vision demo connector
//!
//! Registers webhook handlers with AM-Vision, serves the hook endpoint and
//! periodically imports a prints metadata file.

use anyhow::{Context, Result};
use clap::Parser;
use connector_lib::{
    callback_url, ApiClient, Connector, ConnectorSettings, DemoConnector, Dispatcher,
    StructuredLogger,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;

const CONNECTOR_VERSION: &str = env!("CARGO_PKG_VERSION");

/// AM-Vision demo connector
#[derive(Parser)]
#[command(name = "amv-connector")]
#[command(author, version, about = "AM-Vision demo connector", long_about = None)]
struct Cli {
    /// IP address the webhook server listens on
    #[arg(env = "AMV_IP")]
    ip: String,

    /// Port the webhook server listens on
    #[arg(env = "AMV_PORT")]
    port: u16,

    /// AM-Vision API URL
    #[arg(env = "AMV_URL")]
    amv_url: String,

    /// AM-Vision API token
    #[arg(env = "AMV_TOKEN", hide_env_values = true)]
    amv_token: String,

    /// Synchronize once and exit
    #[arg(long, short, env = "AMV_SINGLE_SYNC")]
    single_sync: bool,

    /// Minutes between synchronizations
    #[arg(
        long,
        short,
        env = "AMV_INTERVAL",
        default_value_t = 30,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    interval: u64,

    /// Path to a YAML file with prints definitions
    #[arg(long, short, env = "AMV_PRINTS")]
    prints: Option<PathBuf>,

    /// Path to an optional configuration file
    #[arg(long, short, env = "AMV_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    let config = config::ConnectorConfig::load(cli.config.as_deref())?;

    let logger = StructuredLogger::new("demo");
    logger.log_startup(CONNECTOR_VERSION, &cli.amv_url, cli.single_sync);

    let api = Arc::new(ApiClient::new(&cli.amv_url, &cli.amv_token)?);
    let demo = Arc::new(DemoConnector::new(api.clone(), cli.prints.clone()));

    let endpoint = config
        .callback_url
        .clone()
        .unwrap_or_else(|| callback_url(&cli.ip, cli.port));
    let mut dispatcher = Dispatcher::new(api, endpoint);

    // a single synchronization never serves hooks
    if !cli.single_sync {
        let registered = dispatcher
            .register_handlers(demo.handlers())
            .await
            .context("failed to register webhook handlers")?;
        info!(registered, endpoint = %dispatcher.endpoint_url(), "Handlers registered");
    }

    demo.prepare().await?;

    let settings = ConnectorSettings {
        single_sync: cli.single_sync,
        interval: Duration::from_secs(cli.interval * 60),
        initial_delay: Duration::from_secs(config.initial_delay_secs),
        ..ConnectorSettings::new(cli.ip, cli.port)
    };

    let connector = Connector::new(settings, dispatcher, demo, logger.clone());
    connector
        .run(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Received Ctrl-C");
            }
        })
        .await?;

    logger.log_shutdown(if cli.single_sync {
        "single synchronization finished"
    } else {
        "SIGINT received"
    });

    Ok(())
}
