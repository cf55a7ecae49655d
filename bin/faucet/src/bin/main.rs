use clap::Parser;
use config::Config;
use faucet::{apply_overrides, install_prometheus_exporter, run_balance_reporter};
use server::{HydraKyc, Server, ServerConfig};
use std::{path::PathBuf, sync::Arc};
use storage::RedbStorage;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "faucet", version)]
#[command(about = "Native coin and core token faucet")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Private key of the funding account (hex string, with or without 0x prefix)
    #[arg(short = 'k', long, env = "PRIVATE_KEY", hide_env_values = true)]
    private_key: String,

    /// Override the node RPC URL from the config file
    #[arg(long, env = "WEB3_PROVIDER")]
    rpc_url: Option<String>,

    /// Override the registry contract address from the config file
    #[arg(long, env = "REGISTRY_ADDRESS")]
    registry_address: Option<String>,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    info!("Starting faucet");
    info!("Loading config: {}", cli.config.display());

    let mut config = Config::from_file(&cli.config)?;
    apply_overrides(&mut config, cli.rpc_url, cli.registry_address.as_deref())?;

    info!("Loaded config:");
    info!("  RPC URL: {}", config.rpc_url);
    info!("  Registry: {}", config.registry_address);
    info!("  KYC request URL: {}", config.kyc_request_url);
    info!("  Callback URL: {}", config.callback_url);
    info!("  HTTP port: {}", config.http_port);
    info!("  Proxy count: {}", config.proxy_count);
    info!("  Queue capacity: {}", config.queue_cap);
    info!("  Payout: {} coins, {} tokens", config.payout, config.tokens_payout);
    info!("  Interval: {} minutes", config.interval_minutes);
    info!("  Storage: {}", config.storage_path.display());
    if config.interval_minutes == 0 {
        warn!("Rate limiting is disabled");
    }

    let signer = client::parse_private_key(&cli.private_key)?;
    let storage = Arc::new(RedbStorage::open(&config.storage_path)?);

    info!("Connecting to node...");
    let tx_build = Arc::new(
        chain::connect(&config.rpc_url, signer, config.registry_address).await?,
    );

    if let Some(port) = config.metrics_port {
        install_prometheus_exporter(port)?;
    }

    let kyc = Arc::new(HydraKyc::new(
        config.kyc_request_url.clone(),
        config.callback_url.clone(),
    ));
    let server = Server::new(
        tx_build.clone(),
        storage,
        kyc,
        ServerConfig::from(&config),
    );

    let reporter = tokio::spawn(run_balance_reporter(
        tx_build,
        server.state().metrics.clone(),
        chain::to_wei(config.payout),
        chain::to_wei(config.tokens_payout),
        config.balance_poll_interval(),
    ));

    server.run(shutdown_signal()).await?;
    reporter.abort();

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received Ctrl-C, shutting down");
}
