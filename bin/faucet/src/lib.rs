use alloy_primitives::U256;
use alloy_provider::Provider;
use chain::TxBuild;
use config::Config;
use server::Metrics;
use std::{sync::Arc, time::Duration};
use tokio::time;
use tracing::{info, warn};

/// Apply command-line overrides on top of the file configuration.
pub fn apply_overrides(
    config: &mut Config,
    rpc_url: Option<String>,
    registry_address: Option<&str>,
) -> eyre::Result<()> {
    if let Some(rpc_url) = rpc_url {
        config.rpc_url = rpc_url;
    }
    if let Some(registry_address) = registry_address {
        config.registry_address = registry_address
            .parse()
            .map_err(|e| eyre::eyre!("invalid registry address {registry_address}: {e}"))?;
    }

    config.validate()?;
    Ok(())
}

/// Query the faucet account's balances once and publish them as gauges.
pub async fn report_balances<P>(
    tx_build: &TxBuild<P>,
    metrics: &Metrics,
    payout: U256,
    tokens_payout: U256,
) -> eyre::Result<()>
where
    P: Provider + Clone,
{
    let balances = tx_build.faucet_balances().await?;
    metrics.set_native_balance(balances.native.saturating_to::<u128>());
    metrics.set_token_balance(balances.tokens.saturating_to::<u128>());

    let payouts_left = balances.payouts_left(payout, tokens_payout);
    info!(
        account = %tx_build.account(),
        native = %balances.native,
        tokens = %balances.tokens,
        payouts_left = %payouts_left,
        "Faucet balance"
    );
    if payouts_left.is_zero() {
        warn!("Faucet cannot afford another payout");
    }

    Ok(())
}

/// Publish balances every `period` until the task is aborted.
pub async fn run_balance_reporter<P>(
    tx_build: Arc<TxBuild<P>>,
    metrics: Metrics,
    payout: U256,
    tokens_payout: U256,
    period: Duration,
) where
    P: Provider + Clone,
{
    let mut interval = time::interval(period);

    loop {
        interval.tick().await;

        if let Err(e) = report_balances(&tx_build, &metrics, payout, tokens_payout).await {
            warn!("Failed to query faucet balance: {}", e);
        }
    }
}

/// Install the Prometheus metrics exporter and start the HTTP server.
///
/// Returns an error if the server fails to bind to the specified port.
pub fn install_prometheus_exporter(port: u16) -> eyre::Result<()> {
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::net::SocketAddr;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| eyre::eyre!("Failed to install Prometheus exporter: {}", e))?;

    info!(%addr, "Prometheus exporter listening");
    Ok(())
}
