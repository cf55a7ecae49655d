//! Faucet HTTP service.
//!
//! Three routes end in a payout: an anonymous claim limited per address and
//! client IP, an authorized claim for KYC-verified identities, and the KYC
//! provider's callback. All of them go through one [`Dispatcher`], which
//! serializes transfers and queues requests that arrive while one is in flight.

pub mod api;
pub mod dispatch;
mod error;
pub mod jwt;
pub mod kyc;
pub mod limiter;
pub mod metrics;

pub use dispatch::{Dispatch, DispatchError, Dispatcher, Funding};
pub use error::ApiError;
pub use kyc::{HydraKyc, KycCallback, KycProvider};
pub use limiter::Limiter;
pub use metrics::Metrics;

use alloy_primitives::Address;
use chain::TxBuilder;
use std::{future::Future, net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};
use storage::Storage;
use tokio::net::TcpListener;
use tracing::info;

/// How often the queue consumer wakes up.
pub const QUEUE_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Settings the HTTP layer needs.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
    pub proxy_count: usize,
    /// Rate-limit window (zero disables limiting)
    pub interval: Duration,
    pub queue_cap: usize,
    /// Whole coins per payout
    pub payout: u64,
    /// Whole tokens per payout
    pub tokens_payout: u64,
    pub web_dir: Option<PathBuf>,
}

impl From<&config::Config> for ServerConfig {
    fn from(config: &config::Config) -> Self {
        Self {
            http_port: config.http_port,
            proxy_count: config.proxy_count,
            interval: config.interval(),
            queue_cap: config.queue_cap,
            payout: config.payout,
            tokens_payout: config.tokens_payout,
            web_dir: config.web_dir.clone(),
        }
    }
}

/// State shared by every handler.
pub struct AppState {
    pub tx_builder: Arc<dyn TxBuilder>,
    pub storage: Arc<dyn Storage>,
    pub kyc: Arc<dyn KycProvider>,
    pub claim_limiter: Limiter,
    pub auth_limiter: Limiter,
    pub dispatcher: Arc<Dispatcher>,
    pub config: ServerConfig,
    pub metrics: Metrics,
}

impl AppState {
    /// Fund `address`, returning the response body.
    pub async fn fund(&self, address: Address) -> Result<String, ApiError> {
        match self.dispatcher.dispatch(address).await? {
            Dispatch::Funded(funding) => Ok(funding.to_string()),
            Dispatch::Queued => Ok(format!(
                "Added {} to the queue",
                address.to_checksum(None)
            )),
        }
    }
}

pub struct Server {
    state: Arc<AppState>,
}

impl Server {
    pub fn new(
        tx_builder: Arc<dyn TxBuilder>,
        storage: Arc<dyn Storage>,
        kyc: Arc<dyn KycProvider>,
        config: ServerConfig,
    ) -> Self {
        let metrics = Metrics::new();
        let dispatcher = Arc::new(Dispatcher::new(
            tx_builder.clone(),
            chain::to_wei(config.payout),
            chain::to_wei(config.tokens_payout),
            config.queue_cap,
            metrics.clone(),
        ));

        // Anonymous and authorized claims are limited independently
        let state = AppState {
            tx_builder,
            storage,
            kyc,
            claim_limiter: Limiter::new(config.interval, config.proxy_count),
            auth_limiter: Limiter::new(config.interval, config.proxy_count),
            dispatcher,
            config,
            metrics,
        };

        Self {
            state: Arc::new(state),
        }
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    pub fn router(&self) -> axum::Router {
        api::router(self.state.clone())
    }

    /// Serve until `shutdown` resolves, draining the queue in the background.
    pub async fn run<F>(self, shutdown: F) -> eyre::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let consumer = tokio::spawn(
            self.state
                .dispatcher
                .clone()
                .run_consumer(QUEUE_POLL_INTERVAL),
        );

        let addr = SocketAddr::from(([0, 0, 0, 0], self.state.config.http_port));
        let listener = TcpListener::bind(addr).await?;
        info!(%addr, "Faucet listening");

        let served = axum::serve(
            listener,
            self.router()
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await;

        consumer.abort();
        info!("Faucet stopped");

        served.map_err(Into::into)
    }
}
