//! Serialized funding with a bounded wait queue.
//!
//! At most one payout is in flight. A request arriving while the lock is held,
//! or while others are already waiting, joins the queue instead; the consumer
//! drains it once per tick.

use crate::metrics::Metrics;
use alloy_primitives::{Address, TxHash, U256};
use chain::TxBuilder;
use std::{
    fmt,
    sync::Arc,
    time::{Duration, Instant},
};
use thiserror::Error;
use tokio::{
    sync::{mpsc, Mutex},
    time,
};
use tracing::{error, info, warn};

/// Upper bound on each transfer submission.
pub const TRANSFER_TIMEOUT: Duration = Duration::from_secs(5);

/// Hashes of a completed payout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Funding {
    pub tx_hash: TxHash,
    pub tokens_tx_hash: TxHash,
}

impl fmt::Display for Funding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Txhash: {}, TokensTxHash: {}",
            self.tx_hash, self.tokens_tx_hash
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Paid out right away.
    Funded(Funding),
    /// Waiting in the queue.
    Queued,
}

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Faucet queue is too long, please try again later")]
    QueueFull,

    #[error(transparent)]
    Transfer(#[from] eyre::Report),
}

pub struct Dispatcher {
    tx_builder: Arc<dyn TxBuilder>,
    payout: U256,
    tokens_payout: U256,
    lock: Mutex<()>,
    sender: mpsc::Sender<Address>,
    receiver: Mutex<mpsc::Receiver<Address>>,
    metrics: Metrics,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("sender", &self.tx_builder.sender())
            .field("payout", &self.payout)
            .field("tokens_payout", &self.tokens_payout)
            .field("queued", &self.queued())
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Amounts are in wei; `queue_cap` must be non-zero.
    pub fn new(
        tx_builder: Arc<dyn TxBuilder>,
        payout: U256,
        tokens_payout: U256,
        queue_cap: usize,
        metrics: Metrics,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(queue_cap.max(1));
        Self {
            tx_builder,
            payout,
            tokens_payout,
            lock: Mutex::new(()),
            sender,
            receiver: Mutex::new(receiver),
            metrics,
        }
    }

    /// Recipients currently waiting.
    pub fn queued(&self) -> usize {
        self.sender.max_capacity() - self.sender.capacity()
    }

    /// Fund `address` now if nothing else is in flight, otherwise queue it.
    pub async fn dispatch(&self, address: Address) -> Result<Dispatch, DispatchError> {
        if self.queued() == 0 {
            if let Ok(_guard) = self.lock.try_lock() {
                let funding = self.fund(address).await?;
                info!(
                    address = %address,
                    tx_hash = %funding.tx_hash,
                    tokens_tx_hash = %funding.tokens_tx_hash,
                    "Funded directly successfully"
                );
                return Ok(Dispatch::Funded(funding));
            }
        }

        self.enqueue(address)
    }

    fn enqueue(&self, address: Address) -> Result<Dispatch, DispatchError> {
        match self.sender.try_send(address) {
            Ok(()) => {
                info!(address = %address, "Added to queue successfully");
                self.metrics.set_queue_depth(self.queued());
                Ok(Dispatch::Queued)
            }
            Err(_) => {
                warn!(address = %address, "Max queue capacity reached");
                Err(DispatchError::QueueFull)
            }
        }
    }

    async fn send_native(&self, address: Address) -> eyre::Result<TxHash> {
        let sent = time::timeout(
            TRANSFER_TIMEOUT,
            self.tx_builder.transfer(address, self.payout),
        )
        .await
        .map_err(|_| eyre::eyre!("native transfer timed out after {TRANSFER_TIMEOUT:?}"))
        .and_then(|sent| sent);
        self.metrics.record_transfer("native", sent.is_ok());
        sent.inspect_err(|e| error!(address = %address, "Failed to send transaction: {e}"))
    }

    async fn send_tokens(&self, address: Address) -> eyre::Result<TxHash> {
        let sent = time::timeout(
            TRANSFER_TIMEOUT,
            self.tx_builder.transfer_tokens(address, self.tokens_payout),
        )
        .await
        .map_err(|_| eyre::eyre!("token transfer timed out after {TRANSFER_TIMEOUT:?}"))
        .and_then(|sent| sent);
        self.metrics.record_transfer("token", sent.is_ok());
        sent.inspect_err(|e| error!(address = %address, "Failed to send tokens transaction: {e}"))
    }

    /// Send the native payout, then the token payout. The first failure
    /// aborts so the caller can report it.
    ///
    /// Callers must hold the funding lock.
    async fn fund(&self, address: Address) -> eyre::Result<Funding> {
        let started = Instant::now();

        let tx_hash = self.send_native(address).await?;
        let tokens_tx_hash = self.send_tokens(address).await?;

        self.metrics.record_funding_duration(started.elapsed());

        Ok(Funding {
            tx_hash,
            tokens_tx_hash,
        })
    }

    /// Send both payouts to a queued recipient. A failed native transfer does
    /// not hold back the tokens.
    ///
    /// Returns true when both transfers were sent.
    async fn fund_queued(&self, address: Address) -> bool {
        let started = Instant::now();

        let native = self.send_native(address).await;
        let tokens = self.send_tokens(address).await;

        match (native, tokens) {
            (Ok(tx_hash), Ok(tokens_tx_hash)) => {
                self.metrics.record_funding_duration(started.elapsed());
                info!(
                    address = %address,
                    tx_hash = %tx_hash,
                    tokens_tx_hash = %tokens_tx_hash,
                    "Funded from queue successfully"
                );
                true
            }
            _ => {
                error!(address = %address, "Failed to handle transaction in the queue");
                false
            }
        }
    }

    /// Fund everyone waiting. Failures are logged and skipped.
    ///
    /// Returns the number of recipients that received both payouts.
    pub async fn drain(&self) -> usize {
        let _guard = self.lock.lock().await;
        let mut receiver = self.receiver.lock().await;
        let mut funded = 0;

        while let Ok(address) = receiver.try_recv() {
            self.metrics.set_queue_depth(self.queued());
            if self.fund_queued(address).await {
                funded += 1;
            }
        }

        funded
    }

    /// Drain the queue every `period` until the task is aborted.
    pub async fn run_consumer(self: Arc<Self>, period: Duration) {
        let mut ticker = time::interval(period);
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if self.queued() > 0 {
                self.drain().await;
            }
        }
    }
}
