//! Chain access for the faucet.
//!
//! [`TxBuilder`] is the seam between the HTTP layer and the node: it knows the
//! funding account and how to send native coin and core tokens from it.
//! [`TxBuild`] is the provider-backed implementation.

mod balance;
pub mod registry;
mod transaction;
mod util;

use alloy_primitives::{Address, TxHash, U256};
use async_trait::async_trait;

pub use balance::FaucetBalances;
pub use transaction::{connect, TxBuild};
pub use util::{is_valid_address, parse_checksummed, to_wei};

/// Sends payouts from the faucet account.
#[async_trait]
pub trait TxBuilder: Send + Sync {
    /// The funding account.
    fn sender(&self) -> Address;

    /// Chain the transactions are signed for.
    fn chain_id(&self) -> u64;

    /// Transfer `value` wei of native coin to `to`.
    async fn transfer(&self, to: Address, value: U256) -> eyre::Result<TxHash>;

    /// Transfer `value` base units of the core token to `to`.
    async fn transfer_tokens(&self, to: Address, value: U256) -> eyre::Result<TxHash>;
}
