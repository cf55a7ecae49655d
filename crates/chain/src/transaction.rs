use crate::{registry::resolve_core_token, TxBuilder};
use alloy_network::TransactionBuilder;
use alloy_primitives::{Address, TxHash, U256};
use alloy_provider::Provider;
use alloy_rpc_types::TransactionRequest;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use binding::token::ICoreToken;
use tracing::{debug, info};

/// Gas limit of a plain value transfer.
pub const NATIVE_TRANSFER_GAS: u64 = 21_000;

/// Provider-backed [`TxBuilder`].
///
/// The provider must carry a wallet for [`TxBuild::sender`]; nonce and fee
/// fields are filled by the provider's fillers.
#[derive(Debug, Clone)]
pub struct TxBuild<P> {
    provider: P,
    chain_id: u64,
    from: Address,
    core_token: Address,
}

impl<P> TxBuild<P>
where
    P: Provider + Clone,
{
    pub const fn new(provider: P, chain_id: u64, from: Address, core_token: Address) -> Self {
        Self {
            provider,
            chain_id,
            from,
            core_token,
        }
    }

    /// The funding account.
    pub const fn account(&self) -> Address {
        self.from
    }

    /// Address of the core token payouts are made in.
    pub const fn core_token(&self) -> Address {
        self.core_token
    }

    pub const fn provider(&self) -> &P {
        &self.provider
    }
}

/// Dial the node, read the chain id and resolve the core token through the registry.
pub async fn connect(
    rpc_url: &str,
    signer: PrivateKeySigner,
    registry: Address,
) -> eyre::Result<TxBuild<impl Provider + Clone + 'static>> {
    let from = signer.address();
    let provider = client::create_wallet_provider(rpc_url, signer)?;

    let chain_id = client::chain_id(&provider).await?;
    let core_token = resolve_core_token(&provider, registry, from)
        .await
        .map_err(|e| eyre::eyre!("cannot create core token instance: {e}"))?;

    info!(
        chain_id,
        sender = %from,
        core_token = %core_token,
        "Connected to chain"
    );

    Ok(TxBuild::new(provider, chain_id, from, core_token))
}

#[async_trait]
impl<P> TxBuilder for TxBuild<P>
where
    P: Provider + Clone + 'static,
{
    fn sender(&self) -> Address {
        self.from
    }

    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn transfer(&self, to: Address, value: U256) -> eyre::Result<TxHash> {
        let tx = TransactionRequest::default()
            .with_from(self.from)
            .with_to(to)
            .with_value(value)
            .with_gas_limit(NATIVE_TRANSFER_GAS)
            .with_chain_id(self.chain_id);

        let pending = self.provider.send_transaction(tx).await?;
        let tx_hash = *pending.tx_hash();
        debug!(to = %to, value = %value, tx_hash = %tx_hash, "Sent native transfer");

        Ok(tx_hash)
    }

    async fn transfer_tokens(&self, to: Address, value: U256) -> eyre::Result<TxHash> {
        let token = ICoreToken::new(self.core_token, &self.provider);

        let pending = token.transfer(to, value).from(self.from).send().await?;
        let tx_hash = *pending.tx_hash();
        debug!(to = %to, value = %value, tx_hash = %tx_hash, "Sent token transfer");

        Ok(tx_hash)
    }
}
