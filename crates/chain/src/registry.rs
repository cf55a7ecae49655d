//! Core token resolution through the key-value registry.

use alloy_primitives::{Address, B256};
use alloy_provider::Provider;
use binding::registry::IRegistry;
use sha3::{Digest, Sha3_256};
use tokio_retry::{strategy::ExponentialBackoff, Retry};
use tracing::{debug, warn};

/// Registry key the core token address is published under.
pub const CORE_TOKEN_NAME: &[u8] = b"CTN";

const ADDRESS_LEN: usize = 20;

/// `SHA3-256("CTN")`
pub fn core_token_key() -> B256 {
    B256::from_slice(&Sha3_256::digest(CORE_TOKEN_NAME))
}

/// Look up the core token address, retrying transient RPC failures.
pub async fn resolve_core_token<P>(
    provider: &P,
    registry: Address,
    owner: Address,
) -> eyre::Result<Address>
where
    P: Provider,
{
    let retry_strategy = ExponentialBackoff::from_millis(100).take(5);

    let value = Retry::spawn(retry_strategy, || async {
        IRegistry::new(registry, provider)
            .get(core_token_key())
            .from(owner)
            .call()
            .await
            .map_err(|e| {
                warn!(registry = %registry, error = %e, "Registry lookup failed, will retry");
                e
            })
    })
    .await?;

    let core_token = decode_registry_address(&value)?;
    debug!(registry = %registry, core_token = %core_token, "Resolved core token");

    Ok(core_token)
}

/// Decode an address stored in the registry.
///
/// Entries are either the hex string of the address or its raw 20 bytes.
pub fn decode_registry_address(value: &[u8]) -> eyre::Result<Address> {
    if value.is_empty() {
        eyre::bail!("registry entry is empty");
    }

    if value.len() == ADDRESS_LEN {
        return Ok(Address::from_slice(value));
    }

    let text = std::str::from_utf8(value)?;
    let address = text.trim().trim_end_matches('\0').parse()?;

    Ok(address)
}
