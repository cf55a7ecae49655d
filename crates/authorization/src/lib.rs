//! Off-chain signing for cheques and bounties.
//!
//! Both records are EIP-712 typed data. The signature covers every field except
//! the signature itself and is checked on-chain by the chequable and bountiable
//! tokens, which also enforce nonce uniqueness and the deadline. This crate
//! produces and checks those signatures before anything is submitted.
//!
//! ```text
//! Cheque(address owner,address spender,uint256 amount,uint256 nonce,uint256 deadline)
//! Bounty(address owner,address target,bytes data,uint256 reward,uint256 nonce,uint256 deadline,uint256 energy)
//! ```

mod bounty;
mod cheque;

pub use bounty::SignedBounty;
pub use cheque::SignedCheque;

use alloy_primitives::{Address, Bytes, Signature, B256, U256};
use alloy_signer::SignerSync;
use alloy_sol_types::{Eip712Domain, SolStruct};
use std::borrow::Cow;
use thiserror::Error;

/// Typed-data structs, without signatures.
pub mod typed {
    use alloy_sol_types::sol;

    sol! {
        #[derive(Debug, PartialEq, Eq)]
        struct Cheque {
            address owner;
            address spender;
            uint256 amount;
            uint256 nonce;
            uint256 deadline;
        }

        #[derive(Debug, PartialEq, Eq)]
        struct Bounty {
            address owner;
            address target;
            bytes data;
            uint256 reward;
            uint256 nonce;
            uint256 deadline;
            uint256 energy;
        }
    }
}

/// Length of an `r || s || v` signature.
pub const SIGNATURE_LEN: usize = 65;

/// Default EIP-712 domain version of the token family.
pub const DOMAIN_VERSION: &str = "1";

#[derive(Error, Debug)]
pub enum SignatureError {
    #[error("signing failed: {0}")]
    Signing(#[from] alloy_signer::Error),

    #[error("invalid signature length: expected {SIGNATURE_LEN}, got {0}")]
    InvalidLength(usize),

    #[error("signature recovery failed: {0}")]
    Recovery(String),

    #[error("signed by {actual}, expected {expected}")]
    InvalidSigner { expected: Address, actual: Address },
}

/// EIP-712 domain of a token contract.
pub fn domain(
    name: impl Into<Cow<'static, str>>,
    version: impl Into<Cow<'static, str>>,
    chain_id: u64,
    verifying_contract: Address,
) -> Eip712Domain {
    Eip712Domain {
        name: Some(name.into()),
        version: Some(version.into()),
        chain_id: Some(U256::from(chain_id)),
        verifying_contract: Some(verifying_contract),
        salt: None,
    }
}

/// A signed EIP-712 authorization.
pub trait Authorization {
    /// The typed data the signature covers.
    type Typed: SolStruct;

    fn typed(&self) -> Self::Typed;

    /// Account that must have produced the signature.
    fn owner(&self) -> Address;

    fn signature(&self) -> &Bytes;

    /// Unix timestamp after which the authorization is rejected.
    fn deadline(&self) -> U256;

    fn signing_hash(&self, domain: &Eip712Domain) -> B256 {
        self.typed().eip712_signing_hash(domain)
    }

    fn recover_signer(&self, domain: &Eip712Domain) -> Result<Address, SignatureError> {
        let raw = self.signature();
        if raw.len() != SIGNATURE_LEN {
            return Err(SignatureError::InvalidLength(raw.len()));
        }

        let signature = Signature::try_from(raw.as_ref())
            .map_err(|e| SignatureError::Recovery(e.to_string()))?;

        signature
            .recover_address_from_prehash(&self.signing_hash(domain))
            .map_err(|e| SignatureError::Recovery(e.to_string()))
    }

    /// Check that the owner signed exactly these fields.
    fn verify(&self, domain: &Eip712Domain) -> Result<(), SignatureError> {
        let actual = self.recover_signer(domain)?;
        if actual != self.owner() {
            return Err(SignatureError::InvalidSigner {
                expected: self.owner(),
                actual,
            });
        }
        Ok(())
    }

    fn is_expired(&self, now: u64) -> bool {
        self.deadline() < U256::from(now)
    }
}

pub(crate) fn sign_typed<T: SolStruct, S: SignerSync>(
    typed: &T,
    domain: &Eip712Domain,
    signer: &S,
) -> Result<Bytes, SignatureError> {
    let signature = signer.sign_hash_sync(&typed.eip712_signing_hash(domain))?;
    Ok(Bytes::copy_from_slice(&signature.as_bytes()))
}

#[cfg(test)]
pub(crate) mod test_utils {
    use super::*;
    use alloy_signer_local::PrivateKeySigner;

    pub(crate) const OWNER_KEY: &str =
        "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    pub(crate) fn owner() -> PrivateKeySigner {
        OWNER_KEY.parse().unwrap()
    }

    pub(crate) fn test_domain() -> Eip712Domain {
        domain("Core Token", DOMAIN_VERSION, 3, Address::repeat_byte(0xaa))
    }
}
