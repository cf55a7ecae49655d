use crate::{sign_typed, typed, Authorization, SignatureError};
use alloy_primitives::{Address, Bytes, U256};
use alloy_signer::SignerSync;
use alloy_sol_types::Eip712Domain;
use serde::{Deserialize, Serialize};

/// A bounty together with its owner's signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedBounty {
    pub owner: Address,
    pub target: Address,
    pub data: Bytes,
    pub reward: U256,
    pub nonce: U256,
    pub deadline: U256,
    /// Energy (gas) the executor must forward to `target`
    pub energy: U256,
    pub signature: Bytes,
}

impl SignedBounty {
    /// Sign `bounty` as its owner.
    pub fn sign<S: SignerSync>(
        bounty: typed::Bounty,
        domain: &Eip712Domain,
        signer: &S,
    ) -> Result<Self, SignatureError> {
        let signature = sign_typed(&bounty, domain, signer)?;

        Ok(Self {
            owner: bounty.owner,
            target: bounty.target,
            data: bounty.data,
            reward: bounty.reward,
            nonce: bounty.nonce,
            deadline: bounty.deadline,
            energy: bounty.energy,
            signature,
        })
    }

    /// ABI struct accepted by `BountiableToken.claimBounty`.
    pub fn into_abi(self) -> binding::token::Bounty {
        binding::token::Bounty {
            owner: self.owner,
            target: self.target,
            data: self.data,
            reward: self.reward,
            nonce: self.nonce,
            deadline: self.deadline,
            energy: self.energy,
            signature: self.signature,
        }
    }
}

impl Authorization for SignedBounty {
    type Typed = typed::Bounty;

    fn typed(&self) -> typed::Bounty {
        typed::Bounty {
            owner: self.owner,
            target: self.target,
            data: self.data.clone(),
            reward: self.reward,
            nonce: self.nonce,
            deadline: self.deadline,
            energy: self.energy,
        }
    }

    fn owner(&self) -> Address {
        self.owner
    }

    fn signature(&self) -> &Bytes {
        &self.signature
    }

    fn deadline(&self) -> U256 {
        self.deadline
    }
}
