use crate::{sign_typed, typed, Authorization, SignatureError};
use alloy_primitives::{Address, Bytes, U256};
use alloy_signer::SignerSync;
use alloy_sol_types::Eip712Domain;
use serde::{Deserialize, Serialize};

/// A cheque together with its owner's signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedCheque {
    pub owner: Address,
    pub spender: Address,
    pub amount: U256,
    pub nonce: U256,
    pub deadline: U256,
    pub signature: Bytes,
}

impl SignedCheque {
    /// Sign `cheque` as its owner.
    ///
    /// The signer is not required to match `cheque.owner`; use
    /// [`Authorization::verify`] to check that.
    pub fn sign<S: SignerSync>(
        cheque: typed::Cheque,
        domain: &Eip712Domain,
        signer: &S,
    ) -> Result<Self, SignatureError> {
        let signature = sign_typed(&cheque, domain, signer)?;

        Ok(Self {
            owner: cheque.owner,
            spender: cheque.spender,
            amount: cheque.amount,
            nonce: cheque.nonce,
            deadline: cheque.deadline,
            signature,
        })
    }

    /// ABI struct accepted by `ChequableToken.cashCheque`.
    pub fn into_abi(self) -> binding::token::Cheque {
        binding::token::Cheque {
            owner: self.owner,
            spender: self.spender,
            amount: self.amount,
            nonce: self.nonce,
            deadline: self.deadline,
            signature: self.signature,
        }
    }
}

impl Authorization for SignedCheque {
    type Typed = typed::Cheque;

    fn typed(&self) -> typed::Cheque {
        typed::Cheque {
            owner: self.owner,
            spender: self.spender,
            amount: self.amount,
            nonce: self.nonce,
            deadline: self.deadline,
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
