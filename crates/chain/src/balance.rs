use crate::TxBuild;
use alloy_primitives::U256;
use alloy_provider::Provider;
use binding::token::ICoreToken;
use tracing::debug;

/// Holdings of the funding account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaucetBalances {
    /// Native coin, in wei
    pub native: U256,
    /// Core token, in base units
    pub tokens: U256,
}

impl FaucetBalances {
    /// Full payouts the account can still afford. A zero amount never limits.
    pub fn payouts_left(&self, payout: U256, tokens_payout: U256) -> U256 {
        [(self.native, payout), (self.tokens, tokens_payout)]
            .into_iter()
            .filter(|(_, amount)| !amount.is_zero())
            .map(|(held, amount)| held / amount)
            .min()
            .unwrap_or(U256::MAX)
    }
}

impl<P> TxBuild<P>
where
    P: Provider + Clone,
{
    /// Read the funding account's native and core token balances.
    pub async fn faucet_balances(&self) -> eyre::Result<FaucetBalances> {
        let account = self.account();
        debug!(account = %account, core_token = %self.core_token(), "Querying faucet balances");

        let native = self.provider().get_balance(account).await?;
        let tokens = ICoreToken::new(self.core_token(), self.provider())
            .balanceOf(account)
            .call()
            .await?;

        Ok(FaucetBalances { native, tokens })
    }
}
