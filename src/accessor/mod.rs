//! Read-only access to fund contract state.
//!
//! Every query may fail (a revert, a network fault); the engine never treats
//! that as fatal. [`FundReader`] resolves each failure to the documented
//! default so reconciliation always makes progress.

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

pub mod mock;
pub mod rpc;

pub use mock::MockAccessor;
pub use rpc::RpcAccessor;

/// Default ERC20 decimals when the contract read fails.
pub const DEFAULT_DECIMALS: u8 = 18;

/// Read-only, possibly-failing queries against fund and token contracts.
#[async_trait]
pub trait FundAccessor: Send + Sync + std::fmt::Debug {
    /// Total underlying assets held by the fund.
    async fn total_value_locked(&self, fund: Address) -> Result<U256, AccessorError>;

    /// Total share supply of the fund.
    async fn total_supply(&self, fund: Address) -> Result<U256, AccessorError>;

    /// Exchange rate from one share unit to underlying units.
    async fn price_per_share(&self, fund: Address) -> Result<U256, AccessorError>;

    /// ERC20 decimals of a token (funds are their own share token).
    async fn decimals(&self, token: Address) -> Result<u8, AccessorError>;

    /// Share balance of an account in the fund.
    async fn balance_of(&self, fund: Address, account: Address) -> Result<U256, AccessorError>;

    async fn symbol(&self, token: Address) -> Result<String, AccessorError>;

    async fn name(&self, token: Address) -> Result<String, AccessorError>;

    /// The fund's deposited-asset token contract.
    async fn underlying(&self, fund: Address) -> Result<Address, AccessorError>;

    /// Withdrawal fee in basis points.
    async fn withdrawal_fee_bps(&self, fund: Address) -> Result<u32, AccessorError>;
}

#[derive(Debug, Clone, Error)]
pub enum AccessorError {
    #[error("network error: {0}")]
    Network(String),
    #[error("http error {status}: {message}")]
    Http { status: u16, message: String },
    #[error("call reverted: {0}")]
    Revert(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("{0}")]
    Other(String),
}

/// Accessor reads scoped to one fund, with per-call default fallbacks.
///
/// Reconciliation algorithms read through this wrapper so a reverted call
/// degrades to its documented default instead of propagating.
pub struct FundReader<'a> {
    accessor: &'a dyn FundAccessor,
    fund: Address,
}

impl<'a> FundReader<'a> {
    pub fn new(accessor: &'a dyn FundAccessor, fund: Address) -> Self {
        Self { accessor, fund }
    }

    pub fn fund(&self) -> Address {
        self.fund
    }

    /// Total assets, default 0.
    pub async fn total_assets(&self) -> U256 {
        match self.accessor.total_value_locked(self.fund).await {
            Ok(value) => value,
            Err(e) => {
                debug!(fund = %self.fund, error = %e, "totalValueLocked read failed, defaulting to 0");
                U256::ZERO
            }
        }
    }

    /// Total share supply, default 0.
    pub async fn total_supply(&self) -> U256 {
        match self.accessor.total_supply(self.fund).await {
            Ok(value) => value,
            Err(e) => {
                debug!(fund = %self.fund, error = %e, "totalSupply read failed, defaulting to 0");
                U256::ZERO
            }
        }
    }

    /// Price per share, default 0.
    pub async fn price_per_share(&self) -> U256 {
        match self.accessor.price_per_share(self.fund).await {
            Ok(value) => value,
            Err(e) => {
                debug!(fund = %self.fund, error = %e, "pricePerShare read failed, defaulting to 0");
                U256::ZERO
            }
        }
    }

    /// Share-token decimals, default 18.
    pub async fn decimals(&self) -> u8 {
        match self.accessor.decimals(self.fund).await {
            Ok(value) => value,
            Err(e) => {
                debug!(fund = %self.fund, error = %e, "decimals read failed, defaulting to 18");
                DEFAULT_DECIMALS
            }
        }
    }

    /// Share balance of `account`, default 0.
    pub async fn balance_of(&self, account: Address) -> U256 {
        match self.accessor.balance_of(self.fund, account).await {
            Ok(value) => value,
            Err(e) => {
                debug!(fund = %self.fund, %account, error = %e, "balanceOf read failed, defaulting to 0");
                U256::ZERO
            }
        }
    }

    /// Current value of an account's stake:
    /// `balanceOf(account) * pricePerShare / 10^decimals`.
    pub async fn balance_position(&self, account: Address) -> U256 {
        let balance_shares = self.balance_of(account).await;
        let price_per_share = self.price_per_share().await;
        let divisor = crate::domain::math::pow10(self.decimals().await);
        crate::domain::math::mul_div(balance_shares, price_per_share, divisor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn fund_addr() -> Address {
        Address::from_str("0x2222222222222222222222222222222222222222").unwrap()
    }

    #[tokio::test]
    async fn test_reader_defaults_on_failure() {
        let mock = MockAccessor::new().failing();
        let reader = FundReader::new(&mock, fund_addr());
        assert_eq!(reader.total_assets().await, U256::ZERO);
        assert_eq!(reader.total_supply().await, U256::ZERO);
        assert_eq!(reader.price_per_share().await, U256::ZERO);
        assert_eq!(reader.decimals().await, DEFAULT_DECIMALS);
    }

    #[tokio::test]
    async fn test_balance_position_prices_shares() {
        let account = Address::from_str("0x1111111111111111111111111111111111111111").unwrap();
        let mock = MockAccessor::new()
            .with_decimals(2)
            .with_price_per_share(U256::from(150u64))
            .with_balance(account, U256::from(10u64));
        let reader = FundReader::new(&mock, fund_addr());
        // 10 shares * 150 / 10^2 = 15
        assert_eq!(reader.balance_position(account).await, U256::from(15u64));
    }
}
