//! Mock accessor for testing without a node.

use super::{AccessorError, FundAccessor};
use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Mock accessor returning predefined values. Balances can be adjusted
/// between events to mimic the chain moving underneath the engine.
#[derive(Debug, Default)]
pub struct MockAccessor {
    total_value_locked: Mutex<U256>,
    total_supply: Mutex<U256>,
    price_per_share: Mutex<U256>,
    decimals: Mutex<Option<u8>>,
    balances: Mutex<HashMap<Address, U256>>,
    symbol: Option<String>,
    name: Option<String>,
    underlying: Option<Address>,
    withdrawal_fee_bps: Option<u32>,
    fail_all: bool,
}

impl MockAccessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail, exercising the default-fallback paths.
    pub fn failing(mut self) -> Self {
        self.fail_all = true;
        self
    }

    pub fn with_total_value_locked(self, value: U256) -> Self {
        *self.total_value_locked.lock().unwrap() = value;
        self
    }

    pub fn with_total_supply(self, value: U256) -> Self {
        *self.total_supply.lock().unwrap() = value;
        self
    }

    pub fn with_price_per_share(self, value: U256) -> Self {
        *self.price_per_share.lock().unwrap() = value;
        self
    }

    pub fn with_decimals(self, decimals: u8) -> Self {
        *self.decimals.lock().unwrap() = Some(decimals);
        self
    }

    pub fn with_balance(self, account: Address, shares: U256) -> Self {
        self.balances.lock().unwrap().insert(account, shares);
        self
    }

    pub fn with_symbol(mut self, symbol: &str) -> Self {
        self.symbol = Some(symbol.to_string());
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_underlying(mut self, token: Address) -> Self {
        self.underlying = Some(token);
        self
    }

    pub fn with_withdrawal_fee_bps(mut self, bps: u32) -> Self {
        self.withdrawal_fee_bps = Some(bps);
        self
    }

    /// Mutate chain state mid-test.
    pub fn set_total_value_locked(&self, value: U256) {
        *self.total_value_locked.lock().unwrap() = value;
    }

    pub fn set_total_supply(&self, value: U256) {
        *self.total_supply.lock().unwrap() = value;
    }

    pub fn set_balance(&self, account: Address, shares: U256) {
        self.balances.lock().unwrap().insert(account, shares);
    }

    fn reverted<T>(&self) -> Result<T, AccessorError> {
        Err(AccessorError::Revert("mock revert".to_string()))
    }
}

#[async_trait]
impl FundAccessor for MockAccessor {
    async fn total_value_locked(&self, _fund: Address) -> Result<U256, AccessorError> {
        if self.fail_all {
            return self.reverted();
        }
        Ok(*self.total_value_locked.lock().unwrap())
    }

    async fn total_supply(&self, _fund: Address) -> Result<U256, AccessorError> {
        if self.fail_all {
            return self.reverted();
        }
        Ok(*self.total_supply.lock().unwrap())
    }

    async fn price_per_share(&self, _fund: Address) -> Result<U256, AccessorError> {
        if self.fail_all {
            return self.reverted();
        }
        Ok(*self.price_per_share.lock().unwrap())
    }

    async fn decimals(&self, _token: Address) -> Result<u8, AccessorError> {
        if self.fail_all {
            return self.reverted();
        }
        self.decimals
            .lock()
            .unwrap()
            .ok_or_else(|| AccessorError::Revert("decimals unset".to_string()))
    }

    async fn balance_of(&self, _fund: Address, account: Address) -> Result<U256, AccessorError> {
        if self.fail_all {
            return self.reverted();
        }
        Ok(self
            .balances
            .lock()
            .unwrap()
            .get(&account)
            .copied()
            .unwrap_or(U256::ZERO))
    }

    async fn symbol(&self, _token: Address) -> Result<String, AccessorError> {
        if self.fail_all {
            return self.reverted();
        }
        self.symbol
            .clone()
            .ok_or_else(|| AccessorError::Revert("symbol unset".to_string()))
    }

    async fn name(&self, _token: Address) -> Result<String, AccessorError> {
        if self.fail_all {
            return self.reverted();
        }
        self.name
            .clone()
            .ok_or_else(|| AccessorError::Revert("name unset".to_string()))
    }

    async fn underlying(&self, _fund: Address) -> Result<Address, AccessorError> {
        if self.fail_all {
            return self.reverted();
        }
        self.underlying
            .ok_or_else(|| AccessorError::Revert("underlying unset".to_string()))
    }

    async fn withdrawal_fee_bps(&self, _fund: Address) -> Result<u32, AccessorError> {
        if self.fail_all {
            return self.reverted();
        }
        self.withdrawal_fee_bps
            .ok_or_else(|| AccessorError::Revert("withdrawalFee unset".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[tokio::test]
    async fn test_mock_returns_configured_values() {
        let account = Address::from_str("0x1111111111111111111111111111111111111111").unwrap();
        let fund = Address::from_str("0x2222222222222222222222222222222222222222").unwrap();
        let mock = MockAccessor::new()
            .with_total_supply(U256::from(500u64))
            .with_balance(account, U256::from(42u64));

        assert_eq!(mock.total_supply(fund).await.unwrap(), U256::from(500u64));
        assert_eq!(
            mock.balance_of(fund, account).await.unwrap(),
            U256::from(42u64)
        );
    }

    #[tokio::test]
    async fn test_mock_unknown_balance_is_zero() {
        let account = Address::from_str("0x1111111111111111111111111111111111111111").unwrap();
        let fund = Address::from_str("0x2222222222222222222222222222222222222222").unwrap();
        let mock = MockAccessor::new();
        assert_eq!(mock.balance_of(fund, account).await.unwrap(), U256::ZERO);
    }

    #[tokio::test]
    async fn test_mock_failing_reverts_everything() {
        let fund = Address::from_str("0x2222222222222222222222222222222222222222").unwrap();
        let mock = MockAccessor::new().failing();
        assert!(mock.total_supply(fund).await.is_err());
        assert!(mock.symbol(fund).await.is_err());
    }
}
