//! Fund and chain-wide aggregate entities.

use crate::domain::ids;
use alloy_primitives::{Address, U256};

/// A tracked tokenized-vault contract and its running aggregates.
///
/// Created once when the fund is registered; mutated by every deposit,
/// withdrawal and fee update afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fund {
    pub address: Address,
    pub symbol: String,
    pub name: String,
    /// Token id of the deposited asset.
    pub underlying_token: String,
    /// Token id of the fund's own share token (the fund contract itself).
    pub share_token: String,
    /// Cumulative underlying tokens held, across idle and invested.
    pub balance_tokens: U256,
    pub balance_tokens_idle: U256,
    pub balance_tokens_invested: U256,
    pub shares_supply: U256,
    pub withdrawal_fee_bps: u32,
    /// Id of the newest FundUpdate; None until the first deposit.
    pub latest_update: Option<String>,
}

impl Fund {
    pub fn id(&self) -> String {
        ids::address_id(&self.address)
    }
}

/// Chain-wide aggregate: one row per chain id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    pub id: crate::domain::ChainId,
    pub total_value_locked: U256,
    pub funds_count: u64,
}

/// An ordered snapshot of a fund's aggregate state at one transaction.
///
/// Forms a chain through `Fund::latest_update`; the pointer only ever moves
/// forward to a newly created update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundUpdate {
    pub id: String,
    pub fund: String,
    pub transaction: String,
    pub timestamp: i64,
    pub block_number: u64,
    /// Step deltas: what this transaction moved.
    pub tokens_deposited: U256,
    pub tokens_withdrawn: U256,
    pub shares_minted: U256,
    pub shares_burnt: U256,
    /// Price and fee state carried on the snapshot.
    pub price_per_share: U256,
    pub total_fees: U256,
    pub withdrawal_fees: U256,
    /// Total value locked as freshly observed for this step.
    pub balance_position: U256,
    /// `max(0, balance_position - prior cumulative token balance)`.
    pub returns_generated: U256,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_fund_id_is_lowercase_address() {
        let fund = Fund {
            address: Address::from_str("0xAbCd000000000000000000000000000000001234").unwrap(),
            symbol: "vTEST".to_string(),
            name: "Test Fund".to_string(),
            underlying_token: String::new(),
            share_token: String::new(),
            balance_tokens: U256::ZERO,
            balance_tokens_idle: U256::ZERO,
            balance_tokens_invested: U256::ZERO,
            shares_supply: U256::ZERO,
            withdrawal_fee_bps: 0,
            latest_update: None,
        };
        assert_eq!(fund.id(), "0xabcd000000000000000000000000000000001234");
    }
}
