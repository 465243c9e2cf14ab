//! Immutable per-event records: deposits, withdrawals, fee harvests and
//! share transfers. Each is created exactly once per its dedup key and
//! never mutated.

use alloy_primitives::U256;

/// A deposit into a fund, keyed `fund-txHash`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositRecord {
    pub id: String,
    pub fund: String,
    pub account: String,
    pub amount: U256,
    pub shares_minted: U256,
    pub timestamp: i64,
    pub transaction: String,
    /// FundUpdate of the same transaction.
    pub fund_update: String,
}

/// A withdrawal from a fund, keyed `fund-txHash`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawalRecord {
    pub id: String,
    pub fund: String,
    pub account: String,
    pub amount: U256,
    pub withdrawal_fee: U256,
    pub shares_burnt: U256,
    pub timestamp: i64,
    pub transaction: String,
    pub fund_update: String,
}

/// A fee-harvest step, keyed `fund-txHash`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HardWorkRecord {
    pub id: String,
    pub fund: String,
    pub total_value_locked: U256,
    pub price_per_share: U256,
    pub timestamp: i64,
    pub transaction: String,
}

/// A peer-to-peer share movement, keyed `from-to-txId`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRecord {
    pub id: String,
    pub from: String,
    pub to: String,
    pub fund: String,
    pub underlying_token: String,
    pub underlying_amount: U256,
    pub share_token: String,
    pub share_amount: U256,
    pub timestamp: i64,
    pub block_number: u64,
    pub transaction: String,
}
