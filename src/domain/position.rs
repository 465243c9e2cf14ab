//! Per-(account, fund) position state and its ordered update chain.

use crate::domain::ids;
use alloy_primitives::{Address, U256};

/// Current cumulative position of one account in one fund.
///
/// Created on first deposit or transfer-in; every subsequent event for the
/// pair mutates the balances and advances `latest_update`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountFundPosition {
    pub account: Address,
    pub fund: Address,
    pub underlying_token: String,
    pub share_token: String,
    /// Transaction that first created the position.
    pub transaction: String,
    pub balance_shares: U256,
    pub balance_tokens: U256,
    /// Value of the position at the latest step: shares priced through the
    /// fund's price-per-share.
    pub balance_position: U256,
    pub balance_profit: U256,
    /// Id of the newest update in this position's chain.
    pub latest_update: Option<String>,
}

impl AccountFundPosition {
    pub fn id(&self) -> String {
        ids::position_id(&self.account, &self.fund)
    }
}

/// One step in a position's append-only update chain.
///
/// `order` starts at 0 and increments by exactly one per step; the id
/// formula `account-fund-order` makes replays resolve to the same slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountFundPositionUpdate {
    pub id: String,
    pub order: u64,
    pub account: String,
    pub account_fund_position: String,
    pub transaction: String,
    pub timestamp: i64,
    pub block_number: u64,
    /// Step deltas. Sent/received pairs are mutually exclusive: an update
    /// describes one side of at most one transfer.
    pub deposits: U256,
    pub withdrawals: U256,
    pub shares_minted: U256,
    pub shares_burnt: U256,
    pub shares_sent: U256,
    pub shares_received: U256,
    pub tokens_sent: U256,
    pub tokens_received: U256,
    /// Resulting balances, re-read from the accessor rather than derived.
    pub balance_shares: U256,
    pub balance_position: U256,
    /// FundUpdate of the same transaction.
    pub fund_update: String,
}
