//! Per-event reconciliation algorithms.
//!
//! One algorithm per event kind, each invoked exactly once per incoming
//! event, strictly sequentially. Algorithms read the registry and accessor,
//! mutate positions and update chains through the ledger modules, and write
//! through the store. No failure here is fatal: accessor reads degrade to
//! defaults, missing prior state is a logged inconsistency, and replayed
//! events resolve to no-ops.

pub mod deposit;
pub mod fee;
pub mod hardwork;
pub mod transfer;
pub mod withdraw;

use crate::accessor::FundAccessor;
use crate::domain::math::mul_div;
use crate::domain::{ChainId, FundEvent};
use crate::store::Repository;
use alloy_primitives::U256;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Store(#[from] sqlx::Error),
}

/// Shares minted for a deposit (and symmetrically, shares burnt for a
/// withdrawal): `amount * totalSupply / totalAssets`, truncating, with the
/// bootstrap case `totalAssets == 0` minting 1:1.
///
/// This must match on-chain rounding exactly.
pub fn shares_for_amount(amount: U256, total_supply: U256, total_assets: U256) -> U256 {
    if total_assets.is_zero() {
        amount
    } else {
        mul_div(amount, total_supply, total_assets)
    }
}

/// Underlying-token value of a share amount:
/// `shareAmount * totalAssets / totalSupply`, truncating; zero when the
/// supply is zero.
pub fn underlying_for_shares(share_amount: U256, total_assets: U256, total_supply: U256) -> U256 {
    if total_supply.is_zero() {
        U256::ZERO
    } else {
        mul_div(share_amount, total_assets, total_supply)
    }
}

/// Apply one event to the ledger.
pub async fn process_event(
    repo: &Repository,
    accessor: &dyn FundAccessor,
    chain_id: &ChainId,
    event: &FundEvent,
) -> Result<(), ReconcileError> {
    match event {
        FundEvent::FundRegistered { meta } => {
            crate::registry::register_fund(repo, accessor, chain_id, meta.fund).await?;
            Ok(())
        }
        FundEvent::Deposit {
            meta,
            beneficiary,
            amount,
        } => deposit::handle(repo, accessor, chain_id, meta, *beneficiary, *amount).await,
        FundEvent::Withdraw {
            meta,
            beneficiary,
            amount,
            fee,
        } => withdraw::handle(repo, accessor, chain_id, meta, *beneficiary, *amount, *fee).await,
        FundEvent::Transfer {
            meta,
            from,
            to,
            value,
        } => transfer::handle(repo, accessor, meta, *from, *to, *value).await,
        FundEvent::HardWork {
            meta,
            total_value_locked,
            price_per_share,
        } => hardwork::handle(repo, meta, *total_value_locked, *price_per_share).await,
        FundEvent::WithdrawalFeeUpdated {
            meta,
            withdrawal_fee_bps,
        } => fee::handle(repo, accessor, meta, *withdrawal_fee_bps).await,
    }
}
