//! Fund-level update chain: one aggregate snapshot per transaction that
//! affects the fund.
//!
//! Snapshots are keyed `fund-txHash-txIndex` and copy cumulative fee totals
//! forward from the previous snapshot. `returns_generated` compares the
//! freshly observed total value locked against the fund's cumulative token
//! balance *before* the caller applies this step's mutation, clamped at
//! zero.
//!
//! Only `withdraw` mutates the fund's running totals in here; the deposit
//! path leaves that to the caller so the "record snapshot, then mutate
//! aggregates" ordering stays explicit and auditable.

use crate::domain::math::clamped_sub;
use crate::domain::{ids, Fund, FundUpdate, TransactionRecord};
use crate::store::Repository;
use alloy_primitives::U256;
use tracing::{debug, warn};

#[allow(clippy::too_many_arguments)]
fn build(
    id: String,
    fund: &Fund,
    transaction: &TransactionRecord,
    tokens_deposited: U256,
    tokens_withdrawn: U256,
    shares_minted: U256,
    shares_burnt: U256,
    price_per_share: U256,
    total_fees: U256,
    withdrawal_fees: U256,
    balance_position: U256,
) -> FundUpdate {
    FundUpdate {
        id,
        fund: fund.id(),
        transaction: transaction.id(),
        timestamp: transaction.timestamp,
        block_number: transaction.block_number,
        tokens_deposited,
        tokens_withdrawn,
        shares_minted,
        shares_burnt,
        price_per_share,
        total_fees,
        withdrawal_fees,
        balance_position,
        returns_generated: clamped_sub(balance_position, fund.balance_tokens),
    }
}

/// Cumulative fee totals copied forward from the previous snapshot.
async fn carried_fees(
    repo: &Repository,
    fund: &Fund,
    tx_id: &str,
) -> Result<(U256, U256), sqlx::Error> {
    let latest_id = match fund.latest_update.as_deref() {
        Some(id) => id,
        None => return Ok((U256::ZERO, U256::ZERO)),
    };
    match repo.get_fund_update(latest_id).await? {
        Some(latest) => Ok((latest.total_fees, latest.withdrawal_fees)),
        None => {
            warn!(
                fund = %fund.id(),
                latest_update = latest_id,
                tx = tx_id,
                "Inconsistency: latest fund update not found, carrying zero fees"
            );
            Ok((U256::ZERO, U256::ZERO))
        }
    }
}

/// Snapshot for the very first deposit of a fund.
pub async fn first_deposit(
    repo: &Repository,
    fund: &Fund,
    transaction: &TransactionRecord,
    deposited_amount: U256,
    shares_minted: U256,
    price_per_share: U256,
    balance_position: U256,
) -> Result<FundUpdate, sqlx::Error> {
    let id = ids::fund_update_id(&fund.address, &transaction.hash, transaction.index);
    if let Some(existing) = repo.get_fund_update(&id).await? {
        debug!(update = %id, "Fund update already recorded, keeping existing");
        return Ok(existing);
    }

    let update = build(
        id,
        fund,
        transaction,
        deposited_amount,
        U256::ZERO,
        shares_minted,
        U256::ZERO,
        price_per_share,
        U256::ZERO,
        U256::ZERO,
        balance_position,
    );
    repo.insert_fund_update(&update).await?;
    Ok(update)
}

/// Snapshot for a subsequent deposit.
pub async fn deposit(
    repo: &Repository,
    fund: &Fund,
    transaction: &TransactionRecord,
    deposited_amount: U256,
    shares_minted: U256,
    price_per_share: U256,
    balance_position: U256,
) -> Result<FundUpdate, sqlx::Error> {
    let id = ids::fund_update_id(&fund.address, &transaction.hash, transaction.index);
    if let Some(existing) = repo.get_fund_update(&id).await? {
        debug!(update = %id, "Fund update already recorded, keeping existing");
        return Ok(existing);
    }

    let (total_fees, withdrawal_fees) = carried_fees(repo, fund, &transaction.id()).await?;
    let update = build(
        id,
        fund,
        transaction,
        deposited_amount,
        U256::ZERO,
        shares_minted,
        U256::ZERO,
        price_per_share,
        total_fees,
        withdrawal_fees,
        balance_position,
    );
    repo.insert_fund_update(&update).await?;
    Ok(update)
}

/// Snapshot for a withdrawal. Unlike the deposit path this also applies the
/// fund-side mutation: share supply and token balances decrement (clamped at
/// zero) and `latest_update` advances. A replayed transaction returns the
/// existing snapshot without re-mutating the fund.
#[allow(clippy::too_many_arguments)]
pub async fn withdraw(
    repo: &Repository,
    fund: &mut Fund,
    latest: &FundUpdate,
    price_per_share: U256,
    withdrawn_amount: U256,
    shares_burnt: U256,
    transaction: &TransactionRecord,
    balance_position: U256,
) -> Result<FundUpdate, sqlx::Error> {
    let id = ids::fund_update_id(&fund.address, &transaction.hash, transaction.index);
    if let Some(existing) = repo.get_fund_update(&id).await? {
        debug!(update = %id, "Fund update already recorded, skipping fund mutation");
        return Ok(existing);
    }

    let update = build(
        id,
        fund,
        transaction,
        U256::ZERO,
        withdrawn_amount,
        U256::ZERO,
        shares_burnt,
        price_per_share,
        latest.total_fees,
        latest.withdrawal_fees,
        balance_position,
    );
    repo.insert_fund_update(&update).await?;

    fund.shares_supply = clamped_sub(fund.shares_supply, shares_burnt);
    fund.balance_tokens = clamped_sub(fund.balance_tokens, withdrawn_amount);
    fund.balance_tokens_idle = clamped_sub(fund.balance_tokens_idle, withdrawn_amount);
    fund.latest_update = Some(update.id.clone());
    repo.upsert_fund(fund).await?;

    Ok(update)
}

/// Snapshot for a fee harvest: new price and total value locked, no
/// share-supply or token-balance movement. The caller advances
/// `fund.latest_update`.
pub async fn hardwork(
    repo: &Repository,
    fund: &Fund,
    latest: &FundUpdate,
    price_per_share: U256,
    total_value_locked: U256,
    transaction: &TransactionRecord,
) -> Result<FundUpdate, sqlx::Error> {
    let id = ids::fund_update_id(&fund.address, &transaction.hash, transaction.index);
    if let Some(existing) = repo.get_fund_update(&id).await? {
        debug!(update = %id, "Fund update already recorded, keeping existing");
        return Ok(existing);
    }

    let update = build(
        id,
        fund,
        transaction,
        U256::ZERO,
        U256::ZERO,
        U256::ZERO,
        U256::ZERO,
        price_per_share,
        latest.total_fees,
        latest.withdrawal_fees,
        total_value_locked,
    );
    repo.insert_fund_update(&update).await?;
    Ok(update)
}

/// Snapshot for a withdrawal-fee change: carries the previous price and fee
/// totals; the fee itself lives on the fund entity. The caller advances
/// `fund.latest_update`.
pub async fn withdrawal_fee_updated(
    repo: &Repository,
    fund: &Fund,
    latest: &FundUpdate,
    balance_position: U256,
    transaction: &TransactionRecord,
) -> Result<FundUpdate, sqlx::Error> {
    let id = ids::fund_update_id(&fund.address, &transaction.hash, transaction.index);
    if let Some(existing) = repo.get_fund_update(&id).await? {
        debug!(update = %id, "Fund update already recorded, keeping existing");
        return Ok(existing);
    }

    let update = build(
        id,
        fund,
        transaction,
        U256::ZERO,
        U256::ZERO,
        U256::ZERO,
        U256::ZERO,
        latest.price_per_share,
        latest.total_fees,
        latest.withdrawal_fees,
        balance_position,
    );
    repo.insert_fund_update(&update).await?;
    Ok(update)
}
