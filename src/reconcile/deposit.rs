//! Deposit reconciliation.

use crate::accessor::{FundAccessor, FundReader};
use crate::domain::{ids, ChainId, DepositRecord, EventMeta};
use crate::ledger::{fund_update, position};
use crate::registry;
use crate::store::Repository;
use alloy_primitives::{Address, U256};
use tracing::{debug, info, warn};

use super::{shares_for_amount, ReconcileError};

/// Apply a deposit event: mint shares per the on-chain formula, advance the
/// account's position chain and the fund's update chain, then add the step
/// onto the fund and chain aggregates.
pub async fn handle(
    repo: &Repository,
    accessor: &dyn FundAccessor,
    chain_id: &ChainId,
    meta: &EventMeta,
    beneficiary: Address,
    amount: U256,
) -> Result<(), ReconcileError> {
    let fund_id = ids::address_id(&meta.fund);
    let Some(mut fund) = repo.get_fund(&fund_id).await? else {
        warn!(fund = %fund_id, tx = %ids::tx_hash_id(&meta.tx_hash), "Deposit for unregistered fund dropped");
        return Ok(());
    };

    let account_id = registry::get_or_create_account(repo, &beneficiary).await?;
    let transaction = registry::get_or_create_transaction(repo, meta).await?;
    let reader = FundReader::new(accessor, meta.fund);

    let total_assets = reader.total_assets().await;
    let total_supply = reader.total_supply().await;
    let price_per_share = reader.price_per_share().await;
    let shares_minted = shares_for_amount(amount, total_supply, total_assets);

    // The immutable record doubles as the replay guard: if it already
    // exists this event was fully applied before.
    let record = DepositRecord {
        id: ids::fund_event_record_id(&meta.fund, &meta.tx_hash),
        fund: fund_id.clone(),
        account: account_id,
        amount,
        shares_minted,
        timestamp: meta.timestamp,
        transaction: transaction.id(),
        fund_update: ids::fund_update_id(&meta.fund, &meta.tx_hash, meta.tx_index),
    };
    if !repo.insert_deposit_record(&record).await? {
        debug!(deposit = %record.id, "Duplicate deposit event, skipping");
        return Ok(());
    }

    position::deposit(
        repo,
        &reader,
        &beneficiary,
        &fund,
        &transaction,
        amount,
        shares_minted,
    )
    .await?;

    let mut chain = registry::get_or_create_chain(repo, chain_id).await?;
    chain.total_value_locked = chain.total_value_locked + amount;
    repo.upsert_chain(&chain).await?;

    let update = if fund.latest_update.is_none() {
        info!(fund = %fund_id, "First deposit for fund");
        fund_update::first_deposit(
            repo,
            &fund,
            &transaction,
            amount,
            shares_minted,
            price_per_share,
            total_assets,
        )
        .await?
    } else {
        fund_update::deposit(
            repo,
            &fund,
            &transaction,
            amount,
            shares_minted,
            price_per_share,
            total_assets,
        )
        .await?
    };

    fund.latest_update = Some(update.id);
    fund.balance_tokens = fund.balance_tokens + amount;
    fund.balance_tokens_idle = fund.balance_tokens_idle + amount;
    fund.shares_supply = fund.shares_supply + shares_minted;
    repo.upsert_fund(&fund).await?;

    Ok(())
}
