//! Withdrawal reconciliation.
//!
//! The position-side and fund-side mutations are independent: either can be
//! skipped (with a diagnostic) when its prior state is missing while the
//! other still applies.

use crate::accessor::{FundAccessor, FundReader};
use crate::domain::math::clamped_sub;
use crate::domain::{ids, ChainId, EventMeta, WithdrawalRecord};
use crate::ledger::{fund_update, position};
use crate::registry;
use crate::store::Repository;
use alloy_primitives::{Address, U256};
use tracing::{debug, warn};

use super::{shares_for_amount, ReconcileError};

pub async fn handle(
    repo: &Repository,
    accessor: &dyn FundAccessor,
    chain_id: &ChainId,
    meta: &EventMeta,
    beneficiary: Address,
    amount: U256,
    fee: U256,
) -> Result<(), ReconcileError> {
    let fund_id = ids::address_id(&meta.fund);
    let tx_hash = ids::tx_hash_id(&meta.tx_hash);
    let Some(mut fund) = repo.get_fund(&fund_id).await? else {
        warn!(fund = %fund_id, tx = %tx_hash, "Withdrawal for unregistered fund dropped");
        return Ok(());
    };

    let account_id = registry::get_or_create_account(repo, &beneficiary).await?;
    let transaction = registry::get_or_create_transaction(repo, meta).await?;
    let reader = FundReader::new(accessor, meta.fund);

    let total_assets = reader.total_assets().await;
    let total_supply = reader.total_supply().await;
    let price_per_share = reader.price_per_share().await;
    let shares_burnt = shares_for_amount(amount, total_supply, total_assets);

    let record = WithdrawalRecord {
        id: ids::fund_event_record_id(&meta.fund, &meta.tx_hash),
        fund: fund_id.clone(),
        account: account_id.clone(),
        amount,
        withdrawal_fee: fee,
        shares_burnt,
        timestamp: meta.timestamp,
        transaction: transaction.id(),
        fund_update: ids::fund_update_id(&meta.fund, &meta.tx_hash, meta.tx_index),
    };
    if !repo.insert_withdrawal_record(&record).await? {
        debug!(withdrawal = %record.id, "Duplicate withdrawal event, skipping");
        return Ok(());
    }

    // Position side. A missing position means the account holds shares with
    // no recorded deposit: the fund was registered after the account first
    // transacted. The withdrawal is not reconstructed retroactively.
    let position_id = ids::position_id(&beneficiary, &meta.fund);
    match repo.get_position(&position_id).await? {
        Some(account_position) => {
            let latest_present = match account_position.latest_update.as_deref() {
                Some(id) => repo.get_position_update(id).await?.is_some(),
                None => false,
            };
            if latest_present {
                position::withdraw(
                    repo,
                    &reader,
                    account_position,
                    amount,
                    shares_burnt,
                    &transaction,
                )
                .await?;
            } else {
                warn!(
                    position = %position_id,
                    fund = %fund_id,
                    tx = %tx_hash,
                    "Inconsistency: position has no loadable latest update, skipping position mutation"
                );
            }
        }
        None => {
            warn!(
                position = %position_id,
                fund = %fund_id,
                tx = %tx_hash,
                account = %account_id,
                "Inconsistency: withdrawal for untracked position (deposited before fund registration?), skipping position mutation"
            );
        }
    }

    // Fund side: requires a prior update chain.
    let latest = match fund.latest_update.as_deref() {
        Some(id) => repo.get_fund_update(id).await?,
        None => None,
    };
    match latest {
        Some(latest) => {
            fund_update::withdraw(
                repo,
                &mut fund,
                &latest,
                price_per_share,
                amount,
                shares_burnt,
                &transaction,
                total_assets,
            )
            .await?;

            let mut chain = registry::get_or_create_chain(repo, chain_id).await?;
            chain.total_value_locked = clamped_sub(chain.total_value_locked, amount);
            repo.upsert_chain(&chain).await?;
        }
        None => {
            warn!(
                fund = %fund_id,
                tx = %tx_hash,
                "Inconsistency: withdrawal with no prior fund update, skipping fund mutation"
            );
        }
    }

    Ok(())
}
