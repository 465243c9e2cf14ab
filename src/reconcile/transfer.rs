//! Share transfer reconciliation.

use crate::accessor::{FundAccessor, FundReader};
use crate::domain::{ids, EventMeta};
use crate::ledger::{position, transfer as transfer_ledger};
use crate::registry;
use crate::store::Repository;
use alloy_primitives::{Address, U256};
use tracing::{debug, warn};

use super::{underlying_for_shares, ReconcileError};

/// Apply a share transfer between two accounts. Transfers touching the zero
/// address are mints/burns handled by the deposit/withdraw flows and are
/// ignored here.
pub async fn handle(
    repo: &Repository,
    accessor: &dyn FundAccessor,
    meta: &EventMeta,
    from: Address,
    to: Address,
    share_amount: U256,
) -> Result<(), ReconcileError> {
    if from == Address::ZERO || to == Address::ZERO {
        debug!(tx = %ids::tx_hash_id(&meta.tx_hash), "Mint/burn transfer filtered");
        return Ok(());
    }

    let fund_id = ids::address_id(&meta.fund);
    let Some(fund) = repo.get_fund(&fund_id).await? else {
        warn!(fund = %fund_id, tx = %ids::tx_hash_id(&meta.tx_hash), "Transfer for unregistered fund dropped");
        return Ok(());
    };

    registry::get_or_create_account(repo, &from).await?;
    registry::get_or_create_account(repo, &to).await?;
    let transaction = registry::get_or_create_transaction(repo, meta).await?;
    let reader = FundReader::new(accessor, meta.fund);

    let total_assets = reader.total_assets().await;
    let total_supply = reader.total_supply().await;
    let underlying_amount = underlying_for_shares(share_amount, total_assets, total_supply);

    let (_, created) = transfer_ledger::record(
        repo,
        &from,
        &to,
        &fund,
        underlying_amount,
        share_amount,
        &transaction,
    )
    .await?;
    if !created {
        debug!(
            tx = %ids::tx_hash_id(&meta.tx_hash),
            "Duplicate transfer event, skipping"
        );
        return Ok(());
    }

    position::transfer(
        repo,
        &reader,
        &from,
        &to,
        &fund,
        underlying_amount,
        share_amount,
        &transaction,
    )
    .await?;

    Ok(())
}
