//! Withdrawal-fee-change reconciliation.

use crate::accessor::{FundAccessor, FundReader};
use crate::domain::{ids, EventMeta};
use crate::ledger::fund_update;
use crate::registry;
use crate::store::Repository;
use tracing::warn;

use super::ReconcileError;

/// Apply a withdrawal-fee change: the fee on the fund entity always updates;
/// the accompanying FundUpdate snapshot requires a prior update chain.
pub async fn handle(
    repo: &Repository,
    accessor: &dyn FundAccessor,
    meta: &EventMeta,
    withdrawal_fee_bps: u32,
) -> Result<(), ReconcileError> {
    let fund_id = ids::address_id(&meta.fund);
    let tx_hash = ids::tx_hash_id(&meta.tx_hash);
    let Some(mut fund) = repo.get_fund(&fund_id).await? else {
        warn!(fund = %fund_id, tx = %tx_hash, "Fee update for unregistered fund dropped");
        return Ok(());
    };

    let transaction = registry::get_or_create_transaction(repo, meta).await?;
    fund.withdrawal_fee_bps = withdrawal_fee_bps;

    let latest = match fund.latest_update.as_deref() {
        Some(id) => repo.get_fund_update(id).await?,
        None => None,
    };
    match latest {
        Some(latest) => {
            let reader = FundReader::new(accessor, meta.fund);
            let balance_position = reader.total_assets().await;
            let update = fund_update::withdrawal_fee_updated(
                repo,
                &fund,
                &latest,
                balance_position,
                &transaction,
            )
            .await?;
            fund.latest_update = Some(update.id);
        }
        None => {
            warn!(
                fund = %fund_id,
                tx = %tx_hash,
                "Inconsistency: fee update with no prior fund update, skipping snapshot"
            );
        }
    }

    repo.upsert_fund(&fund).await?;
    Ok(())
}
