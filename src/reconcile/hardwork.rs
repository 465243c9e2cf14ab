//! Fee-harvest (hardwork) reconciliation.

use crate::domain::{ids, EventMeta, HardWorkRecord};
use crate::ledger::fund_update;
use crate::registry;
use crate::store::Repository;
use alloy_primitives::U256;
use tracing::{debug, warn};

use super::ReconcileError;

/// Apply a hardwork event: record the harvest and append a fund update with
/// the event-supplied price and total value locked. Share supply and token
/// balances stay untouched.
pub async fn handle(
    repo: &Repository,
    meta: &EventMeta,
    total_value_locked: U256,
    price_per_share: U256,
) -> Result<(), ReconcileError> {
    let fund_id = ids::address_id(&meta.fund);
    let tx_hash = ids::tx_hash_id(&meta.tx_hash);
    let Some(mut fund) = repo.get_fund(&fund_id).await? else {
        warn!(fund = %fund_id, tx = %tx_hash, "HardWork for unregistered fund dropped");
        return Ok(());
    };

    let transaction = registry::get_or_create_transaction(repo, meta).await?;

    let record = HardWorkRecord {
        id: ids::fund_event_record_id(&meta.fund, &meta.tx_hash),
        fund: fund_id.clone(),
        total_value_locked,
        price_per_share,
        timestamp: meta.timestamp,
        transaction: transaction.id(),
    };
    if !repo.insert_hardwork_record(&record).await? {
        debug!(hardwork = %record.id, "Duplicate hardwork event, skipping");
        return Ok(());
    }

    let latest = match fund.latest_update.as_deref() {
        Some(id) => repo.get_fund_update(id).await?,
        None => None,
    };
    let Some(latest) = latest else {
        warn!(
            fund = %fund_id,
            tx = %tx_hash,
            "Inconsistency: hardwork with no prior fund update, skipping fund update"
        );
        return Ok(());
    };

    let update = fund_update::hardwork(
        repo,
        &fund,
        &latest,
        price_per_share,
        total_value_locked,
        &transaction,
    )
    .await?;

    fund.latest_update = Some(update.id);
    repo.upsert_fund(&fund).await?;

    Ok(())
}
