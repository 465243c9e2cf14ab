//! Share transfer ledger: one record per (sender, receiver, transaction).
//!
//! Zero-address transfers (mint/burn at the protocol boundary) are filtered
//! by the reconciliation layer and never reach this module.

use crate::domain::{ids, Fund, TransactionRecord, TransferRecord};
use crate::store::Repository;
use alloy_primitives::{Address, U256};
use tracing::debug;

/// Record a transfer. Replays resolve to the same `from-to-txId` key and
/// return the existing record unchanged; the bool reports whether this call
/// created the record.
pub async fn record(
    repo: &Repository,
    from: &Address,
    to: &Address,
    fund: &Fund,
    underlying_amount: U256,
    share_amount: U256,
    transaction: &TransactionRecord,
) -> Result<(TransferRecord, bool), sqlx::Error> {
    let id = ids::transfer_id(from, to, &transaction.id());
    if let Some(existing) = repo.get_transfer(&id).await? {
        debug!(transfer = %id, "Transfer already recorded, keeping existing");
        return Ok((existing, false));
    }

    let transfer = TransferRecord {
        id,
        from: ids::address_id(from),
        to: ids::address_id(to),
        fund: fund.id(),
        underlying_token: fund.underlying_token.clone(),
        underlying_amount,
        share_token: fund.share_token.clone(),
        share_amount,
        timestamp: transaction.timestamp,
        block_number: transaction.block_number,
        transaction: transaction.id(),
    };
    repo.insert_transfer(&transfer).await?;
    Ok((transfer, true))
}
