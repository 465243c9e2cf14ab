//! Append-only update chain for account positions.
//!
//! Each (account, fund) pair owns an independently numbered chain: orders
//! start at 0 and every append is `previous.order + 1`. The chain is linked
//! by id formula rather than by reference, so a replayed event resolves to
//! an already-occupied slot and the append degrades to a no-op.

use crate::domain::{ids, AccountFundPositionUpdate, TransactionRecord};
use crate::store::Repository;
use alloy_primitives::{Address, U256};
use tracing::warn;

/// Step deltas carried by one position update. Sent/received fields are
/// populated mutually exclusively.
#[derive(Debug, Clone, Copy, Default)]
pub struct StepDeltas {
    pub deposits: U256,
    pub withdrawals: U256,
    pub shares_minted: U256,
    pub shares_burnt: U256,
    pub shares_sent: U256,
    pub shares_received: U256,
    pub tokens_sent: U256,
    pub tokens_received: U256,
}

impl StepDeltas {
    pub fn deposit(tokens: U256, shares: U256) -> Self {
        StepDeltas {
            deposits: tokens,
            shares_minted: shares,
            ..Default::default()
        }
    }

    pub fn withdrawal(tokens: U256, shares: U256) -> Self {
        StepDeltas {
            withdrawals: tokens,
            shares_burnt: shares,
            ..Default::default()
        }
    }

    pub fn transfer(receiving: bool, tokens: U256, shares: U256) -> Self {
        if receiving {
            StepDeltas {
                shares_received: shares,
                tokens_received: tokens,
                ..Default::default()
            }
        } else {
            StepDeltas {
                shares_sent: shares,
                tokens_sent: tokens,
                ..Default::default()
            }
        }
    }
}

/// Everything needed to append one update to a position's chain.
pub struct NewUpdate<'a> {
    pub account: &'a Address,
    pub fund: &'a Address,
    pub position_id: &'a str,
    pub order: u64,
    pub transaction: &'a TransactionRecord,
    pub deltas: StepDeltas,
    /// Share balance re-read from the accessor for this step.
    pub balance_shares: U256,
    /// Position value re-read from the accessor for this step.
    pub balance_position: U256,
}

/// Order for the next update in a chain.
///
/// A position without a latest update starts at 0. A latest-update id that
/// loads nothing is an inconsistency: it is logged and the chain restarts at
/// 0 rather than being silently repaired.
pub async fn next_order(
    repo: &Repository,
    latest_update_id: Option<&str>,
    tx_hash: &str,
) -> Result<u64, sqlx::Error> {
    let id = match latest_update_id {
        None => return Ok(0),
        Some(id) => id,
    };

    match repo.get_position_update(id).await? {
        Some(latest) => Ok(latest.order + 1),
        None => {
            warn!(
                latest_update = id,
                tx = tx_hash,
                "Inconsistency: latest position update not found, restarting order at 0"
            );
            Ok(0)
        }
    }
}

/// Append one update. If the slot is already occupied (replayed event), the
/// existing update is returned unchanged and a warning is emitted.
pub async fn create(
    repo: &Repository,
    new: NewUpdate<'_>,
) -> Result<AccountFundPositionUpdate, sqlx::Error> {
    let id = ids::position_update_id(new.account, new.fund, new.order);
    let update = AccountFundPositionUpdate {
        id: id.clone(),
        order: new.order,
        account: ids::address_id(new.account),
        account_fund_position: new.position_id.to_string(),
        transaction: new.transaction.id(),
        timestamp: new.transaction.timestamp,
        block_number: new.transaction.block_number,
        deposits: new.deltas.deposits,
        withdrawals: new.deltas.withdrawals,
        shares_minted: new.deltas.shares_minted,
        shares_burnt: new.deltas.shares_burnt,
        shares_sent: new.deltas.shares_sent,
        shares_received: new.deltas.shares_received,
        tokens_sent: new.deltas.tokens_sent,
        tokens_received: new.deltas.tokens_received,
        balance_shares: new.balance_shares,
        balance_position: new.balance_position,
        fund_update: ids::fund_update_id(
            new.fund,
            &new.transaction.hash,
            new.transaction.index,
        ),
    };

    let inserted = repo.insert_position_update(&update).await?;
    if !inserted {
        warn!(
            update = %id,
            tx = %update.transaction,
            "Position update slot already occupied, keeping existing record"
        );
        if let Some(existing) = repo.get_position_update(&id).await? {
            return Ok(existing);
        }
    }
    Ok(update)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::migrations::init_db;
    use alloy_primitives::B256;
    use tempfile::TempDir;

    async fn setup() -> (Repository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir
            .path()
            .join("test.db")
            .to_string_lossy()
            .to_string();
        let pool = init_db(&db_path).await.expect("init_db failed");
        (Repository::new(pool), temp_dir)
    }

    fn tx() -> TransactionRecord {
        TransactionRecord {
            hash: B256::repeat_byte(0xaa),
            block_number: 100,
            timestamp: 1_700_000_000,
            index: 1,
        }
    }

    fn new_update<'a>(
        account: &'a Address,
        fund: &'a Address,
        position_id: &'a str,
        order: u64,
        transaction: &'a TransactionRecord,
    ) -> NewUpdate<'a> {
        NewUpdate {
            account,
            fund,
            position_id,
            order,
            transaction,
            deltas: StepDeltas::deposit(U256::from(100u64), U256::from(100u64)),
            balance_shares: U256::from(100u64),
            balance_position: U256::from(100u64),
        }
    }

    #[tokio::test]
    async fn test_next_order_starts_at_zero() {
        let (repo, _temp) = setup().await;
        assert_eq!(next_order(&repo, None, "0xaaa").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_next_order_increments_from_latest() {
        let (repo, _temp) = setup().await;
        let account = Address::repeat_byte(0x11);
        let fund = Address::repeat_byte(0x22);
        let position_id = ids::position_id(&account, &fund);
        let transaction = tx();

        let update = create(&repo, new_update(&account, &fund, &position_id, 4, &transaction))
            .await
            .unwrap();

        assert_eq!(
            next_order(&repo, Some(&update.id), "0xaaa").await.unwrap(),
            5
        );
    }

    #[tokio::test]
    async fn test_next_order_missing_latest_restarts() {
        let (repo, _temp) = setup().await;
        assert_eq!(
            next_order(&repo, Some("missing-id"), "0xaaa").await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_create_occupied_slot_returns_existing() {
        let (repo, _temp) = setup().await;
        let account = Address::repeat_byte(0x11);
        let fund = Address::repeat_byte(0x22);
        let position_id = ids::position_id(&account, &fund);
        let transaction = tx();

        let first = create(&repo, new_update(&account, &fund, &position_id, 0, &transaction))
            .await
            .unwrap();

        let mut replay = new_update(&account, &fund, &position_id, 0, &transaction);
        replay.deltas = StepDeltas::deposit(U256::from(999u64), U256::from(999u64));
        let second = create(&repo, replay).await.unwrap();

        assert_eq!(second, first);
        assert_eq!(
            repo.query_position_updates(&position_id).await.unwrap().len(),
            1
        );
    }

    #[test]
    fn test_step_deltas_transfer_sides_are_exclusive() {
        let sending = StepDeltas::transfer(false, U256::from(10u64), U256::from(20u64));
        assert_eq!(sending.tokens_sent, U256::from(10u64));
        assert_eq!(sending.tokens_received, U256::ZERO);
        assert_eq!(sending.shares_sent, U256::from(20u64));
        assert_eq!(sending.shares_received, U256::ZERO);

        let receiving = StepDeltas::transfer(true, U256::from(10u64), U256::from(20u64));
        assert_eq!(receiving.tokens_received, U256::from(10u64));
        assert_eq!(receiving.tokens_sent, U256::ZERO);
    }
}
