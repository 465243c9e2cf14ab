//! Account position tracker: the current (account, fund) stake and the
//! append of one snapshot per affecting event.
//!
//! Cumulative token/share balances are carried forward by addition, while
//! the share balance and position value recorded on each update are re-read
//! from the accessor, keeping snapshots consistent with on-chain truth even
//! when earlier history was only partially observed.

use crate::accessor::FundReader;
use crate::domain::math::clamped_sub;
use crate::domain::{ids, AccountFundPosition, Fund, TransactionRecord};
use crate::store::Repository;
use alloy_primitives::{Address, U256};
use tracing::{debug, info};

use super::position_update::{self, NewUpdate, StepDeltas};

/// Result of applying a deposit to a position.
pub struct PositionStep {
    pub position: AccountFundPosition,
    pub update: crate::domain::AccountFundPositionUpdate,
}

/// Apply a deposit: create the position seeded with the deposited amounts
/// (order-0 update) or add the deltas onto the existing balances and append
/// the next ordered update.
pub async fn deposit(
    repo: &Repository,
    reader: &FundReader<'_>,
    account: &Address,
    fund: &Fund,
    transaction: &TransactionRecord,
    deposited_tokens: U256,
    minted_shares: U256,
) -> Result<PositionStep, sqlx::Error> {
    let position_id = ids::position_id(account, &fund.address);
    let balance_shares = reader.balance_of(*account).await;
    let balance_position = reader.balance_position(*account).await;

    let existing = repo.get_position(&position_id).await?;
    let (mut position, order) = match existing {
        None => {
            info!(position = %position_id, tx = %transaction.id(), "Creating position on first deposit");
            let position = AccountFundPosition {
                account: *account,
                fund: fund.address,
                underlying_token: fund.underlying_token.clone(),
                share_token: fund.share_token.clone(),
                transaction: transaction.id(),
                balance_shares: minted_shares,
                balance_tokens: deposited_tokens,
                balance_position,
                balance_profit: U256::ZERO,
                latest_update: None,
            };
            (position, 0)
        }
        Some(mut position) => {
            debug!(position = %position_id, tx = %transaction.id(), "Updating position on deposit");
            position.balance_tokens = position.balance_tokens + deposited_tokens;
            position.balance_shares = position.balance_shares + minted_shares;
            let order = position_update::next_order(
                repo,
                position.latest_update.as_deref(),
                &transaction.id(),
            )
            .await?;
            (position, order)
        }
    };

    let update = position_update::create(
        repo,
        NewUpdate {
            account,
            fund: &fund.address,
            position_id: &position_id,
            order,
            transaction,
            deltas: StepDeltas::deposit(deposited_tokens, minted_shares),
            balance_shares,
            balance_position,
        },
    )
    .await?;

    position.balance_position = balance_position;
    position.latest_update = Some(update.id.clone());
    repo.upsert_position(&position).await?;

    Ok(PositionStep { position, update })
}

/// Apply a withdrawal to an existing position: burn shares, clamp the token
/// balance at zero, append the next ordered update.
///
/// The caller is responsible for the missing-position case; this function
/// assumes the position exists.
pub async fn withdraw(
    repo: &Repository,
    reader: &FundReader<'_>,
    mut position: AccountFundPosition,
    withdrawn_amount: U256,
    shares_burnt: U256,
    transaction: &TransactionRecord,
) -> Result<crate::domain::AccountFundPositionUpdate, sqlx::Error> {
    let position_id = position.id();
    let balance_shares = reader.balance_of(position.account).await;
    let balance_position = reader.balance_position(position.account).await;

    let order = position_update::next_order(
        repo,
        position.latest_update.as_deref(),
        &transaction.id(),
    )
    .await?;

    let update = position_update::create(
        repo,
        NewUpdate {
            account: &position.account,
            fund: &position.fund,
            position_id: &position_id,
            order,
            transaction,
            deltas: StepDeltas::withdrawal(withdrawn_amount, shares_burnt),
            balance_shares,
            balance_position,
        },
    )
    .await?;

    position.balance_shares = clamped_sub(position.balance_shares, shares_burnt);
    position.balance_tokens = clamped_sub(position.balance_tokens, withdrawn_amount);
    position.balance_position = balance_position;
    position.latest_update = Some(update.id.clone());
    repo.upsert_position(&position).await?;

    Ok(update)
}

/// Apply one side of a transfer. Called once with `receiving = false` for
/// the sender and once with `receiving = true` for the receiver; a
/// first-time receiver gets its position created here.
#[allow(clippy::too_many_arguments)]
pub async fn transfer_for_account(
    repo: &Repository,
    reader: &FundReader<'_>,
    account: &Address,
    fund: &Fund,
    receiving: bool,
    token_amount: U256,
    share_amount: U256,
    transaction: &TransactionRecord,
) -> Result<(), sqlx::Error> {
    let position_id = ids::position_id(account, &fund.address);
    let existing = repo.get_position(&position_id).await?;
    let balance_shares = reader.balance_of(*account).await;
    let balance_position = reader.balance_position(*account).await;

    let order = match &existing {
        None => 0,
        Some(position) => {
            position_update::next_order(
                repo,
                position.latest_update.as_deref(),
                &transaction.id(),
            )
            .await?
        }
    };

    let update = position_update::create(
        repo,
        NewUpdate {
            account,
            fund: &fund.address,
            position_id: &position_id,
            order,
            transaction,
            deltas: StepDeltas::transfer(receiving, token_amount, share_amount),
            balance_shares,
            balance_position,
        },
    )
    .await?;

    match existing {
        None => {
            // First sight of this account in this fund: a transfer-in (or,
            // for partially observed history, even a transfer-out) seeds the
            // position here rather than reconstructing what came before.
            info!(position = %position_id, tx = %transaction.id(), "Creating position on transfer");
            let position = AccountFundPosition {
                account: *account,
                fund: fund.address,
                underlying_token: fund.underlying_token.clone(),
                share_token: fund.share_token.clone(),
                transaction: transaction.id(),
                balance_shares: if receiving { share_amount } else { U256::ZERO },
                balance_tokens: if receiving { token_amount } else { U256::ZERO },
                balance_position,
                balance_profit: U256::ZERO,
                latest_update: Some(update.id.clone()),
            };
            repo.upsert_position(&position).await?;
        }
        Some(mut position) => {
            if receiving {
                position.balance_tokens = position.balance_tokens + token_amount;
                position.balance_shares = position.balance_shares + share_amount;
            } else {
                position.balance_tokens = clamped_sub(position.balance_tokens, token_amount);
                position.balance_shares = clamped_sub(position.balance_shares, share_amount);
            }
            position.balance_position = balance_position;
            position.latest_update = Some(update.id.clone());
            repo.upsert_position(&position).await?;
        }
    }

    Ok(())
}

/// Apply both sides of a transfer, sender first. The two appends are
/// independently numbered; there is no cross-account ordering guarantee.
#[allow(clippy::too_many_arguments)]
pub async fn transfer(
    repo: &Repository,
    reader: &FundReader<'_>,
    from: &Address,
    to: &Address,
    fund: &Fund,
    token_amount: U256,
    share_amount: U256,
    transaction: &TransactionRecord,
) -> Result<(), sqlx::Error> {
    transfer_for_account(
        repo, reader, from, fund, false, token_amount, share_amount, transaction,
    )
    .await?;
    transfer_for_account(
        repo, reader, to, fund, true, token_amount, share_amount, transaction,
    )
    .await?;
    Ok(())
}
