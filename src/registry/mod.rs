//! Fund, chain and supporting-entity registration.
//!
//! Get-or-create bookkeeping for the low-churn entities: funds, the
//! chain-wide aggregate, token metadata, transactions and accounts.
//! Contract-read failures during registration degrade to defaults; nothing
//! here is fatal.

use crate::accessor::{FundAccessor, DEFAULT_DECIMALS};
use crate::domain::{ids, Chain, ChainId, EventMeta, Fund, Token, TransactionRecord};
use crate::store::Repository;
use alloy_primitives::{Address, U256};
use tracing::{debug, info, warn};

/// Record the account if unseen and return its id.
pub async fn get_or_create_account(
    repo: &Repository,
    address: &Address,
) -> Result<String, sqlx::Error> {
    let id = ids::address_id(address);
    repo.ensure_account(&id).await?;
    Ok(id)
}

/// Load the token metadata cache entry, creating it from contract reads on
/// first sight. Failed reads leave the defaults (18 decimals, empty strings).
pub async fn get_or_create_token(
    repo: &Repository,
    accessor: &dyn FundAccessor,
    address: Address,
) -> Result<Token, sqlx::Error> {
    let id = ids::address_id(&address);
    if let Some(token) = repo.get_token(&id).await? {
        return Ok(token);
    }

    let decimals = match accessor.decimals(address).await {
        Ok(value) => value,
        Err(e) => {
            debug!(token = %id, error = %e, "decimals read failed, defaulting");
            DEFAULT_DECIMALS
        }
    };
    let name = accessor.name(address).await.unwrap_or_default();
    let symbol = accessor.symbol(address).await.unwrap_or_default();

    let token = Token {
        address,
        decimals,
        name,
        symbol,
    };
    repo.insert_token(&token).await?;
    Ok(token)
}

/// Load the normalized transaction, creating it from event metadata on
/// first reference.
pub async fn get_or_create_transaction(
    repo: &Repository,
    meta: &EventMeta,
) -> Result<TransactionRecord, sqlx::Error> {
    let id = ids::tx_hash_id(&meta.tx_hash);
    if let Some(transaction) = repo.get_transaction(&id).await? {
        return Ok(transaction);
    }

    let transaction = TransactionRecord {
        hash: meta.tx_hash,
        block_number: meta.block_number,
        timestamp: meta.timestamp,
        index: meta.tx_index,
    };
    repo.insert_transaction(&transaction).await?;
    Ok(transaction)
}

/// Load the chain aggregate, creating it zeroed on first sight.
pub async fn get_or_create_chain(
    repo: &Repository,
    id: &ChainId,
) -> Result<Chain, sqlx::Error> {
    if let Some(chain) = repo.get_chain(id).await? {
        return Ok(chain);
    }

    let chain = Chain {
        id: id.clone(),
        total_value_locked: U256::ZERO,
        funds_count: 0,
    };
    repo.upsert_chain(&chain).await?;
    Ok(chain)
}

/// Load the fund, creating it with zeroed balances on first sight.
///
/// Returns the fund and whether this call created it. Symbol, name, the
/// underlying/share token refs and the withdrawal fee are resolved through
/// the accessor; each failing read degrades to its default.
pub async fn get_or_create_fund(
    repo: &Repository,
    accessor: &dyn FundAccessor,
    address: Address,
) -> Result<(Fund, bool), sqlx::Error> {
    let id = ids::address_id(&address);
    if let Some(fund) = repo.get_fund(&id).await? {
        return Ok((fund, false));
    }

    let symbol = accessor.symbol(address).await.unwrap_or_default();
    let name = accessor.name(address).await.unwrap_or_default();
    let underlying_token = match accessor.underlying(address).await {
        Ok(token_address) => {
            get_or_create_token(repo, accessor, token_address)
                .await?
                .id()
        }
        Err(e) => {
            warn!(fund = %id, error = %e, "underlying read failed, leaving token ref empty");
            String::new()
        }
    };
    let share_token = get_or_create_token(repo, accessor, address).await?.id();
    let withdrawal_fee_bps = match accessor.withdrawal_fee_bps(address).await {
        Ok(value) => value,
        Err(e) => {
            debug!(fund = %id, error = %e, "withdrawalFee read failed, defaulting to 0");
            0
        }
    };

    let fund = Fund {
        address,
        symbol,
        name,
        underlying_token,
        share_token,
        balance_tokens: U256::ZERO,
        balance_tokens_idle: U256::ZERO,
        balance_tokens_invested: U256::ZERO,
        shares_supply: U256::ZERO,
        withdrawal_fee_bps,
        latest_update: None,
    };
    repo.upsert_fund(&fund).await?;
    info!(fund = %id, symbol = %fund.symbol, "Registered fund");
    Ok((fund, true))
}

/// Handle a fund-registration event: create the fund and bump the chain's
/// fund count exactly once per fund.
pub async fn register_fund(
    repo: &Repository,
    accessor: &dyn FundAccessor,
    chain_id: &ChainId,
    address: Address,
) -> Result<Fund, sqlx::Error> {
    let (fund, created) = get_or_create_fund(repo, accessor, address).await?;
    if created {
        let mut chain = get_or_create_chain(repo, chain_id).await?;
        chain.funds_count += 1;
        repo.upsert_chain(&chain).await?;
    }
    Ok(fund)
}
