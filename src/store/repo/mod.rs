//! Repository layer: load-by-id / upsert-by-id operations per entity.
//!
//! Immutable records (deposits, withdrawals, transfers, updates) insert with
//! `ON CONFLICT DO NOTHING` so replaying an event is a no-op; mutable
//! aggregates (funds, chains, positions) use `INSERT OR REPLACE`. Methods
//! are split across submodules by domain:
//! - `mod.rs` - accounts, tokens, transactions, chains, funds, ingest cursor
//! - `positions.rs` - account positions and their update chains
//! - `records.rs` - fund updates and immutable event records

mod positions;
mod records;

use crate::domain::{Chain, ChainId, EventOrdinal, Fund, Token, TransactionRecord};
use alloy_primitives::{Address, B256, U256};
use sqlx::sqlite::SqlitePool;
use sqlx::Row;
use std::str::FromStr;
use tracing::warn;

/// Repository for all ledger persistence.
pub struct Repository {
    pool: SqlitePool,
}

/// Parse a stored decimal amount, defaulting to zero on corruption.
pub(crate) fn parse_amount(raw: &str, context: &str) -> U256 {
    U256::from_str(raw).unwrap_or_else(|e| {
        warn!(raw, context, error = %e, "Failed to parse stored amount, using 0");
        U256::ZERO
    })
}

pub(crate) fn parse_address(raw: &str, context: &str) -> Address {
    Address::from_str(raw).unwrap_or_else(|e| {
        warn!(raw, context, error = %e, "Failed to parse stored address, using zero address");
        Address::ZERO
    })
}

pub(crate) fn parse_hash(raw: &str, context: &str) -> B256 {
    B256::from_str(raw).unwrap_or_else(|e| {
        warn!(raw, context, error = %e, "Failed to parse stored hash, using zero hash");
        B256::ZERO
    })
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    /// Record an account id; repeat insertions are no-ops.
    pub async fn ensure_account(&self, id: &str) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO accounts (id) VALUES (?) ON CONFLICT(id) DO NOTHING")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // =========================================================================
    // Tokens
    // =========================================================================

    pub async fn get_token(&self, id: &str) -> Result<Option<Token>, sqlx::Error> {
        let row = sqlx::query("SELECT id, decimals, name, symbol FROM tokens WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| Token {
            address: parse_address(&r.get::<String, _>("id"), "token.id"),
            decimals: r.get::<i64, _>("decimals") as u8,
            name: r.get("name"),
            symbol: r.get("symbol"),
        }))
    }

    pub async fn insert_token(&self, token: &Token) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO tokens (id, decimals, name, symbol)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(token.id())
        .bind(token.decimals as i64)
        .bind(&token.name)
        .bind(&token.symbol)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    pub async fn get_transaction(
        &self,
        id: &str,
    ) -> Result<Option<TransactionRecord>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT id, block_number, timestamp, tx_index FROM transactions WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| TransactionRecord {
            hash: parse_hash(&r.get::<String, _>("id"), "transaction.id"),
            block_number: r.get::<i64, _>("block_number") as u64,
            timestamp: r.get("timestamp"),
            index: r.get::<i64, _>("tx_index") as u64,
        }))
    }

    pub async fn insert_transaction(
        &self,
        transaction: &TransactionRecord,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO transactions (id, block_number, timestamp, tx_index)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(transaction.id())
        .bind(transaction.block_number as i64)
        .bind(transaction.timestamp)
        .bind(transaction.index as i64)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Chains
    // =========================================================================

    pub async fn get_chain(&self, id: &ChainId) -> Result<Option<Chain>, sqlx::Error> {
        let row =
            sqlx::query("SELECT id, total_value_locked, funds_count FROM chains WHERE id = ?")
                .bind(id.as_str())
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|r| Chain {
            id: ChainId::new(r.get("id")),
            total_value_locked: parse_amount(
                &r.get::<String, _>("total_value_locked"),
                "chain.total_value_locked",
            ),
            funds_count: r.get::<i64, _>("funds_count") as u64,
        }))
    }

    pub async fn upsert_chain(&self, chain: &Chain) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO chains (id, total_value_locked, funds_count)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(chain.id.as_str())
        .bind(chain.total_value_locked.to_string())
        .bind(chain.funds_count as i64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // =========================================================================
    // Funds
    // =========================================================================

    pub async fn get_fund(&self, id: &str) -> Result<Option<Fund>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, symbol, name, underlying_token, share_token, balance_tokens,
                   balance_tokens_idle, balance_tokens_invested, shares_supply,
                   withdrawal_fee_bps, latest_update
            FROM funds WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(map_fund_row))
    }

    pub async fn list_funds(&self) -> Result<Vec<Fund>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, symbol, name, underlying_token, share_token, balance_tokens,
                   balance_tokens_idle, balance_tokens_invested, shares_supply,
                   withdrawal_fee_bps, latest_update
            FROM funds ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(map_fund_row).collect())
    }

    pub async fn upsert_fund(&self, fund: &Fund) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO funds
            (id, symbol, name, underlying_token, share_token, balance_tokens,
             balance_tokens_idle, balance_tokens_invested, shares_supply,
             withdrawal_fee_bps, latest_update)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(fund.id())
        .bind(&fund.symbol)
        .bind(&fund.name)
        .bind(&fund.underlying_token)
        .bind(&fund.share_token)
        .bind(fund.balance_tokens.to_string())
        .bind(fund.balance_tokens_idle.to_string())
        .bind(fund.balance_tokens_invested.to_string())
        .bind(fund.shares_supply.to_string())
        .bind(fund.withdrawal_fee_bps as i64)
        .bind(fund.latest_update.as_deref())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // =========================================================================
    // Ingest cursor
    // =========================================================================

    pub async fn get_cursor(&self, chain: &ChainId) -> Result<Option<EventOrdinal>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT block_number, tx_index, log_index FROM ingest_cursor WHERE chain_id = ?",
        )
        .bind(chain.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| {
            EventOrdinal::new(
                r.get::<i64, _>("block_number") as u64,
                r.get::<i64, _>("tx_index") as u64,
                r.get::<i64, _>("log_index") as u64,
            )
        }))
    }

    pub async fn set_cursor(
        &self,
        chain: &ChainId,
        ordinal: EventOrdinal,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO ingest_cursor (chain_id, block_number, tx_index, log_index)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(chain.as_str())
        .bind(ordinal.block_number as i64)
        .bind(ordinal.tx_index as i64)
        .bind(ordinal.log_index as i64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

fn map_fund_row(r: sqlx::sqlite::SqliteRow) -> Fund {
    Fund {
        address: parse_address(&r.get::<String, _>("id"), "fund.id"),
        symbol: r.get("symbol"),
        name: r.get("name"),
        underlying_token: r.get("underlying_token"),
        share_token: r.get("share_token"),
        balance_tokens: parse_amount(&r.get::<String, _>("balance_tokens"), "fund.balance_tokens"),
        balance_tokens_idle: parse_amount(
            &r.get::<String, _>("balance_tokens_idle"),
            "fund.balance_tokens_idle",
        ),
        balance_tokens_invested: parse_amount(
            &r.get::<String, _>("balance_tokens_invested"),
            "fund.balance_tokens_invested",
        ),
        shares_supply: parse_amount(&r.get::<String, _>("shares_supply"), "fund.shares_supply"),
        withdrawal_fee_bps: r.get::<i64, _>("withdrawal_fee_bps") as u32,
        latest_update: r.get("latest_update"),
    }
}
