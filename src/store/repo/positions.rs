//! Account position and position-update-chain operations.

use crate::domain::{AccountFundPosition, AccountFundPositionUpdate};
use sqlx::Row;

use super::{parse_address, parse_amount, Repository};

impl Repository {
    pub async fn get_position(
        &self,
        id: &str,
    ) -> Result<Option<AccountFundPosition>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, account, fund, underlying_token, share_token, tx_id,
                   balance_shares, balance_tokens, balance_position, balance_profit,
                   latest_update
            FROM account_fund_positions WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(map_position_row))
    }

    pub async fn query_positions_for_account(
        &self,
        account: &str,
    ) -> Result<Vec<AccountFundPosition>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, account, fund, underlying_token, share_token, tx_id,
                   balance_shares, balance_tokens, balance_position, balance_profit,
                   latest_update
            FROM account_fund_positions WHERE account = ? ORDER BY fund ASC
            "#,
        )
        .bind(account)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(map_position_row).collect())
    }

    pub async fn upsert_position(
        &self,
        position: &AccountFundPosition,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO account_fund_positions
            (id, account, fund, underlying_token, share_token, tx_id,
             balance_shares, balance_tokens, balance_position, balance_profit,
             latest_update)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(position.id())
        .bind(crate::domain::ids::address_id(&position.account))
        .bind(crate::domain::ids::address_id(&position.fund))
        .bind(&position.underlying_token)
        .bind(&position.share_token)
        .bind(&position.transaction)
        .bind(position.balance_shares.to_string())
        .bind(position.balance_tokens.to_string())
        .bind(position.balance_position.to_string())
        .bind(position.balance_profit.to_string())
        .bind(position.latest_update.as_deref())
        .execute(self.pool())
        .await?;
        Ok(())
    }

    pub async fn get_position_update(
        &self,
        id: &str,
    ) -> Result<Option<AccountFundPositionUpdate>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, position_id, account, ord, tx_id, timestamp, block_number,
                   deposits, withdrawals, shares_minted, shares_burnt,
                   shares_sent, shares_received, tokens_sent, tokens_received,
                   balance_shares, balance_position, fund_update
            FROM account_fund_position_updates WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(map_position_update_row))
    }

    /// Insert one update; an already-present id (replayed event) is a no-op.
    pub async fn insert_position_update(
        &self,
        update: &AccountFundPositionUpdate,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO account_fund_position_updates
            (id, position_id, account, ord, tx_id, timestamp, block_number,
             deposits, withdrawals, shares_minted, shares_burnt,
             shares_sent, shares_received, tokens_sent, tokens_received,
             balance_shares, balance_position, fund_update)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(&update.id)
        .bind(&update.account_fund_position)
        .bind(&update.account)
        .bind(update.order as i64)
        .bind(&update.transaction)
        .bind(update.timestamp)
        .bind(update.block_number as i64)
        .bind(update.deposits.to_string())
        .bind(update.withdrawals.to_string())
        .bind(update.shares_minted.to_string())
        .bind(update.shares_burnt.to_string())
        .bind(update.shares_sent.to_string())
        .bind(update.shares_received.to_string())
        .bind(update.tokens_sent.to_string())
        .bind(update.tokens_received.to_string())
        .bind(update.balance_shares.to_string())
        .bind(update.balance_position.to_string())
        .bind(&update.fund_update)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// The full update chain of one position, in order.
    pub async fn query_position_updates(
        &self,
        position_id: &str,
    ) -> Result<Vec<AccountFundPositionUpdate>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, position_id, account, ord, tx_id, timestamp, block_number,
                   deposits, withdrawals, shares_minted, shares_burnt,
                   shares_sent, shares_received, tokens_sent, tokens_received,
                   balance_shares, balance_position, fund_update
            FROM account_fund_position_updates
            WHERE position_id = ?
            ORDER BY ord ASC
            "#,
        )
        .bind(position_id)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(map_position_update_row).collect())
    }
}

fn map_position_row(r: sqlx::sqlite::SqliteRow) -> AccountFundPosition {
    AccountFundPosition {
        account: parse_address(&r.get::<String, _>("account"), "position.account"),
        fund: parse_address(&r.get::<String, _>("fund"), "position.fund"),
        underlying_token: r.get("underlying_token"),
        share_token: r.get("share_token"),
        transaction: r.get("tx_id"),
        balance_shares: parse_amount(
            &r.get::<String, _>("balance_shares"),
            "position.balance_shares",
        ),
        balance_tokens: parse_amount(
            &r.get::<String, _>("balance_tokens"),
            "position.balance_tokens",
        ),
        balance_position: parse_amount(
            &r.get::<String, _>("balance_position"),
            "position.balance_position",
        ),
        balance_profit: parse_amount(
            &r.get::<String, _>("balance_profit"),
            "position.balance_profit",
        ),
        latest_update: r.get("latest_update"),
    }
}

fn map_position_update_row(r: sqlx::sqlite::SqliteRow) -> AccountFundPositionUpdate {
    AccountFundPositionUpdate {
        id: r.get("id"),
        order: r.get::<i64, _>("ord") as u64,
        account: r.get("account"),
        account_fund_position: r.get("position_id"),
        transaction: r.get("tx_id"),
        timestamp: r.get("timestamp"),
        block_number: r.get::<i64, _>("block_number") as u64,
        deposits: parse_amount(&r.get::<String, _>("deposits"), "update.deposits"),
        withdrawals: parse_amount(&r.get::<String, _>("withdrawals"), "update.withdrawals"),
        shares_minted: parse_amount(&r.get::<String, _>("shares_minted"), "update.shares_minted"),
        shares_burnt: parse_amount(&r.get::<String, _>("shares_burnt"), "update.shares_burnt"),
        shares_sent: parse_amount(&r.get::<String, _>("shares_sent"), "update.shares_sent"),
        shares_received: parse_amount(
            &r.get::<String, _>("shares_received"),
            "update.shares_received",
        ),
        tokens_sent: parse_amount(&r.get::<String, _>("tokens_sent"), "update.tokens_sent"),
        tokens_received: parse_amount(
            &r.get::<String, _>("tokens_received"),
            "update.tokens_received",
        ),
        balance_shares: parse_amount(
            &r.get::<String, _>("balance_shares"),
            "update.balance_shares",
        ),
        balance_position: parse_amount(
            &r.get::<String, _>("balance_position"),
            "update.balance_position",
        ),
        fund_update: r.get("fund_update"),
    }
}
