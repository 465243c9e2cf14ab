//! Fund update chain and immutable event-record operations.

use crate::domain::{DepositRecord, FundUpdate, HardWorkRecord, TransferRecord, WithdrawalRecord};
use sqlx::Row;

use super::{parse_amount, Repository};

impl Repository {
    // =========================================================================
    // Fund updates
    // =========================================================================

    pub async fn get_fund_update(&self, id: &str) -> Result<Option<FundUpdate>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, fund, tx_id, timestamp, block_number, tokens_deposited,
                   tokens_withdrawn, shares_minted, shares_burnt, price_per_share,
                   total_fees, withdrawal_fees, balance_position, returns_generated
            FROM fund_updates WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(map_fund_update_row))
    }

    /// Insert one fund update; a replayed id is a no-op.
    pub async fn insert_fund_update(&self, update: &FundUpdate) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO fund_updates
            (id, fund, tx_id, timestamp, block_number, tokens_deposited,
             tokens_withdrawn, shares_minted, shares_burnt, price_per_share,
             total_fees, withdrawal_fees, balance_position, returns_generated)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(&update.id)
        .bind(&update.fund)
        .bind(&update.transaction)
        .bind(update.timestamp)
        .bind(update.block_number as i64)
        .bind(update.tokens_deposited.to_string())
        .bind(update.tokens_withdrawn.to_string())
        .bind(update.shares_minted.to_string())
        .bind(update.shares_burnt.to_string())
        .bind(update.price_per_share.to_string())
        .bind(update.total_fees.to_string())
        .bind(update.withdrawal_fees.to_string())
        .bind(update.balance_position.to_string())
        .bind(update.returns_generated.to_string())
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// All updates of one fund in chain order.
    pub async fn query_fund_updates(&self, fund: &str) -> Result<Vec<FundUpdate>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, fund, tx_id, timestamp, block_number, tokens_deposited,
                   tokens_withdrawn, shares_minted, shares_burnt, price_per_share,
                   total_fees, withdrawal_fees, balance_position, returns_generated
            FROM fund_updates
            WHERE fund = ?
            ORDER BY block_number ASC, id ASC
            "#,
        )
        .bind(fund)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(map_fund_update_row).collect())
    }

    // =========================================================================
    // Deposits / withdrawals / hard works
    // =========================================================================

    pub async fn insert_deposit_record(
        &self,
        deposit: &DepositRecord,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO deposits
            (id, fund, account, amount, shares_minted, timestamp, tx_id, fund_update)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(&deposit.id)
        .bind(&deposit.fund)
        .bind(&deposit.account)
        .bind(deposit.amount.to_string())
        .bind(deposit.shares_minted.to_string())
        .bind(deposit.timestamp)
        .bind(&deposit.transaction)
        .bind(&deposit.fund_update)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn count_deposits_for_fund(&self, fund: &str) -> Result<i64, sqlx::Error> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM deposits WHERE fund = ?")
            .bind(fund)
            .fetch_one(self.pool())
            .await?;
        Ok(row.get::<i64, _>("n"))
    }

    pub async fn insert_withdrawal_record(
        &self,
        withdrawal: &WithdrawalRecord,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO withdrawals
            (id, fund, account, amount, withdrawal_fee, shares_burnt, timestamp,
             tx_id, fund_update)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(&withdrawal.id)
        .bind(&withdrawal.fund)
        .bind(&withdrawal.account)
        .bind(withdrawal.amount.to_string())
        .bind(withdrawal.withdrawal_fee.to_string())
        .bind(withdrawal.shares_burnt.to_string())
        .bind(withdrawal.timestamp)
        .bind(&withdrawal.transaction)
        .bind(&withdrawal.fund_update)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn insert_hardwork_record(
        &self,
        hardwork: &HardWorkRecord,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO hard_works
            (id, fund, total_value_locked, price_per_share, timestamp, tx_id)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(&hardwork.id)
        .bind(&hardwork.fund)
        .bind(hardwork.total_value_locked.to_string())
        .bind(hardwork.price_per_share.to_string())
        .bind(hardwork.timestamp)
        .bind(&hardwork.transaction)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Transfers
    // =========================================================================

    pub async fn get_transfer(&self, id: &str) -> Result<Option<TransferRecord>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, from_account, to_account, fund, underlying_token,
                   underlying_amount, share_token, share_amount, timestamp,
                   block_number, tx_id
            FROM transfers WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(map_transfer_row))
    }

    pub async fn insert_transfer(&self, transfer: &TransferRecord) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO transfers
            (id, from_account, to_account, fund, underlying_token, underlying_amount,
             share_token, share_amount, timestamp, block_number, tx_id)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(&transfer.id)
        .bind(&transfer.from)
        .bind(&transfer.to)
        .bind(&transfer.fund)
        .bind(&transfer.underlying_token)
        .bind(transfer.underlying_amount.to_string())
        .bind(&transfer.share_token)
        .bind(transfer.share_amount.to_string())
        .bind(transfer.timestamp)
        .bind(transfer.block_number as i64)
        .bind(&transfer.transaction)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn count_transfers_for_fund(&self, fund: &str) -> Result<i64, sqlx::Error> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM transfers WHERE fund = ?")
            .bind(fund)
            .fetch_one(self.pool())
            .await?;
        Ok(row.get::<i64, _>("n"))
    }
}

fn map_fund_update_row(r: sqlx::sqlite::SqliteRow) -> FundUpdate {
    FundUpdate {
        id: r.get("id"),
        fund: r.get("fund"),
        transaction: r.get("tx_id"),
        timestamp: r.get("timestamp"),
        block_number: r.get::<i64, _>("block_number") as u64,
        tokens_deposited: parse_amount(
            &r.get::<String, _>("tokens_deposited"),
            "fund_update.tokens_deposited",
        ),
        tokens_withdrawn: parse_amount(
            &r.get::<String, _>("tokens_withdrawn"),
            "fund_update.tokens_withdrawn",
        ),
        shares_minted: parse_amount(
            &r.get::<String, _>("shares_minted"),
            "fund_update.shares_minted",
        ),
        shares_burnt: parse_amount(
            &r.get::<String, _>("shares_burnt"),
            "fund_update.shares_burnt",
        ),
        price_per_share: parse_amount(
            &r.get::<String, _>("price_per_share"),
            "fund_update.price_per_share",
        ),
        total_fees: parse_amount(&r.get::<String, _>("total_fees"), "fund_update.total_fees"),
        withdrawal_fees: parse_amount(
            &r.get::<String, _>("withdrawal_fees"),
            "fund_update.withdrawal_fees",
        ),
        balance_position: parse_amount(
            &r.get::<String, _>("balance_position"),
            "fund_update.balance_position",
        ),
        returns_generated: parse_amount(
            &r.get::<String, _>("returns_generated"),
            "fund_update.returns_generated",
        ),
    }
}

fn map_transfer_row(r: sqlx::sqlite::SqliteRow) -> TransferRecord {
    TransferRecord {
        id: r.get("id"),
        from: r.get("from_account"),
        to: r.get("to_account"),
        fund: r.get("fund"),
        underlying_token: r.get("underlying_token"),
        underlying_amount: parse_amount(
            &r.get::<String, _>("underlying_amount"),
            "transfer.underlying_amount",
        ),
        share_token: r.get("share_token"),
        share_amount: parse_amount(&r.get::<String, _>("share_amount"), "transfer.share_amount"),
        timestamp: r.get("timestamp"),
        block_number: r.get::<i64, _>("block_number") as u64,
        transaction: r.get("tx_id"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;

    async fn setup() -> (Repository, tempfile::TempDir) {
        super::super::tests::setup_test_repo().await
    }

    fn test_fund_update(id: &str) -> FundUpdate {
        FundUpdate {
            id: id.to_string(),
            fund: "0xfund".to_string(),
            transaction: "0xaaa".to_string(),
            timestamp: 1_700_000_000,
            block_number: 100,
            tokens_deposited: U256::from(1000u64),
            tokens_withdrawn: U256::ZERO,
            shares_minted: U256::from(1000u64),
            shares_burnt: U256::ZERO,
            price_per_share: U256::from(1u64),
            total_fees: U256::ZERO,
            withdrawal_fees: U256::ZERO,
            balance_position: U256::from(1000u64),
            returns_generated: U256::ZERO,
        }
    }

    #[tokio::test]
    async fn test_fund_update_roundtrip_and_idempotency() {
        let (repo, _temp) = setup().await;
        let update = test_fund_update("fu-1");

        assert!(repo.insert_fund_update(&update).await.unwrap());
        assert!(!repo.insert_fund_update(&update).await.unwrap());

        let loaded = repo.get_fund_update("fu-1").await.unwrap().unwrap();
        assert_eq!(loaded, update);
    }

    #[tokio::test]
    async fn test_fund_updates_in_chain_order() {
        let (repo, _temp) = setup().await;
        let mut later = test_fund_update("fu-2");
        later.block_number = 200;
        repo.insert_fund_update(&later).await.unwrap();
        repo.insert_fund_update(&test_fund_update("fu-1")).await.unwrap();

        let updates = repo.query_fund_updates("0xfund").await.unwrap();
        assert_eq!(updates[0].id, "fu-1");
        assert_eq!(updates[1].id, "fu-2");
    }

    #[tokio::test]
    async fn test_transfer_dedup() {
        let (repo, _temp) = setup().await;
        let transfer = TransferRecord {
            id: "a-b-0xaaa".to_string(),
            from: "a".to_string(),
            to: "b".to_string(),
            fund: "0xfund".to_string(),
            underlying_token: "0xdai".to_string(),
            underlying_amount: U256::from(100u64),
            share_token: "0xshare".to_string(),
            share_amount: U256::from(200u64),
            timestamp: 1_700_000_000,
            block_number: 100,
            transaction: "0xaaa".to_string(),
        };

        assert!(repo.insert_transfer(&transfer).await.unwrap());
        assert!(!repo.insert_transfer(&transfer).await.unwrap());
        assert_eq!(repo.count_transfers_for_fund("0xfund").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_deposit_record_dedup() {
        let (repo, _temp) = setup().await;
        let deposit = DepositRecord {
            id: "0xfund-0xaaa".to_string(),
            fund: "0xfund".to_string(),
            account: "0xacct".to_string(),
            amount: U256::from(1000u64),
            shares_minted: U256::from(500u64),
            timestamp: 1_700_000_000,
            transaction: "0xaaa".to_string(),
            fund_update: "fu-1".to_string(),
        };

        assert!(repo.insert_deposit_record(&deposit).await.unwrap());
        assert!(!repo.insert_deposit_record(&deposit).await.unwrap());
        assert_eq!(repo.count_deposits_for_fund("0xfund").await.unwrap(), 1);
    }
}
