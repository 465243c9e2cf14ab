use crate::api::funds::normalize_address;
use crate::api::AppState;
use crate::domain::{AccountFundPosition, AccountFundPositionUpdate};
use crate::error::AppError;
use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionDto {
    pub id: String,
    pub account: String,
    pub fund: String,
    pub underlying_token: String,
    pub share_token: String,
    pub balance_shares: String,
    pub balance_tokens: String,
    pub balance_position: String,
    pub balance_profit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_update: Option<String>,
}

impl From<AccountFundPosition> for PositionDto {
    fn from(position: AccountFundPosition) -> Self {
        PositionDto {
            id: position.id(),
            account: crate::domain::ids::address_id(&position.account),
            fund: crate::domain::ids::address_id(&position.fund),
            underlying_token: position.underlying_token,
            share_token: position.share_token,
            balance_shares: position.balance_shares.to_string(),
            balance_tokens: position.balance_tokens.to_string(),
            balance_position: position.balance_position.to_string(),
            balance_profit: position.balance_profit.to_string(),
            latest_update: position.latest_update,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionUpdateDto {
    pub id: String,
    pub order: u64,
    pub account: String,
    pub account_fund_position: String,
    pub transaction: String,
    pub timestamp: i64,
    pub block_number: u64,
    pub deposits: String,
    pub withdrawals: String,
    pub shares_minted: String,
    pub shares_burnt: String,
    pub shares_sent: String,
    pub shares_received: String,
    pub tokens_sent: String,
    pub tokens_received: String,
    pub balance_shares: String,
    pub balance_position: String,
    pub fund_update: String,
}

impl From<AccountFundPositionUpdate> for PositionUpdateDto {
    fn from(update: AccountFundPositionUpdate) -> Self {
        PositionUpdateDto {
            id: update.id,
            order: update.order,
            account: update.account,
            account_fund_position: update.account_fund_position,
            transaction: update.transaction,
            timestamp: update.timestamp,
            block_number: update.block_number,
            deposits: update.deposits.to_string(),
            withdrawals: update.withdrawals.to_string(),
            shares_minted: update.shares_minted.to_string(),
            shares_burnt: update.shares_burnt.to_string(),
            shares_sent: update.shares_sent.to_string(),
            shares_received: update.shares_received.to_string(),
            tokens_sent: update.tokens_sent.to_string(),
            tokens_received: update.tokens_received.to_string(),
            balance_shares: update.balance_shares.to_string(),
            balance_position: update.balance_position.to_string(),
            fund_update: update.fund_update,
        }
    }
}

pub async fn get_account_positions(
    Path(address): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Vec<PositionDto>>, AppError> {
    let account_id = normalize_address(&address)?;
    let positions = state.repo.query_positions_for_account(&account_id).await?;
    Ok(Json(positions.into_iter().map(PositionDto::from).collect()))
}

pub async fn get_position_updates(
    Path((account, fund)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<Json<Vec<PositionUpdateDto>>, AppError> {
    let account_id = normalize_address(&account)?;
    let fund_id = normalize_address(&fund)?;
    let position_id = format!("{}-{}", account_id, fund_id);
    let updates = state.repo.query_position_updates(&position_id).await?;
    Ok(Json(
        updates.into_iter().map(PositionUpdateDto::from).collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, U256};

    #[test]
    fn test_position_update_dto_field_names() {
        let update = AccountFundPositionUpdate {
            id: "a-f-0".to_string(),
            order: 0,
            account: "a".to_string(),
            account_fund_position: "a-f".to_string(),
            transaction: "0xaaa".to_string(),
            timestamp: 1_700_000_000,
            block_number: 100,
            deposits: U256::from(100u64),
            withdrawals: U256::ZERO,
            shares_minted: U256::from(100u64),
            shares_burnt: U256::ZERO,
            shares_sent: U256::ZERO,
            shares_received: U256::ZERO,
            tokens_sent: U256::ZERO,
            tokens_received: U256::ZERO,
            balance_shares: U256::from(100u64),
            balance_position: U256::from(100u64),
            fund_update: "fu".to_string(),
        };
        let json = serde_json::to_value(PositionUpdateDto::from(update)).unwrap();
        assert_eq!(json["order"], 0);
        assert_eq!(json["sharesMinted"], "100");
        assert_eq!(json["accountFundPosition"], "a-f");
        assert_eq!(json["fundUpdate"], "fu");
    }

    #[test]
    fn test_position_dto_field_names() {
        let position = AccountFundPosition {
            account: Address::repeat_byte(0x11),
            fund: Address::repeat_byte(0x22),
            underlying_token: "0xdai".to_string(),
            share_token: "0xshare".to_string(),
            transaction: "0xaaa".to_string(),
            balance_shares: U256::from(5u64),
            balance_tokens: U256::from(6u64),
            balance_position: U256::from(7u64),
            balance_profit: U256::ZERO,
            latest_update: None,
        };
        let json = serde_json::to_value(PositionDto::from(position)).unwrap();
        assert_eq!(json["balanceShares"], "5");
        assert_eq!(json["balanceTokens"], "6");
        assert_eq!(json["balancePosition"], "7");
        assert!(json.get("latestUpdate").is_none());
    }
}
