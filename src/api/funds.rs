use crate::api::AppState;
use crate::domain::{Fund, FundUpdate};
use crate::error::AppError;
use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FundDto {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub underlying_token: String,
    pub share_token: String,
    pub balance_tokens: String,
    pub balance_tokens_idle: String,
    pub balance_tokens_invested: String,
    pub shares_supply: String,
    pub withdrawal_fee_bps: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_update: Option<String>,
}

impl From<Fund> for FundDto {
    fn from(fund: Fund) -> Self {
        FundDto {
            id: fund.id(),
            symbol: fund.symbol,
            name: fund.name,
            underlying_token: fund.underlying_token,
            share_token: fund.share_token,
            balance_tokens: fund.balance_tokens.to_string(),
            balance_tokens_idle: fund.balance_tokens_idle.to_string(),
            balance_tokens_invested: fund.balance_tokens_invested.to_string(),
            shares_supply: fund.shares_supply.to_string(),
            withdrawal_fee_bps: fund.withdrawal_fee_bps,
            latest_update: fund.latest_update,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FundUpdateDto {
    pub id: String,
    pub fund: String,
    pub transaction: String,
    pub timestamp: i64,
    pub block_number: u64,
    pub tokens_deposited: String,
    pub tokens_withdrawn: String,
    pub shares_minted: String,
    pub shares_burnt: String,
    pub price_per_share: String,
    pub total_fees: String,
    pub withdrawal_fees: String,
    pub balance_position: String,
    pub returns_generated: String,
}

impl From<FundUpdate> for FundUpdateDto {
    fn from(update: FundUpdate) -> Self {
        FundUpdateDto {
            id: update.id,
            fund: update.fund,
            transaction: update.transaction,
            timestamp: update.timestamp,
            block_number: update.block_number,
            tokens_deposited: update.tokens_deposited.to_string(),
            tokens_withdrawn: update.tokens_withdrawn.to_string(),
            shares_minted: update.shares_minted.to_string(),
            shares_burnt: update.shares_burnt.to_string(),
            price_per_share: update.price_per_share.to_string(),
            total_fees: update.total_fees.to_string(),
            withdrawal_fees: update.withdrawal_fees.to_string(),
            balance_position: update.balance_position.to_string(),
            returns_generated: update.returns_generated.to_string(),
        }
    }
}

pub async fn list_funds(State(state): State<AppState>) -> Result<Json<Vec<FundDto>>, AppError> {
    let funds = state.repo.list_funds().await?;
    Ok(Json(funds.into_iter().map(FundDto::from).collect()))
}

pub async fn get_fund(
    Path(address): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<FundDto>, AppError> {
    let id = normalize_address(&address)?;
    let fund = state
        .repo
        .get_fund(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("fund {} not tracked", id)))?;
    Ok(Json(fund.into()))
}

pub async fn get_fund_updates(
    Path(address): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Vec<FundUpdateDto>>, AppError> {
    let id = normalize_address(&address)?;
    let updates = state.repo.query_fund_updates(&id).await?;
    Ok(Json(updates.into_iter().map(FundUpdateDto::from).collect()))
}

pub(crate) fn normalize_address(raw: &str) -> Result<String, AppError> {
    use std::str::FromStr;
    let address = alloy_primitives::Address::from_str(raw)
        .map_err(|_| AppError::BadRequest(format!("invalid address: {}", raw)))?;
    Ok(crate::domain::ids::address_id(&address))
}
