use crate::api::AppState;
use crate::error::AppError;
use axum::extract::State;
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainDto {
    pub id: String,
    pub total_value_locked: String,
    pub funds_count: u64,
}

pub async fn get_chain(State(state): State<AppState>) -> Result<Json<ChainDto>, AppError> {
    let chain = state
        .repo
        .get_chain(&state.chain_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("chain {} not tracked yet", state.chain_id)))?;

    Ok(Json(ChainDto {
        id: chain.id.to_string(),
        total_value_locked: chain.total_value_locked.to_string(),
        funds_count: chain.funds_count,
    }))
}
