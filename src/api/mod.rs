//! Read-only query surface over the reconstructed ledger.
//!
//! Persisted entity fields are exposed verbatim (camelCase) for downstream
//! consumers; amounts serialize as decimal strings.

pub mod chain;
pub mod funds;
pub mod health;
pub mod positions;

use crate::domain::ChainId;
use crate::store::Repository;
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub chain_id: ChainId,
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/v1/chain", get(chain::get_chain))
        .route("/v1/funds", get(funds::list_funds))
        .route("/v1/funds/:address", get(funds::get_fund))
        .route("/v1/funds/:address/updates", get(funds::get_fund_updates))
        .route(
            "/v1/accounts/:address/positions",
            get(positions::get_account_positions),
        )
        .route(
            "/v1/positions/:account/:fund/updates",
            get(positions::get_position_updates),
        )
        .layer(cors)
        .with_state(state)
}
