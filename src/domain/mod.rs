//! Domain types for the vault ledger reconciliation engine.
//!
//! This module provides:
//! - Chain coordinate primitives: Timestamp, ChainId, EventOrdinal
//! - Exact U256 amount arithmetic (truncating mul_div, clamped subtraction)
//! - Normalized fund events and their canonical chain ordering
//! - Deterministic entity-id formulas
//! - The persisted entities: funds, chains, positions, update chains and
//!   immutable event records

pub mod event;
pub mod fund;
pub mod ids;
pub mod math;
pub mod position;
pub mod primitives;
pub mod records;
pub mod token;

pub use event::{sort_events_chain_order, EventMeta, FundEvent};
pub use fund::{Chain, Fund, FundUpdate};
pub use position::{AccountFundPosition, AccountFundPositionUpdate};
pub use primitives::{ChainId, EventOrdinal, Timestamp};
pub use records::{DepositRecord, HardWorkRecord, TransferRecord, WithdrawalRecord};
pub use token::{Token, TransactionRecord};
