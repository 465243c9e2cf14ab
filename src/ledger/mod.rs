//! The core ledger: position tracking, fund update chains and the share
//! transfer ledger.
//!
//! Everything here is driven by the reconciliation algorithms in
//! [`crate::reconcile`], one event at a time, strictly sequentially. The
//! update chains are append-only; aggregates mutate in place under the
//! single-writer guarantee.

pub mod fund_update;
pub mod position;
pub mod position_update;
pub mod transfer;

pub use position::PositionStep;
pub use position_update::StepDeltas;
