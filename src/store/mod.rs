//! SQLite persistence for the reconstructed ledger.
//!
//! This module provides:
//! - Database initialization and schema application
//! - A repository of load-by-id / upsert-by-id operations per entity

pub mod migrations;
pub mod repo;

pub use migrations::init_db;
pub use repo::Repository;
