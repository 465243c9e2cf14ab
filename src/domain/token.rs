//! ERC20 metadata cache and normalized transaction entities.

use crate::domain::ids;
use alloy_primitives::{Address, B256};

/// Cached ERC20-like metadata. Created lazily on first reference and
/// immutable afterwards; failed metadata reads leave the defaults in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub address: Address,
    pub decimals: u8,
    pub name: String,
    pub symbol: String,
}

impl Token {
    pub fn id(&self) -> String {
        ids::address_id(&self.address)
    }
}

/// A normalized on-chain transaction, created once per hash referenced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRecord {
    pub hash: B256,
    pub block_number: u64,
    pub timestamp: i64,
    pub index: u64,
}

impl TransactionRecord {
    pub fn id(&self) -> String {
        ids::tx_hash_id(&self.hash)
    }
}
