//! Domain primitives: chain coordinates and identifiers.

use serde::{Deserialize, Serialize};

/// Block timestamp in seconds since Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn new(secs: i64) -> Self {
        Timestamp(secs)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

/// Chain identifier (e.g. "1" for mainnet).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChainId(pub String);

impl ChainId {
    pub fn new(id: String) -> Self {
        ChainId(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ChainId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position of an event within the chain: the total order events are
/// delivered in (ascending block, then transaction index, then log index).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventOrdinal {
    pub block_number: u64,
    pub tx_index: u64,
    pub log_index: u64,
}

impl EventOrdinal {
    pub fn new(block_number: u64, tx_index: u64, log_index: u64) -> Self {
        EventOrdinal {
            block_number,
            tx_index,
            log_index,
        }
    }
}

impl std::fmt::Display for EventOrdinal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.block_number, self.tx_index, self.log_index
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_ordering() {
        let t1 = Timestamp::new(1000);
        let t2 = Timestamp::new(2000);
        assert!(t1 < t2);
    }

    #[test]
    fn test_chain_id_display() {
        let id = ChainId::new("3".to_string());
        assert_eq!(id.to_string(), "3");
    }

    #[test]
    fn test_event_ordinal_total_order() {
        let a = EventOrdinal::new(10, 0, 5);
        let b = EventOrdinal::new(10, 1, 0);
        let c = EventOrdinal::new(11, 0, 0);
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn test_event_ordinal_log_index_breaks_ties() {
        let a = EventOrdinal::new(10, 2, 1);
        let b = EventOrdinal::new(10, 2, 2);
        assert!(a < b);
    }
}
