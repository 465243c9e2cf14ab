//! Normalized on-chain events consumed by the reconciliation engine.
//!
//! Decoding from raw logs happens upstream; events arrive here fully
//! structured, in chain order, with at-least-once delivery.

use crate::domain::{EventOrdinal, Timestamp};
use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

/// Transaction metadata shared by every event kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMeta {
    /// The fund contract that emitted the event.
    pub fund: Address,
    pub tx_hash: B256,
    pub tx_index: u64,
    pub log_index: u64,
    pub block_number: u64,
    /// Block timestamp, seconds.
    pub timestamp: i64,
}

impl EventMeta {
    pub fn ordinal(&self) -> EventOrdinal {
        EventOrdinal::new(self.block_number, self.tx_index, self.log_index)
    }

    pub fn timestamp(&self) -> Timestamp {
        Timestamp::new(self.timestamp)
    }
}

/// A single normalized event from a tracked fund contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum FundEvent {
    /// A brand-new fund contract came under tracking.
    FundRegistered { meta: EventMeta },
    /// Underlying tokens entered the fund; shares were minted.
    Deposit {
        meta: EventMeta,
        beneficiary: Address,
        amount: U256,
    },
    /// Underlying tokens left the fund; shares were burnt.
    Withdraw {
        meta: EventMeta,
        beneficiary: Address,
        amount: U256,
        fee: U256,
    },
    /// Peer-to-peer share movement.
    Transfer {
        meta: EventMeta,
        from: Address,
        to: Address,
        value: U256,
    },
    /// Fee harvest: reported value and price move, supply does not.
    HardWork {
        meta: EventMeta,
        total_value_locked: U256,
        price_per_share: U256,
    },
    /// Governance changed the fund's withdrawal fee.
    WithdrawalFeeUpdated { meta: EventMeta, withdrawal_fee_bps: u32 },
}

impl FundEvent {
    pub fn meta(&self) -> &EventMeta {
        match self {
            FundEvent::FundRegistered { meta }
            | FundEvent::Deposit { meta, .. }
            | FundEvent::Withdraw { meta, .. }
            | FundEvent::Transfer { meta, .. }
            | FundEvent::HardWork { meta, .. }
            | FundEvent::WithdrawalFeeUpdated { meta, .. } => meta,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            FundEvent::FundRegistered { .. } => "fundRegistered",
            FundEvent::Deposit { .. } => "deposit",
            FundEvent::Withdraw { .. } => "withdraw",
            FundEvent::Transfer { .. } => "transfer",
            FundEvent::HardWork { .. } => "hardWork",
            FundEvent::WithdrawalFeeUpdated { .. } => "withdrawalFeeUpdated",
        }
    }

    pub fn ordinal(&self) -> EventOrdinal {
        self.meta().ordinal()
    }
}

/// Sort events into chain order. Sources are expected to deliver ordered
/// batches already; this is the canonical key they must agree on.
pub fn sort_events_chain_order(events: &mut [FundEvent]) {
    events.sort_by_key(|e| e.ordinal());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn meta(block: u64, tx_index: u64, log_index: u64) -> EventMeta {
        EventMeta {
            fund: Address::from_str("0x2222222222222222222222222222222222222222").unwrap(),
            tx_hash: B256::repeat_byte(1),
            tx_index,
            log_index,
            block_number: block,
            timestamp: 1_700_000_000,
        }
    }

    #[test]
    fn test_event_serde_roundtrip() {
        let event = FundEvent::Deposit {
            meta: meta(100, 0, 2),
            beneficiary: Address::from_str("0x1111111111111111111111111111111111111111")
                .unwrap(),
            amount: U256::from(1000u64),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"kind\":\"deposit\""));
        let back: FundEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, back);
    }

    #[test]
    fn test_sort_events_chain_order() {
        let mut events = vec![
            FundEvent::FundRegistered { meta: meta(101, 0, 0) },
            FundEvent::FundRegistered { meta: meta(100, 1, 0) },
            FundEvent::FundRegistered { meta: meta(100, 0, 3) },
        ];
        sort_events_chain_order(&mut events);
        let ordinals: Vec<_> = events.iter().map(|e| e.ordinal()).collect();
        assert_eq!(ordinals[0], EventOrdinal::new(100, 0, 3));
        assert_eq!(ordinals[1], EventOrdinal::new(100, 1, 0));
        assert_eq!(ordinals[2], EventOrdinal::new(101, 0, 0));
    }

    #[test]
    fn test_kind_labels() {
        let event = FundEvent::HardWork {
            meta: meta(1, 0, 0),
            total_value_locked: U256::ZERO,
            price_per_share: U256::ZERO,
        };
        assert_eq!(event.kind(), "hardWork");
    }
}
