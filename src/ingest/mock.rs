//! Mock event source for testing without an indexer.

use super::{EventSource, EventSourceError};
use crate::domain::{sort_events_chain_order, FundEvent};
use async_trait::async_trait;

/// Mock event source serving a predefined, chain-ordered event list.
#[derive(Debug, Clone, Default)]
pub struct MockEventSource {
    events: Vec<FundEvent>,
}

impl MockEventSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_event(mut self, event: FundEvent) -> Self {
        self.events.push(event);
        sort_events_chain_order(&mut self.events);
        self
    }

    pub fn with_events(mut self, events: Vec<FundEvent>) -> Self {
        self.events.extend(events);
        sort_events_chain_order(&mut self.events);
        self
    }
}

#[async_trait]
impl EventSource for MockEventSource {
    async fn fetch_events(&self, from_block: u64) -> Result<Vec<FundEvent>, EventSourceError> {
        Ok(self
            .events
            .iter()
            .filter(|e| e.meta().block_number >= from_block)
            .cloned()
            .collect())
    }
}
