//! Event ingestion: pull pre-decoded events in chain order and drive the
//! reconciliation algorithms, one event at a time.
//!
//! The engine performs no reordering or buffering of its own; sources must
//! deliver ascending `(block, txIndex, logIndex)`. Delivery is at-least-once
//! and every reconciliation step is idempotent, so a re-delivered prefix is
//! harmless.

use crate::accessor::FundAccessor;
use crate::domain::{ChainId, EventOrdinal, FundEvent};
use crate::reconcile::{self, ReconcileError};
use crate::store::Repository;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

pub mod http;
pub mod mock;

pub use http::HttpEventSource;
pub use mock::MockEventSource;

/// Source of normalized fund events.
///
/// Implementations must return events at or after `from_block`, sorted in
/// chain order, and must tolerate being asked for the same range twice.
#[async_trait]
pub trait EventSource: Send + Sync + std::fmt::Debug {
    async fn fetch_events(&self, from_block: u64) -> Result<Vec<FundEvent>, EventSourceError>;
}

#[derive(Debug, Clone, Error)]
pub enum EventSourceError {
    #[error("network error: {0}")]
    Network(String),
    #[error("http error {status}: {message}")]
    Http { status: u16, message: String },
    #[error("parse error: {0}")]
    Parse(String),
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Source(#[from] EventSourceError),
    #[error(transparent)]
    Store(#[from] sqlx::Error),
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}

#[derive(Debug)]
pub struct BatchResult {
    pub fetched: usize,
    pub processed: usize,
    pub cursor: Option<EventOrdinal>,
}

/// Sequential event processor: one in-flight reconciliation step at a time,
/// cursor persisted after each batch.
pub struct Processor {
    source: Arc<dyn EventSource>,
    accessor: Arc<dyn FundAccessor>,
    repo: Arc<Repository>,
    chain_id: ChainId,
}

impl Processor {
    pub fn new(
        source: Arc<dyn EventSource>,
        accessor: Arc<dyn FundAccessor>,
        repo: Arc<Repository>,
        chain_id: ChainId,
    ) -> Self {
        Self {
            source,
            accessor,
            repo,
            chain_id,
        }
    }

    /// Fetch one batch from the cursor onward and apply it.
    pub async fn run_once(&self) -> Result<BatchResult, IngestError> {
        let cursor = self.repo.get_cursor(&self.chain_id).await?;
        let from_block = cursor.map(|c| c.block_number).unwrap_or(0);

        let events = self.source.fetch_events(from_block).await?;
        let fetched = events.len();

        let mut processed = 0usize;
        let mut high_water = cursor;
        let mut previous: Option<EventOrdinal> = None;

        for event in &events {
            let ordinal = event.ordinal();
            if let Some(prev) = previous {
                if ordinal < prev {
                    warn!(
                        %ordinal,
                        previous = %prev,
                        kind = event.kind(),
                        "Source delivered events out of chain order"
                    );
                }
            }
            previous = Some(ordinal);

            // Events at or before the cursor are re-deliveries; processing
            // them again is safe because every step is idempotent.
            reconcile::process_event(&self.repo, self.accessor.as_ref(), &self.chain_id, event)
                .await?;
            processed += 1;

            if Some(ordinal) > high_water {
                high_water = Some(ordinal);
            }
        }

        if high_water != cursor {
            if let Some(ordinal) = high_water {
                self.repo.set_cursor(&self.chain_id, ordinal).await?;
            }
        }

        Ok(BatchResult {
            fetched,
            processed,
            cursor: high_water,
        })
    }

    /// Poll forever at the given interval.
    pub async fn run(&self, poll_interval: Duration) {
        loop {
            match self.run_once().await {
                Ok(batch) if batch.processed > 0 => {
                    info!(
                        processed = batch.processed,
                        cursor = ?batch.cursor,
                        "Processed event batch"
                    );
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "Ingestion pass failed, retrying next interval");
                }
            }
            tokio::time::sleep(poll_interval).await;
        }
    }
}
