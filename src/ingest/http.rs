//! HTTP polling event source.
//!
//! Polls an indexer endpoint that serves pre-decoded, chain-ordered events
//! as JSON. Transient transport failures are retried with exponential
//! backoff; a malformed body is a permanent error for the batch.

use super::{EventSource, EventSourceError};
use crate::domain::FundEvent;
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct HttpEventSource {
    client: Client,
    base_url: String,
    chain_id: String,
}

impl HttpEventSource {
    pub fn new(base_url: String, chain_id: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
            chain_id,
        }
    }
}

#[async_trait]
impl EventSource for HttpEventSource {
    async fn fetch_events(&self, from_block: u64) -> Result<Vec<FundEvent>, EventSourceError> {
        let url = format!(
            "{}/events?chainId={}&fromBlock={}",
            self.base_url, self.chain_id, from_block
        );
        debug!(%url, "Fetching event batch");

        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(30)),
            ..Default::default()
        };

        let body = retry(backoff, || async {
            let response = self.client.get(&url).send().await.map_err(|e| {
                backoff::Error::transient(EventSourceError::Network(e.to_string()))
            })?;

            let status = response.status();
            if status.as_u16() == 429 || status.is_server_error() {
                return Err(backoff::Error::transient(EventSourceError::Http {
                    status: status.as_u16(),
                    message: "retryable".to_string(),
                }));
            }
            if !status.is_success() {
                return Err(backoff::Error::permanent(EventSourceError::Http {
                    status: status.as_u16(),
                    message: "client error".to_string(),
                }));
            }

            response
                .json::<Vec<FundEvent>>()
                .await
                .map_err(|e| backoff::Error::permanent(EventSourceError::Parse(e.to_string())))
        })
        .await?;

        Ok(body)
    }
}
