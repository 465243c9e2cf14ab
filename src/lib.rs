pub mod accessor;
pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod ingest;
pub mod ledger;
pub mod reconcile;
pub mod registry;
pub mod store;

pub use accessor::{AccessorError, FundAccessor, FundReader, MockAccessor, RpcAccessor};
pub use config::Config;
pub use domain::{ChainId, EventMeta, EventOrdinal, FundEvent, Timestamp};
pub use error::AppError;
pub use ingest::{EventSource, HttpEventSource, MockEventSource, Processor};
pub use store::{init_db, Repository};
