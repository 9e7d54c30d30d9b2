//! Flow-meter telemetry storage over a sorted key-value store.
//!
//! Readings are packed into hour-bucket rows keyed by a device digest and a
//! reverse-time bucket, so a forward range scan yields the newest readings first and
//! a bounded interval maps to a single contiguous key range.

pub mod codec;
pub mod digest;
pub mod error;
pub mod ingest;
pub mod query;
pub mod reading;
pub mod repository;
pub mod store;
pub mod writer;

pub use codec::{BucketInterval, KeyCodec, RowKey};
pub use digest::DeviceDigest;
pub use error::{Error, Result};
pub use ingest::{parse_store_payload, IntervalQuery, IntervalQueryResult, StorePayload};
pub use reading::Reading;
pub use repository::{Repository, RepositoryConfig};
pub use store::{LogStore, LogStoreConfig, MemoryStore, SortedStore, StoreError};
pub use writer::WriteSummary;
