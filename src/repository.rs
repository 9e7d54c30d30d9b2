//! Device telemetry repository.
//!
//! Binds a [`SortedStore`] to a column family and a key codec and exposes the two
//! operations collaborators call: [`Repository::store`] and [`Repository::query`].
//!
//! ```no_run
//! use flowstore::{LogStore, Reading, Repository};
//!
//! let repo = Repository::new(LogStore::open("./data/flowstore")?);
//! repo.store("meter-01", &[Reading::new(1_700_000_000_000, 12)])?;
//! let readings = repo.query("meter-01", 1_699_999_000_000, 1_700_000_000_000)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use serde::{Deserialize, Serialize};

use crate::codec::{BucketInterval, KeyCodec};
use crate::ingest::{parse_store_payload, IntervalQuery, IntervalQueryResult};
use crate::query::query_interval;
use crate::reading::Reading;
use crate::store::SortedStore;
use crate::writer::{store_readings, WriteSummary};
use crate::{Error, Result};

/// Configuration for a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// Column family holding readings.
    /// Default: "cf"
    pub column_family: String,

    /// Row bucket width.
    /// Default: hour
    pub bucket_interval: BucketInterval,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            column_family: "cf".to_string(),
            bucket_interval: BucketInterval::Hour,
        }
    }
}

impl RepositoryConfig {
    pub fn from_json(body: &str) -> Result<Self> {
        serde_json::from_str(body).map_err(|e| Error::validation(format!("invalid config: {e}")))
    }
}

pub struct Repository<S> {
    store: S,
    codec: KeyCodec,
    config: RepositoryConfig,
}

impl<S: SortedStore> Repository<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            codec: KeyCodec::hourly(),
            config: RepositoryConfig::default(),
        }
    }

    /// # Errors
    ///
    /// - `Error::Validation`: empty column family
    /// - `Error::EncodingInvariant`: bucket interval offsets overflow the qualifier
    pub fn with_config(store: S, config: RepositoryConfig) -> Result<Self> {
        if config.column_family.is_empty() {
            return Err(Error::validation("column family is empty"));
        }
        let codec = KeyCodec::new(config.bucket_interval)?;
        Ok(Self {
            store,
            codec,
            config,
        })
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    pub fn backend(&self) -> &S {
        &self.store
    }

    pub fn store(&self, device_key: &str, readings: &[Reading]) -> Result<WriteSummary> {
        store_readings(
            &self.store,
            &self.codec,
            &self.config.column_family,
            device_key,
            readings,
        )
    }

    pub fn query(&self, device_key: &str, start_ms: i64, end_ms: i64) -> Result<Vec<Reading>> {
        query_interval(
            &self.store,
            &self.codec,
            &self.config.column_family,
            device_key,
            start_ms,
            end_ms,
        )
    }

    /// Store a raw `deviceKey,ts,volume,...` upload. Blank bodies store nothing.
    pub fn store_payload(&self, body: &str) -> Result<WriteSummary> {
        match parse_store_payload(body)? {
            Some(payload) => self.store(&payload.device_key, &payload.readings),
            None => Ok(WriteSummary::default()),
        }
    }

    pub fn search(&self, query: &IntervalQuery) -> Result<IntervalQueryResult> {
        let measurements = self.query(&query.device_key, query.timestamp_start, query.timestamp_end)?;
        Ok(IntervalQueryResult { measurements })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_repository_config_default() {
        let config = RepositoryConfig::default();
        assert_eq!(config.column_family, "cf");
        assert_eq!(config.bucket_interval, BucketInterval::Hour);
    }

    #[test]
    fn test_repository_config_serialization() {
        let config = RepositoryConfig {
            column_family: "readings".to_string(),
            bucket_interval: BucketInterval::Hour,
        };
        let json = serde_json::to_string(&config).unwrap();
        let deserialized = RepositoryConfig::from_json(&json).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = RepositoryConfig::from_json(r#"{"column_family":"m"}"#).unwrap();
        assert_eq!(config.column_family, "m");
        assert_eq!(config.bucket_interval, BucketInterval::Hour);
    }

    #[test]
    fn test_day_interval_rejected() {
        let config = RepositoryConfig {
            bucket_interval: BucketInterval::Day,
            ..RepositoryConfig::default()
        };
        let err = Repository::with_config(MemoryStore::new(), config).err().unwrap();
        assert!(matches!(err, Error::EncodingInvariant(_)));
    }

    #[test]
    fn test_empty_family_rejected() {
        let config = RepositoryConfig {
            column_family: String::new(),
            ..RepositoryConfig::default()
        };
        assert!(matches!(
            Repository::with_config(MemoryStore::new(), config),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_families_are_isolated() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let a = Repository::new(store.clone());
        let b = Repository::with_config(
            store,
            RepositoryConfig {
                column_family: "other".to_string(),
                ..RepositoryConfig::default()
            },
        )
        .unwrap();
        a.store("D1", &[Reading::new(1_000, 3)]).unwrap();
        assert!(b.query("D1", 0, 5_000).unwrap().is_empty());
        assert_eq!(a.query("D1", 0, 5_000).unwrap(), vec![Reading::new(1_000, 3)]);
    }

    #[test]
    fn test_payload_and_search() {
        let repo = Repository::new(MemoryStore::new());
        let summary = repo.store_payload("D1,1000,5,0,0,2000,7").unwrap();
        assert_eq!(summary, WriteSummary { written: 2, dropped: 1 });
        assert_eq!(repo.store_payload("").unwrap(), WriteSummary::default());

        let result = repo
            .search(&IntervalQuery {
                device_key: "D1".to_string(),
                timestamp_start: 0,
                timestamp_end: 2000,
            })
            .unwrap();
        assert_eq!(
            result.measurements,
            vec![Reading::new(1000, 5), Reading::new(2000, 7)]
        );
    }
}
