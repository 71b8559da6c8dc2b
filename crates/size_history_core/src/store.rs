//! Size-history store contract and an in-memory implementation.

use std::collections::BTreeMap;
use std::sync::Mutex;

use thiserror::Error;

use crate::contract::{ObservationKey, SizeObservation};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("observation {0} already exists")]
    DuplicateKey(ObservationKey),
    #[error("failed to write observation: {0}")]
    Write(String),
    #[error("failed to query observations: {0}")]
    Query(String),
}

/// Append-only store of [`SizeObservation`] records.
pub trait SizeHistoryStore {
    /// Persists a new observation. Rejects an existing `(container_id, observed_at)` pair.
    fn append(&self, observation: &SizeObservation) -> Result<(), StoreError>;

    /// Returns observations with `from_ms <= observed_at <= to_ms`, ascending by time.
    fn query_range(
        &self,
        container_id: &str,
        from_ms: i64,
        to_ms: i64,
    ) -> Result<Vec<SizeObservation>, StoreError>;

    /// Returns the observation with the largest `total_size_bytes`, if any.
    fn query_max(&self, container_id: &str) -> Result<Option<SizeObservation>, StoreError>;
}

#[derive(Debug, Default)]
pub struct InMemorySizeHistoryStore {
    records: Mutex<BTreeMap<ObservationKey, SizeObservation>>,
}

impl InMemorySizeHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.lock().map_err(StoreError::Query)?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, BTreeMap<ObservationKey, SizeObservation>>, String> {
        self.records
            .lock()
            .map_err(|_| "in-memory store lock poisoned".to_string())
    }
}

impl SizeHistoryStore for InMemorySizeHistoryStore {
    fn append(&self, observation: &SizeObservation) -> Result<(), StoreError> {
        let mut records = self.lock().map_err(StoreError::Write)?;
        let key = observation.key();
        if records.contains_key(&key) {
            return Err(StoreError::DuplicateKey(key));
        }
        records.insert(key, observation.clone());
        Ok(())
    }

    fn query_range(
        &self,
        container_id: &str,
        from_ms: i64,
        to_ms: i64,
    ) -> Result<Vec<SizeObservation>, StoreError> {
        if from_ms > to_ms {
            return Ok(Vec::new());
        }
        let records = self.lock().map_err(StoreError::Query)?;
        let start = ObservationKey {
            container_id: container_id.to_string(),
            observed_at: from_ms,
        };
        let end = ObservationKey {
            container_id: container_id.to_string(),
            observed_at: to_ms,
        };
        Ok(records
            .range(start..=end)
            .map(|(_, observation)| observation.clone())
            .collect())
    }

    fn query_max(&self, container_id: &str) -> Result<Option<SizeObservation>, StoreError> {
        let records = self.lock().map_err(StoreError::Query)?;
        // Ties resolve to the most recent observation.
        Ok(records
            .values()
            .filter(|observation| observation.container_id == container_id)
            .max_by_key(|observation| (observation.total_size_bytes, observation.observed_at))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observation(container_id: &str, observed_at: i64, size: u64) -> SizeObservation {
        SizeObservation {
            container_id: container_id.to_string(),
            observed_at,
            total_size_bytes: size,
            object_count: 1,
        }
    }

    #[test]
    fn exact_range_returns_appended_observation() {
        let store = InMemorySizeHistoryStore::new();
        let recorded = observation("bucket-a", 1_700_000_000_123, 512);
        store.append(&recorded).expect("append should succeed");
        store
            .append(&observation("bucket-a", 1_700_000_000_124, 600))
            .expect("append should succeed");

        let found = store
            .query_range("bucket-a", recorded.observed_at, recorded.observed_at)
            .expect("query should succeed");
        assert_eq!(found, vec![recorded]);
    }

    #[test]
    fn rejects_duplicate_timestamp_and_keeps_original() {
        let store = InMemorySizeHistoryStore::new();
        store
            .append(&observation("bucket-a", 10, 100))
            .expect("first append should succeed");

        let error = store
            .append(&observation("bucket-a", 10, 999))
            .expect_err("duplicate key should fail");
        assert!(matches!(error, StoreError::DuplicateKey(_)));

        let found = store.query_range("bucket-a", 10, 10).expect("query");
        assert_eq!(found[0].total_size_bytes, 100);
    }

    #[test]
    fn range_excludes_other_containers_and_is_sorted() {
        let store = InMemorySizeHistoryStore::new();
        for record in [
            observation("bucket-a", 30, 3),
            observation("bucket-b", 20, 9),
            observation("bucket-a", 10, 1),
            observation("bucket-a", 50, 5),
        ] {
            store.append(&record).expect("append");
        }

        let found = store.query_range("bucket-a", 0, 40).expect("query");
        let times: Vec<i64> = found.iter().map(|record| record.observed_at).collect();
        assert_eq!(times, vec![10, 30]);
    }

    #[test]
    fn poisoned_lock_is_reported_by_len() {
        let store = InMemorySizeHistoryStore::new();
        store.append(&observation("bucket-a", 1, 1)).expect("append");
        assert_eq!(store.len(), Ok(1));

        let poisoned = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = store.records.lock().expect("first lock");
            panic!("poison the store lock");
        }));
        assert!(poisoned.is_err());

        assert!(matches!(store.len(), Err(StoreError::Query(_))));
        assert!(store.is_empty().is_err());
    }

    #[test]
    fn empty_range_is_not_an_error() {
        let store = InMemorySizeHistoryStore::new();
        assert!(store.query_range("bucket-a", 0, 100).expect("query").is_empty());
        assert!(store.query_range("bucket-a", 100, 0).expect("query").is_empty());
    }

    #[test]
    fn query_max_picks_largest_size_for_container() {
        let store = InMemorySizeHistoryStore::new();
        for record in [
            observation("bucket-a", 1, 100_000),
            observation("bucket-a", 2, 250_000),
            observation("bucket-a", 3, 150_000),
            observation("bucket-b", 4, 900_000),
        ] {
            store.append(&record).expect("append");
        }

        let max = store.query_max("bucket-a").expect("query").expect("some max");
        assert_eq!(max.total_size_bytes, 250_000);
        assert_eq!(max.observed_at, 2);
        assert_eq!(store.query_max("bucket-c").expect("query"), None);
    }
}
