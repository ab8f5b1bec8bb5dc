//! Time-bounded cache of the last successful location detection.

use std::sync::Arc;

use altrun_core::DetectedLocation;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::kv::KeyValueStore;

pub const DEFAULT_CACHE_TTL_HOURS: i64 = 24;

const CACHE_KEY: &str = "altrun.location.cache";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedLocationEntry {
    pub payload: DetectedLocation,
    pub captured_at: DateTime<Utc>,
}

pub struct LocationCache {
    store: Arc<dyn KeyValueStore>,
    ttl: Duration,
}

impl LocationCache {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_ttl(store, Duration::hours(DEFAULT_CACHE_TTL_HOURS))
    }

    #[must_use]
    pub fn with_ttl(store: Arc<dyn KeyValueStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Returns the cached location if it is still fresh.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing store fails.
    pub fn read(&self) -> Result<Option<DetectedLocation>, StoreError> {
        self.read_at(Utc::now())
    }

    /// [`read`](Self::read) against an explicit clock.
    ///
    /// Entries aged `ttl` or more, and entries that no longer decode, are
    /// deleted and reported as absent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing store fails.
    pub fn read_at(&self, now: DateTime<Utc>) -> Result<Option<DetectedLocation>, StoreError> {
        let Some(raw) = self.store.get(CACHE_KEY)? else {
            return Ok(None);
        };

        let entry = match serde_json::from_str::<CachedLocationEntry>(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "discarding undecodable location cache entry");
                self.store.delete(CACHE_KEY)?;
                return Ok(None);
            }
        };

        if now - entry.captured_at >= self.ttl {
            tracing::debug!(captured_at = %entry.captured_at, "location cache entry expired");
            self.store.delete(CACHE_KEY)?;
            return Ok(None);
        }

        Ok(Some(entry.payload))
    }

    /// Stores `location`, replacing any previous entry.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the entry cannot be encoded or stored.
    pub fn write(&self, location: &DetectedLocation) -> Result<(), StoreError> {
        self.write_at(location, Utc::now())
    }

    /// [`write`](Self::write) with an explicit capture time.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the entry cannot be encoded or stored.
    pub fn write_at(
        &self,
        location: &DetectedLocation,
        captured_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let entry = CachedLocationEntry {
            payload: location.clone(),
            captured_at,
        };
        let raw = serde_json::to_string(&entry).map_err(|source| StoreError::Json {
            context: CACHE_KEY.to_owned(),
            source,
        })?;
        self.store.set(CACHE_KEY, &raw)
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing store fails.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.store.delete(CACHE_KEY)
    }
}

#[cfg(test)]
mod tests {
    use altrun_core::{Accuracy, Country};
    use chrono::TimeZone;

    use super::*;
    use crate::kv::MemoryStore;

    fn montreal() -> DetectedLocation {
        DetectedLocation {
            latitude: 45.5019,
            longitude: -73.5674,
            country: Country::Can,
            state: "QC".to_owned(),
            city: "Montreal".to_owned(),
            accuracy: Accuracy::City,
            candidate_cities: vec!["Montreal".to_owned()],
        }
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap()
    }

    fn cache() -> (Arc<MemoryStore>, LocationCache) {
        let store = Arc::new(MemoryStore::new());
        let cache = LocationCache::new(store.clone());
        (store, cache)
    }

    #[test]
    fn write_then_read_returns_same_location() {
        let (_, cache) = cache();
        cache.write_at(&montreal(), noon()).unwrap();
        assert_eq!(cache.read_at(noon()).unwrap(), Some(montreal()));
    }

    #[test]
    fn read_just_before_ttl_is_fresh() {
        let (_, cache) = cache();
        cache.write_at(&montreal(), noon()).unwrap();
        let almost = noon() + Duration::hours(24) - Duration::seconds(1);
        assert!(cache.read_at(almost).unwrap().is_some());
    }

    #[test]
    fn read_at_ttl_boundary_evicts_entry() {
        let (store, cache) = cache();
        cache.write_at(&montreal(), noon()).unwrap();
        let expired = noon() + Duration::hours(24);
        assert_eq!(cache.read_at(expired).unwrap(), None);
        assert_eq!(store.get(CACHE_KEY).unwrap(), None, "entry should be purged");
    }

    #[test]
    fn write_overwrites_previous_entry_with_fresh_timestamp() {
        let (_, cache) = cache();
        cache.write_at(&montreal(), noon()).unwrap();
        let mut toronto = montreal();
        toronto.state = "ON".to_owned();
        toronto.city = "Toronto".to_owned();
        let later = noon() + Duration::hours(20);
        cache.write_at(&toronto, later).unwrap();

        // Past the first entry's expiry but within the second's.
        let read = cache.read_at(noon() + Duration::hours(30)).unwrap();
        assert_eq!(read.map(|l| l.city), Some("Toronto".to_owned()));
    }

    #[test]
    fn undecodable_entry_is_purged() {
        let (store, cache) = cache();
        store.set(CACHE_KEY, "{\"garbage\":true}").unwrap();
        assert_eq!(cache.read_at(noon()).unwrap(), None);
        assert_eq!(store.get(CACHE_KEY).unwrap(), None);
    }

    #[test]
    fn clear_removes_entry() {
        let (_, cache) = cache();
        cache.write_at(&montreal(), noon()).unwrap();
        cache.clear().unwrap();
        assert_eq!(cache.read_at(noon()).unwrap(), None);
    }

    #[test]
    fn custom_ttl_is_respected() {
        let store = Arc::new(MemoryStore::new());
        let cache = LocationCache::with_ttl(store, Duration::hours(1));
        cache.write_at(&montreal(), noon()).unwrap();
        assert!(cache.read_at(noon() + Duration::hours(2)).unwrap().is_none());
    }
}
