//! Consent-aware, cached location resolution.

use altrun_core::{DetectedLocation, LocationPreferences};
use altrun_store::{LocationCache, LocationPreferenceStore};

use crate::detector::LocationDetector;

pub struct LocationService {
    detector: LocationDetector,
    cache: LocationCache,
    preferences: LocationPreferenceStore,
}

impl LocationService {
    #[must_use]
    pub fn new(
        detector: LocationDetector,
        cache: LocationCache,
        preferences: LocationPreferenceStore,
    ) -> Self {
        Self {
            detector,
            cache,
            preferences,
        }
    }

    #[must_use]
    pub fn preferences(&self) -> &LocationPreferenceStore {
        &self.preferences
    }

    #[must_use]
    pub fn cache(&self) -> &LocationCache {
        &self.cache
    }

    /// Resolves the visitor's location for this session.
    ///
    /// Returns `None` without touching the network when the visitor has not
    /// allowed detection. Otherwise serves a fresh cache entry, or runs the
    /// detector and caches a successful result. Storage failures are logged
    /// and treated as a cache miss.
    pub async fn resolve(&self) -> Option<DetectedLocation> {
        let prefs = self.preferences.load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not load location preferences, using defaults");
            LocationPreferences::default()
        });
        if !prefs.detection_allowed() {
            tracing::info!("location auto-detection disabled by visitor");
            return None;
        }

        match self.cache.read() {
            Ok(Some(location)) => {
                tracing::debug!(city = %location.city, "using cached location");
                return Some(location);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "location cache unreadable"),
        }

        let location = self.detector.detect().await?;
        if let Err(e) = self.cache.write(&location) {
            tracing::warn!(error = %e, "could not cache detected location");
        }
        Some(location)
    }

    /// Drops any cached location and detects again.
    pub async fn refresh(&self) -> Option<DetectedLocation> {
        if let Err(e) = self.cache.clear() {
            tracing::warn!(error = %e, "could not clear location cache");
        }
        self.resolve().await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use altrun_core::{Accuracy, Country};
    use altrun_store::{KeyValueStore, MemoryStore, StoreError};
    use async_trait::async_trait;

    use super::*;
    use crate::detector::DetectorConfig;
    use crate::error::LocationError;
    use crate::providers::{IpGeolocation, IpLocation, NoDeviceGeolocation, ReverseGeocode, ReverseGeocoder};

    struct CountingIp(AtomicUsize);

    #[async_trait]
    impl IpGeolocation for CountingIp {
        async fn locate(&self) -> Result<IpLocation, LocationError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(IpLocation {
                latitude: 49.28,
                longitude: -123.12,
                country_code: "CA".to_owned(),
                region: "British Columbia".to_owned(),
                city: "Vancouver".to_owned(),
            })
        }
    }

    struct NoReverse;

    #[async_trait]
    impl ReverseGeocoder for NoReverse {
        async fn reverse(&self, _lat: f64, _lon: f64) -> Result<ReverseGeocode, LocationError> {
            Err(LocationError::PermissionDenied)
        }
    }

    /// Every operation fails.
    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Poisoned)
        }
        fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Poisoned)
        }
        fn delete(&self, _key: &str) -> Result<(), StoreError> {
            Err(StoreError::Poisoned)
        }
    }

    /// Reads as empty, rejects writes.
    struct ReadOnlyStore;

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Ok(None)
        }
        fn set(&self, key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Io {
                path: key.to_owned(),
                source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            })
        }
        fn delete(&self, _key: &str) -> Result<(), StoreError> {
            Ok(())
        }
    }

    fn service() -> (LocationService, Arc<CountingIp>) {
        service_over(Arc::new(MemoryStore::new()))
    }

    fn service_over(kv: Arc<dyn KeyValueStore>) -> (LocationService, Arc<CountingIp>) {
        let ip = Arc::new(CountingIp(AtomicUsize::new(0)));
        let detector = LocationDetector::new(
            Arc::new(NoDeviceGeolocation),
            ip.clone(),
            Arc::new(NoReverse),
            DetectorConfig::default(),
        );
        let service = LocationService::new(
            detector,
            LocationCache::new(Arc::clone(&kv)),
            LocationPreferenceStore::new(kv),
        );
        (service, ip)
    }

    #[tokio::test]
    async fn resolve_detects_and_caches() {
        let (service, ip) = service();
        let loc = service.resolve().await.expect("should detect");
        assert_eq!(loc.country, Country::Can);
        assert_eq!(loc.state, "BC");
        assert_eq!(loc.accuracy, Accuracy::City);
        assert_eq!(service.cache().read().unwrap(), Some(loc));
        assert_eq!(ip.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn second_resolve_is_served_from_cache() {
        let (service, ip) = service();
        service.resolve().await.unwrap();
        service.resolve().await.unwrap();
        assert_eq!(ip.0.load(Ordering::SeqCst), 1, "second call should hit cache");
    }

    #[tokio::test]
    async fn refresh_bypasses_cache() {
        let (service, ip) = service();
        service.resolve().await.unwrap();
        service.refresh().await.unwrap();
        assert_eq!(ip.0.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn opted_out_visitor_is_never_located() {
        let (service, ip) = service();
        service.preferences().disable_auto_detect().unwrap();
        assert!(service.resolve().await.is_none());
        assert_eq!(ip.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unreadable_store_still_detects() {
        let (service, ip) = service_over(Arc::new(BrokenStore));
        let loc = service.resolve().await.expect("store errors must not block detection");
        assert_eq!(loc.city, "Vancouver");
        assert_eq!(ip.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_cache_write_still_returns_location() {
        let (service, ip) = service_over(Arc::new(ReadOnlyStore));
        assert!(service.resolve().await.is_some());
        assert!(service.resolve().await.is_some());
        assert_eq!(ip.0.load(Ordering::SeqCst), 2, "nothing was cached");
    }

    #[tokio::test]
    async fn refresh_survives_failed_clear() {
        let (service, _ip) = service_over(Arc::new(BrokenStore));
        assert!(service.refresh().await.is_some());
    }
}
