//! Wires configuration into concrete collaborators.

use std::sync::Arc;
use std::time::Duration;

use altrun_core::AppConfig;
use altrun_events::SupabaseClient;
use altrun_filters::SessionConfig;
use altrun_geo::{
    DetectorConfig, DeviceGeolocation, FixedDevicePosition, IpApiClient, LocationDetector,
    LocationService, NoDeviceGeolocation, NominatimClient,
};
use altrun_store::{JsonFileStore, KeyValueStore, LocationCache, LocationPreferenceStore};

pub(crate) struct AppContext {
    pub config: AppConfig,
    pub store: Arc<dyn KeyValueStore>,
    pub events: Option<Arc<SupabaseClient>>,
}

impl AppContext {
    pub(crate) fn new(config: AppConfig) -> anyhow::Result<Self> {
        let store: Arc<dyn KeyValueStore> = Arc::new(JsonFileStore::new(&config.store_path));
        let events = match &config.supabase {
            Some(supabase) => Some(Arc::new(
                SupabaseClient::new(
                    &supabase.url,
                    &supabase.anon_key,
                    config.http_timeout_secs,
                    &config.user_agent,
                )?
                .with_retry(supabase.max_retries, supabase.backoff_base_ms),
            )),
            None => None,
        };
        Ok(Self {
            config,
            store,
            events,
        })
    }

    pub(crate) fn preferences(&self) -> LocationPreferenceStore {
        LocationPreferenceStore::new(Arc::clone(&self.store))
    }

    pub(crate) fn cache(&self) -> LocationCache {
        let ttl = i64::try_from(self.config.location_cache_ttl_hours)
            .ok()
            .and_then(chrono::Duration::try_hours)
            .unwrap_or(chrono::Duration::MAX);
        LocationCache::with_ttl(Arc::clone(&self.store), ttl)
    }

    pub(crate) fn session_config(&self) -> SessionConfig {
        SessionConfig {
            default_delay: Duration::from_millis(self.config.default_filter_delay_ms),
        }
    }

    pub(crate) fn location_service(&self) -> anyhow::Result<LocationService> {
        let cfg = &self.config;
        let device: Arc<dyn DeviceGeolocation> = match cfg.device_position {
            Some((latitude, longitude)) => Arc::new(FixedDevicePosition {
                latitude,
                longitude,
            }),
            None => Arc::new(NoDeviceGeolocation),
        };
        let ip = IpApiClient::new(&cfg.ip_geolocation_url, cfg.http_timeout_secs, &cfg.user_agent)?;
        let reverse = NominatimClient::new(
            &cfg.reverse_geocode_url,
            cfg.http_timeout_secs,
            &cfg.user_agent,
        )?;

        let mut detector = LocationDetector::new(
            device,
            Arc::new(ip),
            Arc::new(reverse),
            DetectorConfig {
                geolocation_timeout: Duration::from_secs(cfg.geolocation_timeout_secs),
                geolocation_max_age: Duration::from_secs(cfg.geolocation_max_age_secs),
            },
        );
        if let Some(events) = &self.events {
            detector = detector.with_city_lookup(events.clone());
        } else {
            tracing::debug!("no events database configured, detected cities are not snapped");
        }

        Ok(LocationService::new(
            detector,
            self.cache(),
            self.preferences(),
        ))
    }

    pub(crate) fn require_events(&self) -> anyhow::Result<Arc<SupabaseClient>> {
        self.events.clone().ok_or_else(|| {
            anyhow::anyhow!("SUPABASE_URL and SUPABASE_ANON_KEY must be set to query events")
        })
    }
}
