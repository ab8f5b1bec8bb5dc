//! Two-strategy location detection.
//!
//! 1. Device geolocation, bounded by [`DetectorConfig::geolocation_timeout`],
//!    followed by reverse geocoding. Accuracy [`Accuracy::Precise`].
//! 2. On any failure of step 1, an IP lookup. Accuracy [`Accuracy::City`].
//!
//! Either answer is normalized to a supported [`Country`] and a state code,
//! and the city is snapped to one that exists in the events dataset when a
//! [`CityLookup`] is configured.

use std::sync::Arc;
use std::time::Duration;

use altrun_core::{normalize_country, normalize_region, Accuracy, Country, DetectedLocation};

use crate::error::LocationError;
use crate::providers::{
    CityLookup, DeviceGeolocation, GeolocationOptions, IpGeolocation, ReverseGeocoder,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectorConfig {
    pub geolocation_timeout: Duration,
    pub geolocation_max_age: Duration,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        let options = GeolocationOptions::default();
        Self {
            geolocation_timeout: options.timeout,
            geolocation_max_age: options.maximum_age,
        }
    }
}

/// Location before country and region normalization.
#[derive(Debug)]
struct RawLocation {
    latitude: f64,
    longitude: f64,
    country_code: String,
    region: String,
    city: String,
    accuracy: Accuracy,
}

pub struct LocationDetector {
    device: Arc<dyn DeviceGeolocation>,
    ip: Arc<dyn IpGeolocation>,
    reverse: Arc<dyn ReverseGeocoder>,
    cities: Option<Arc<dyn CityLookup>>,
    config: DetectorConfig,
}

impl LocationDetector {
    pub fn new(
        device: Arc<dyn DeviceGeolocation>,
        ip: Arc<dyn IpGeolocation>,
        reverse: Arc<dyn ReverseGeocoder>,
        config: DetectorConfig,
    ) -> Self {
        Self {
            device,
            ip,
            reverse,
            cities: None,
            config,
        }
    }

    /// Snap detected cities to the ones present in the events dataset.
    #[must_use]
    pub fn with_city_lookup(mut self, cities: Arc<dyn CityLookup>) -> Self {
        self.cities = Some(cities);
        self
    }

    /// Best-effort detection. Every failure is logged and reported as `None`.
    pub async fn detect(&self) -> Option<DetectedLocation> {
        match self.try_detect().await {
            Ok(location) => {
                tracing::info!(
                    country = %location.country,
                    state = %location.state,
                    city = %location.city,
                    accuracy = ?location.accuracy,
                    "location detected"
                );
                Some(location)
            }
            Err(LocationError::UnsupportedRegion(code)) => {
                tracing::info!(country_code = %code, "visitor outside supported countries");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "location detection failed");
                None
            }
        }
    }

    /// Detection with the failure reason preserved.
    ///
    /// # Errors
    ///
    /// Returns the IP lookup's error when both strategies fail, or
    /// [`LocationError::UnsupportedRegion`] when the country is not covered.
    pub async fn try_detect(&self) -> Result<DetectedLocation, LocationError> {
        let raw = match self.from_device().await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::debug!(error = %e, "device geolocation unavailable, trying IP lookup");
                self.from_ip().await?
            }
        };

        let country = normalize_country(&raw.country_code)
            .ok_or_else(|| LocationError::UnsupportedRegion(raw.country_code.clone()))?;
        let state = normalize_region(country, &raw.region);
        let (city, candidate_cities) = self.resolve_city(country, &state, raw.city).await;

        Ok(DetectedLocation {
            latitude: raw.latitude,
            longitude: raw.longitude,
            country,
            state,
            city,
            accuracy: raw.accuracy,
            candidate_cities,
        })
    }

    async fn from_device(&self) -> Result<RawLocation, LocationError> {
        let options = GeolocationOptions {
            timeout: self.config.geolocation_timeout,
            maximum_age: self.config.geolocation_max_age,
        };
        // The provider is told the bound, but it is enforced here regardless.
        let position = tokio::time::timeout(
            self.config.geolocation_timeout,
            self.device.current_position(options),
        )
        .await
        .map_err(|_| LocationError::Timeout {
            step: "device geolocation".to_owned(),
        })??;

        let place = self
            .reverse
            .reverse(position.latitude, position.longitude)
            .await?;

        Ok(RawLocation {
            latitude: position.latitude,
            longitude: position.longitude,
            country_code: place.country_code,
            region: place.region,
            city: place.city,
            accuracy: Accuracy::Precise,
        })
    }

    async fn from_ip(&self) -> Result<RawLocation, LocationError> {
        let found = self.ip.locate().await?;
        Ok(RawLocation {
            latitude: found.latitude,
            longitude: found.longitude,
            country_code: found.country_code,
            region: found.region,
            city: found.city,
            accuracy: Accuracy::City,
        })
    }

    /// Picks the first dataset city for `state`, keeping the full list.
    /// Falls back to the detected city when the lookup fails or is empty.
    async fn resolve_city(
        &self,
        country: Country,
        state: &str,
        detected_city: String,
    ) -> (String, Vec<String>) {
        let Some(lookup) = &self.cities else {
            return (detected_city, Vec::new());
        };
        if state.is_empty() {
            return (detected_city, Vec::new());
        }

        match lookup.cities_for_state(country, state).await {
            Ok(candidates) => match candidates.first() {
                Some(first) => (first.clone(), candidates),
                None => {
                    tracing::debug!(%country, state, "no dataset cities for detected state");
                    (detected_city, Vec::new())
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, %country, state, "city lookup failed, keeping detected city");
                (detected_city, Vec::new())
            }
        }
    }
}

#[cfg(test)]
#[path = "detector_test.rs"]
mod tests;
