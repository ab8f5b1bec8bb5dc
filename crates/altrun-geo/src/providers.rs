//! Collaborator seams consumed by the detector.

use std::time::Duration;

use altrun_core::Country;
use async_trait::async_trait;

use crate::error::LocationError;

/// Bounds passed to the device geolocation provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeolocationOptions {
    pub timeout: Duration,
    /// Oldest platform-cached position the provider may return.
    pub maximum_age: Duration,
}

impl Default for GeolocationOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            maximum_age: Duration::from_secs(5 * 60),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    /// Radius of uncertainty in metres, when the platform reports one.
    pub accuracy_meters: Option<f64>,
}

/// Country, region and city for a coordinate pair, as returned by a
/// reverse-geocoding service. Values are unnormalized.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReverseGeocode {
    pub country_code: String,
    pub region: String,
    pub city: String,
}

/// An IP geolocation answer. Values are unnormalized.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IpLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub country_code: String,
    pub region: String,
    pub city: String,
}

#[async_trait]
pub trait DeviceGeolocation: Send + Sync {
    async fn current_position(&self, options: GeolocationOptions)
        -> Result<Position, LocationError>;
}

#[async_trait]
pub trait IpGeolocation: Send + Sync {
    async fn locate(&self) -> Result<IpLocation, LocationError>;
}

#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    async fn reverse(&self, latitude: f64, longitude: f64)
        -> Result<ReverseGeocode, LocationError>;
}

/// Lists the cities that actually have events in a state.
#[async_trait]
pub trait CityLookup: Send + Sync {
    async fn cities_for_state(
        &self,
        country: Country,
        state: &str,
    ) -> Result<Vec<String>, LocationError>;
}

/// Device provider that always reports the same coordinates.
#[derive(Debug, Clone, Copy)]
pub struct FixedDevicePosition {
    pub latitude: f64,
    pub longitude: f64,
}

#[async_trait]
impl DeviceGeolocation for FixedDevicePosition {
    async fn current_position(
        &self,
        _options: GeolocationOptions,
    ) -> Result<Position, LocationError> {
        Ok(Position {
            latitude: self.latitude,
            longitude: self.longitude,
            accuracy_meters: None,
        })
    }
}

/// Device provider for hosts with no positioning hardware.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDeviceGeolocation;

#[async_trait]
impl DeviceGeolocation for NoDeviceGeolocation {
    async fn current_position(
        &self,
        _options: GeolocationOptions,
    ) -> Result<Position, LocationError> {
        Err(LocationError::unavailable(
            "device geolocation",
            "no device position available",
        ))
    }
}
