//! Visitor location detection.
//!
//! [`LocationDetector`] tries device geolocation first and falls back to an
//! IP lookup, normalizing the result to a supported country and a state code.
//! [`LocationService`] wraps it with the consent preferences and the
//! 24-hour cache from `altrun-store`.

pub mod detector;
pub mod error;
pub mod ip;
pub mod providers;
pub mod reverse;
pub mod service;

pub use detector::{DetectorConfig, LocationDetector};
pub use error::LocationError;
pub use ip::IpApiClient;
pub use providers::{
    CityLookup, DeviceGeolocation, FixedDevicePosition, GeolocationOptions, IpGeolocation,
    IpLocation, NoDeviceGeolocation, Position, ReverseGeocode, ReverseGeocoder,
};
pub use reverse::NominatimClient;
pub use service::LocationService;
