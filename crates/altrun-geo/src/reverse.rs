//! Reverse geocoding against a Nominatim-compatible `/reverse` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::error::LocationError;
use crate::providers::{ReverseGeocode, ReverseGeocoder};

const SERVICE: &str = "reverse geocoding";

#[derive(Debug, Deserialize)]
struct NominatimResponse {
    error: Option<String>,
    address: Option<NominatimAddress>,
}

#[derive(Debug, Default, Deserialize)]
struct NominatimAddress {
    country_code: Option<String>,
    state: Option<String>,
    province: Option<String>,
    #[serde(rename = "ISO3166-2-lvl4")]
    iso_region: Option<String>,
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
}

impl NominatimAddress {
    /// Prefers the ISO subdivision suffix (`US-CA` -> `CA`) since it is
    /// already a code, then the state, then the province name.
    fn region(&self) -> String {
        self.iso_region
            .as_deref()
            .and_then(|iso| iso.split_once('-').map(|(_, code)| code.to_owned()))
            .or_else(|| self.state.clone())
            .or_else(|| self.province.clone())
            .unwrap_or_default()
    }

    fn locality(&self) -> String {
        self.city
            .clone()
            .or_else(|| self.town.clone())
            .or_else(|| self.village.clone())
            .unwrap_or_default()
    }
}

pub struct NominatimClient {
    client: Client,
    base_url: Url,
}

impl NominatimClient {
    /// # Errors
    ///
    /// Returns [`LocationError::ServiceUnavailable`] if the HTTP client cannot
    /// be built or `base_url` does not parse.
    pub fn new(base_url: &str, timeout_secs: u64, user_agent: &str) -> Result<Self, LocationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(5))
            .user_agent(user_agent)
            .build()
            .map_err(|e| LocationError::unavailable(SERVICE, e.to_string()))?;
        let base_url = Url::parse(base_url).map_err(|e| {
            LocationError::unavailable(SERVICE, format!("invalid URL '{base_url}': {e}"))
        })?;
        Ok(Self { client, base_url })
    }

    fn build_url(&self, latitude: f64, longitude: f64) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("format", "jsonv2")
            .append_pair("lat", &latitude.to_string())
            .append_pair("lon", &longitude.to_string())
            .append_pair("zoom", "10")
            .append_pair("addressdetails", "1");
        url
    }
}

#[async_trait]
impl ReverseGeocoder for NominatimClient {
    async fn reverse(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<ReverseGeocode, LocationError> {
        let url = self.build_url(latitude, longitude);
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| LocationError::from_http(SERVICE, &e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LocationError::from_http(SERVICE, &e))?;
        if !status.is_success() {
            return Err(LocationError::unavailable(
                SERVICE,
                format!("HTTP {}", status.as_u16()),
            ));
        }

        let parsed: NominatimResponse =
            serde_json::from_str(&body).map_err(|source| LocationError::Deserialize {
                context: url.to_string(),
                source,
            })?;
        if let Some(message) = parsed.error {
            return Err(LocationError::unavailable(SERVICE, message));
        }
        let address = parsed
            .address
            .ok_or_else(|| LocationError::unavailable(SERVICE, "response has no address"))?;

        Ok(ReverseGeocode {
            country_code: address.country_code.clone().unwrap_or_default(),
            region: address.region(),
            city: address.locality(),
        })
    }
}
