//! HTTP client for an ipapi.co-compatible IP geolocation endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::error::LocationError;
use crate::providers::{IpGeolocation, IpLocation};

const SERVICE: &str = "IP geolocation";

/// Raw response body. The service reports failures in-band with
/// `"error": true` and a `reason`, sometimes with a 200 status.
#[derive(Debug, Deserialize)]
struct IpApiResponse {
    #[serde(default)]
    error: bool,
    reason: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    country_code: Option<String>,
    region: Option<String>,
    city: Option<String>,
}

pub struct IpApiClient {
    client: Client,
    url: Url,
}

impl IpApiClient {
    /// # Errors
    ///
    /// Returns [`LocationError::ServiceUnavailable`] if the HTTP client cannot
    /// be built or `url` does not parse.
    pub fn new(url: &str, timeout_secs: u64, user_agent: &str) -> Result<Self, LocationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(5))
            .user_agent(user_agent)
            .build()
            .map_err(|e| LocationError::unavailable(SERVICE, e.to_string()))?;
        let url = Url::parse(url)
            .map_err(|e| LocationError::unavailable(SERVICE, format!("invalid URL '{url}': {e}")))?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl IpGeolocation for IpApiClient {
    async fn locate(&self) -> Result<IpLocation, LocationError> {
        let response = self
            .client
            .get(self.url.clone())
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

        let parsed: IpApiResponse =
            serde_json::from_str(&body).map_err(|source| LocationError::Deserialize {
                context: self.url.to_string(),
                source,
            })?;

        if parsed.error {
            return Err(LocationError::unavailable(
                SERVICE,
                parsed.reason.unwrap_or_else(|| "unknown error".to_owned()),
            ));
        }

        let (Some(latitude), Some(longitude)) = (parsed.latitude, parsed.longitude) else {
            return Err(LocationError::unavailable(SERVICE, "response has no coordinates"));
        };

        Ok(IpLocation {
            latitude,
            longitude,
            country_code: parsed.country_code.unwrap_or_default(),
            region: parsed.region.unwrap_or_default(),
            city: parsed.city.unwrap_or_default(),
        })
    }
}
