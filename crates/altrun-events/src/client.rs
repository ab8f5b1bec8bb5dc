//! HTTP client for the events table behind Supabase's PostgREST API.
//!
//! Filters are expressed as PostgREST query operators (`column=eq.value`,
//! `date=gte.2026-04-12`). Every request carries the project's anon key as
//! both the `apikey` header and a bearer token.

use std::collections::HashSet;
use std::time::Duration;

use altrun_core::{ActiveFilterSet, Country};
use altrun_geo::{CityLookup, LocationError};
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::error::EventsError;
use crate::retry::retry_with_backoff;
use crate::types::{CityRow, EventRecord, StateRow};

const EVENTS_TABLE: &str = "events";

pub struct SupabaseClient {
    client: Client,
    base_url: Url,
    anon_key: String,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl SupabaseClient {
    /// # Errors
    ///
    /// Returns [`EventsError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`EventsError::InvalidBaseUrl`] if
    /// `project_url` is not a valid URL.
    pub fn new(
        project_url: &str,
        anon_key: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, EventsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        let normalised = format!("{}/rest/v1/", project_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| EventsError::InvalidBaseUrl {
            url: project_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            base_url,
            anon_key: anon_key.to_owned(),
            max_retries: 0,
            backoff_base_ms: 0,
        })
    }

    /// Retry transient failures up to `max_retries` extra times.
    #[must_use]
    pub fn with_retry(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    /// Distinct cities with events in `state`, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns [`EventsError`] on network failure, non-2xx status, or an
    /// unexpected response shape.
    pub async fn cities_for_state(
        &self,
        country: Country,
        state: &str,
    ) -> Result<Vec<String>, EventsError> {
        let country_filter = eq(country.code());
        let state_filter = eq(state);
        let url = self.build_url(&[
            ("select", "city"),
            ("country", country_filter.as_str()),
            ("state", state_filter.as_str()),
            ("order", "city.asc"),
        ]);
        let rows: Vec<CityRow> = self.fetch(&url).await?;
        Ok(distinct(rows.into_iter().filter_map(|r| r.city)))
    }

    /// Distinct states with events in `country`, ordered by code.
    ///
    /// # Errors
    ///
    /// Returns [`EventsError`] on network failure, non-2xx status, or an
    /// unexpected response shape.
    pub async fn states_for_country(&self, country: Country) -> Result<Vec<String>, EventsError> {
        let country_filter = eq(country.code());
        let url = self.build_url(&[
            ("select", "state"),
            ("country", country_filter.as_str()),
            ("order", "state.asc"),
        ]);
        let rows: Vec<StateRow> = self.fetch(&url).await?;
        Ok(distinct(rows.into_iter().filter_map(|r| r.state)))
    }

    /// Events matching `filters`, earliest first.
    ///
    /// The month/day pair is read as a date in `today`'s year and matches
    /// events on or after it. A month without a day starts at the 1st.
    ///
    /// # Errors
    ///
    /// Returns [`EventsError`] on network failure, non-2xx status, or an
    /// unexpected response shape.
    pub async fn list_events(
        &self,
        filters: &ActiveFilterSet,
        today: NaiveDate,
        limit: usize,
    ) -> Result<Vec<EventRecord>, EventsError> {
        let url = self.build_url(event_query(filters, today, limit).as_slice());
        self.fetch(&url).await
    }

    fn build_url<K: AsRef<str>, V: AsRef<str>>(&self, params: &[(K, V)]) -> Url {
        let mut url = self
            .base_url
            .join(EVENTS_TABLE)
            .unwrap_or_else(|_| self.base_url.clone());
        {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in params {
                pairs.append_pair(k.as_ref(), v.as_ref());
            }
        }
        url
    }

    async fn fetch<T: DeserializeOwned>(&self, url: &Url) -> Result<T, EventsError> {
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.request_json(url)
        })
        .await
    }

    async fn request_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T, EventsError> {
        let response = self
            .client
            .get(url.clone())
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
            .send()
            .await?;

        match response.status() {
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(EventsError::RateLimited {
                    retry_after: retry_after(response.headers()),
                })
            }
            s if !s.is_success() => {
                return Err(EventsError::UnexpectedStatus {
                    status: s.as_u16(),
                    url: url.path().to_owned(),
                })
            }
            _ => {}
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|source| EventsError::Deserialize {
            context: url.path().to_owned(),
            source,
        })
    }
}

#[async_trait]
impl CityLookup for SupabaseClient {
    async fn cities_for_state(
        &self,
        country: Country,
        state: &str,
    ) -> Result<Vec<String>, LocationError> {
        SupabaseClient::cities_for_state(self, country, state)
            .await
            .map_err(|e| LocationError::ServiceUnavailable {
                service: "events database".to_owned(),
                reason: e.to_string(),
            })
    }
}

/// Reads a delta-seconds `Retry-After`. HTTP-date values are ignored and
/// fall back to exponential back-off.
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    let secs = headers.get(RETRY_AFTER)?.to_str().ok()?.trim().parse().ok()?;
    Some(Duration::from_secs(secs))
}

fn eq(value: &str) -> String {
    format!("eq.{value}")
}

/// Builds the PostgREST query pairs for an event listing.
fn event_query(filters: &ActiveFilterSet, today: NaiveDate, limit: usize) -> Vec<(String, String)> {
    let mut params = vec![("select".to_owned(), "*".to_owned())];
    if let Some(country) = filters.country {
        params.push(("country".to_owned(), eq(country.code())));
    }
    let optional = [
        ("state", &filters.state),
        ("city", &filters.city),
        ("event_type", &filters.event_type),
    ];
    for (column, value) in optional {
        if let Some(v) = value.as_deref().filter(|v| !v.is_empty()) {
            params.push((column.to_owned(), eq(v)));
        }
    }
    if let Some(month) = filters.month {
        let day = filters.day.unwrap_or(1);
        match NaiveDate::from_ymd_opt(today.year(), month, day) {
            Some(from) => params.push(("date".to_owned(), format!("gte.{from}"))),
            None => tracing::warn!(month, day, "ignoring impossible date filter"),
        }
    }
    params.push(("order".to_owned(), "date.asc".to_owned()));
    params.push(("limit".to_owned(), limit.to_string()));
    params
}

/// Deduplicates while keeping first-seen order.
fn distinct(values: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty() && seen.insert(v.clone()))
        .collect()
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
