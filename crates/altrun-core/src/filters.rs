//! Event-listing filter sets and the sources that produce them.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::location::{Country, DetectedLocation};

/// Which producer resolved the active filter set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceTag {
    Auto,
    Manual,
    Default,
}

impl std::fmt::Display for SourceTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceTag::Auto => write!(f, "auto"),
            SourceTag::Manual => write!(f, "manual"),
            SourceTag::Default => write!(f, "default"),
        }
    }
}

/// Dropdown values chosen by the visitor. `None` means "any".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualFilters {
    pub country: Option<Country>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub month: Option<u32>,
    pub day: Option<u32>,
    pub event_type: Option<String>,
}

impl ManualFilters {
    /// Starts an edit from whatever is currently active.
    #[must_use]
    pub fn from_active(active: &ActiveFilterSet) -> Self {
        Self {
            country: active.country,
            state: active.state.clone(),
            city: active.city.clone(),
            month: active.month,
            day: active.day,
            event_type: active.event_type.clone(),
        }
    }

    /// Changing the country invalidates the state and city selections.
    #[must_use]
    pub fn with_country(mut self, country: Option<Country>) -> Self {
        if self.country != country {
            self.state = None;
            self.city = None;
        }
        self.country = country;
        self
    }

    /// Changing the state invalidates the city selection.
    #[must_use]
    pub fn with_state(mut self, state: Option<String>) -> Self {
        if self.state != state {
            self.city = None;
        }
        self.state = state;
        self
    }

    #[must_use]
    pub fn with_city(mut self, city: Option<String>) -> Self {
        self.city = city;
        self
    }

    #[must_use]
    pub fn with_date(mut self, month: Option<u32>, day: Option<u32>) -> Self {
        self.month = month;
        self.day = day;
        self
    }

    #[must_use]
    pub fn with_event_type(mut self, event_type: Option<String>) -> Self {
        self.event_type = event_type;
        self
    }
}

/// A candidate filter set before it becomes active.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterSource {
    Auto(DetectedLocation),
    Manual(ManualFilters),
    Default,
}

impl FilterSource {
    #[must_use]
    pub fn tag(&self) -> SourceTag {
        match self {
            FilterSource::Auto(_) => SourceTag::Auto,
            FilterSource::Manual(_) => SourceTag::Manual,
            FilterSource::Default => SourceTag::Default,
        }
    }
}

/// The single filter set handed to the event query layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveFilterSet {
    /// `None` leaves the listing unfiltered by country.
    pub country: Option<Country>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub month: Option<u32>,
    pub day: Option<u32>,
    pub event_type: Option<String>,
    pub source: SourceTag,
}

impl ActiveFilterSet {
    /// Builds a complete filter set from one source.
    ///
    /// Auto and default sets are dated `today`; manual sets carry exactly
    /// what the visitor chose.
    #[must_use]
    pub fn from_source(source: FilterSource, today: NaiveDate) -> Self {
        match source {
            FilterSource::Auto(location) => Self {
                country: Some(location.country),
                state: non_empty(location.state),
                city: non_empty(location.city),
                month: Some(today.month()),
                day: Some(today.day()),
                event_type: None,
                source: SourceTag::Auto,
            },
            FilterSource::Manual(manual) => Self {
                country: manual.country,
                state: manual.state,
                city: manual.city,
                month: manual.month,
                day: manual.day,
                event_type: manual.event_type,
                source: SourceTag::Manual,
            },
            FilterSource::Default => Self {
                country: None,
                state: None,
                city: None,
                month: Some(today.month()),
                day: Some(today.day()),
                event_type: None,
                source: SourceTag::Default,
            },
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
