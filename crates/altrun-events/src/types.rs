use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One row of the `events` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: i64,
    pub name: String,
    pub date: NaiveDate,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub event_type: Option<String>,
    pub url: Option<String>,
}

/// Projection used by the city and state dropdown queries.
#[derive(Debug, Deserialize)]
pub(crate) struct CityRow {
    pub city: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StateRow {
    pub state: Option<String>,
}
