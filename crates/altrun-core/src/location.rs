//! Detected-location types and country normalization.

use serde::{Deserialize, Serialize};

/// Countries the event directory can auto-filter on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Country {
    #[serde(rename = "USA")]
    Usa,
    #[serde(rename = "CAN")]
    Can,
}

impl Country {
    /// The code stored in the events dataset (`USA` / `CAN`).
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Country::Usa => "USA",
            Country::Can => "CAN",
        }
    }
}

impl std::fmt::Display for Country {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for Country {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        normalize_country(s).ok_or_else(|| format!("unsupported country: {s}"))
    }
}

/// Normalizes a raw ISO country code to a supported [`Country`].
///
/// Accepts alpha-2 and alpha-3 codes in any case. Returns `None` for every
/// other country.
#[must_use]
pub fn normalize_country(raw: &str) -> Option<Country> {
    match raw.trim().to_ascii_uppercase().as_str() {
        "US" | "USA" => Some(Country::Usa),
        "CA" | "CAN" => Some(Country::Can),
        _ => None,
    }
}

/// How the coordinates were obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accuracy {
    /// Device geolocation.
    Precise,
    /// IP-based lookup; roughly city level.
    City,
}

/// A resolved visitor location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub country: Country,
    /// Two-letter state or province code when known, raw region text otherwise.
    pub state: String,
    pub city: String,
    pub accuracy: Accuracy,
    /// Cities with events in `state`, in dataset order. Empty when the
    /// lookup failed or found nothing.
    #[serde(default)]
    pub candidate_cities: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_alpha2_codes() {
        assert_eq!(normalize_country("US"), Some(Country::Usa));
        assert_eq!(normalize_country("CA"), Some(Country::Can));
    }

    #[test]
    fn normalizes_lowercase_and_alpha3() {
        assert_eq!(normalize_country("us"), Some(Country::Usa));
        assert_eq!(normalize_country(" can "), Some(Country::Can));
    }

    #[test]
    fn other_countries_are_unsupported() {
        assert_eq!(normalize_country("MX"), None);
        assert_eq!(normalize_country("GB"), None);
        assert_eq!(normalize_country(""), None);
    }

    #[test]
    fn country_serializes_as_dataset_code() {
        let json = serde_json::to_string(&Country::Can).unwrap();
        assert_eq!(json, "\"CAN\"");
    }

    #[test]
    fn detected_location_round_trips_through_json() {
        let loc = DetectedLocation {
            latitude: 45.5,
            longitude: -73.56,
            country: Country::Can,
            state: "QC".to_owned(),
            city: "Montreal".to_owned(),
            accuracy: Accuracy::City,
            candidate_cities: vec!["Montreal".to_owned(), "Laval".to_owned()],
        };
        let json = serde_json::to_value(&loc).unwrap();
        assert_eq!(json["accuracy"], "city");
        assert_eq!(json["candidateCities"][1], "Laval");
        let back: DetectedLocation = serde_json::from_value(json).unwrap();
        assert_eq!(back, loc);
    }
}
