use thiserror::Error;

/// Why a detection step failed.
///
/// None of these reach callers of [`crate::LocationDetector::detect`]; they
/// are logged and the detector moves to the next strategy or gives up.
#[derive(Debug, Error)]
pub enum LocationError {
    /// The visitor or platform refused device geolocation.
    #[error("device geolocation permission denied")]
    PermissionDenied,

    /// A step exceeded its time bound.
    #[error("{step} timed out")]
    Timeout { step: String },

    /// Network failure or non-2xx response from a collaborator.
    #[error("{service} unavailable: {reason}")]
    ServiceUnavailable { service: String, reason: String },

    /// The resolved country is not one the directory covers.
    #[error("unsupported region: {0}")]
    UnsupportedRegion(String),

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl LocationError {
    pub(crate) fn unavailable(service: &str, reason: impl Into<String>) -> Self {
        Self::ServiceUnavailable {
            service: service.to_owned(),
            reason: reason.into(),
        }
    }

    /// Classifies a `reqwest` failure: client timeouts become
    /// [`LocationError::Timeout`], everything else is an outage.
    pub(crate) fn from_http(service: &str, err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                step: service.to_owned(),
            }
        } else {
            Self::unavailable(service, err.to_string())
        }
    }
}
