pub mod app_config;
pub mod config;
pub mod filters;
pub mod location;
pub mod preferences;
pub mod regions;

pub use app_config::{AppConfig, Environment, SupabaseConfig};
pub use config::{load_app_config, load_app_config_from_env};
pub use filters::{ActiveFilterSet, FilterSource, ManualFilters, SourceTag};
pub use location::{normalize_country, Accuracy, Country, DetectedLocation};
pub use preferences::{LocationPreferences, PreferencesUpdate};
pub use regions::normalize_region;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
