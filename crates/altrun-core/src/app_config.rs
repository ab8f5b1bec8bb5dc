use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Connection settings for the hosted events database.
#[derive(Clone)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
}

impl std::fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url)
            .field("anon_key", &"[redacted]")
            .field("max_retries", &self.max_retries)
            .field("backoff_base_ms", &self.backoff_base_ms)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub store_path: PathBuf,
    pub ip_geolocation_url: String,
    pub reverse_geocode_url: String,
    pub http_timeout_secs: u64,
    pub user_agent: String,
    pub geolocation_timeout_secs: u64,
    pub geolocation_max_age_secs: u64,
    pub default_filter_delay_ms: u64,
    pub location_cache_ttl_hours: u64,
    /// Fixed coordinates reported by the device geolocation provider.
    /// `None` means no device position is available.
    pub device_position: Option<(f64, f64)>,
    pub supabase: Option<SupabaseConfig>,
}
