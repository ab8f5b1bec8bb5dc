use crate::app_config::{AppConfig, Environment, SupabaseConfig};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is invalid or a paired variable is
/// missing its partner.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is invalid or a paired variable is
/// missing its partner.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_coordinate = |var: &str, limit: f64| -> Result<Option<f64>, ConfigError> {
        let Ok(raw) = lookup(var) else {
            return Ok(None);
        };
        let value = raw
            .trim()
            .parse::<f64>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })?;
        if !value.is_finite() || value.abs() > limit {
            return Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: format!("{value} is outside -{limit}..={limit}"),
            });
        }
        Ok(Some(value))
    };

    let env = parse_environment(&or_default("ALTRUN_ENV", "development"));
    let log_level = or_default("ALTRUN_LOG_LEVEL", "info");
    let store_path = PathBuf::from(or_default("ALTRUN_STORE_PATH", "./.altrun/storage.json"));

    let ip_geolocation_url = or_default("ALTRUN_IP_GEOLOCATION_URL", "https://ipapi.co/json/");
    let reverse_geocode_url = or_default(
        "ALTRUN_REVERSE_GEOCODE_URL",
        "https://nominatim.openstreetmap.org/reverse",
    );
    let http_timeout_secs = parse_u64("ALTRUN_HTTP_TIMEOUT_SECS", "10")?;
    let user_agent = or_default("ALTRUN_USER_AGENT", "altrun/0.1 (event-directory)");

    let geolocation_timeout_secs = parse_u64("ALTRUN_GEOLOCATION_TIMEOUT_SECS", "10")?;
    let geolocation_max_age_secs = parse_u64("ALTRUN_GEOLOCATION_MAX_AGE_SECS", "300")?;
    let default_filter_delay_ms = parse_u64("ALTRUN_DEFAULT_FILTER_DELAY_MS", "5000")?;
    let location_cache_ttl_hours = parse_u64("ALTRUN_LOCATION_CACHE_TTL_HOURS", "24")?;

    let latitude = parse_coordinate("ALTRUN_DEVICE_LATITUDE", 90.0)?;
    let longitude = parse_coordinate("ALTRUN_DEVICE_LONGITUDE", 180.0)?;
    let device_position = match (latitude, longitude) {
        (Some(lat), Some(lon)) => Some((lat, lon)),
        (None, None) => None,
        (Some(_), None) => {
            return Err(ConfigError::MissingEnvVar(
                "ALTRUN_DEVICE_LONGITUDE".to_string(),
            ))
        }
        (None, Some(_)) => {
            return Err(ConfigError::MissingEnvVar(
                "ALTRUN_DEVICE_LATITUDE".to_string(),
            ))
        }
    };

    let supabase = match (lookup("SUPABASE_URL").ok(), lookup("SUPABASE_ANON_KEY").ok()) {
        (Some(url), Some(anon_key)) => Some(SupabaseConfig {
            url,
            anon_key,
            max_retries: parse_u32("ALTRUN_SUPABASE_MAX_RETRIES", "2")?,
            backoff_base_ms: parse_u64("ALTRUN_SUPABASE_BACKOFF_BASE_MS", "500")?,
        }),
        (None, None) => None,
        (Some(_), None) => return Err(ConfigError::MissingEnvVar("SUPABASE_ANON_KEY".to_string())),
        (None, Some(_)) => return Err(ConfigError::MissingEnvVar("SUPABASE_URL".to_string())),
    };

    Ok(AppConfig {
        env,
        log_level,
        store_path,
        ip_geolocation_url,
        reverse_geocode_url,
        http_timeout_secs,
        user_agent,
        geolocation_timeout_secs,
        geolocation_max_age_secs,
        default_filter_delay_ms,
        location_cache_ttl_hours,
        device_position,
        supabase,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
