//! Process settings, read from the environment.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::CacheConfig;
use crate::kai::{DEFAULT_BASE_URL, KaiConfig};
use crate::stations::DEFAULT_STATIONS_FILE;

/// Upper bound for REQUEST_TIMEOUT (one hour).
const MAX_REQUEST_TIMEOUT_SECS: u64 = 60 * 60;

/// Upper bound for CACHE_TTL (one year; moka rejects TTLs over 1000 years).
const MAX_CACHE_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// Upper bound for CACHE_MAX_SIZE.
const MAX_CACHE_SIZE: u64 = 1_000_000;

/// Upper bound for STATION_REFRESH_HOURS (one year).
const MAX_REFRESH_HOURS: u64 = 365 * 24;

const SECS_PER_HOUR: u64 = 60 * 60;

/// A setting that could not be read.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid value for {name}: '{value}'")]
pub struct SettingsError {
    pub name: &'static str,
    pub value: String,
}

/// Everything the server needs to start.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Booking site base URL
    pub base_url: String,
    /// Per-request timeout (seconds)
    pub request_timeout_secs: u64,
    /// Result cache capacity
    pub cache_max_size: u64,
    /// Result cache TTL (seconds)
    pub cache_ttl_secs: u64,
    /// Where the station list is persisted
    pub stations_file: PathBuf,
    /// How often the station list is refreshed (hours)
    pub station_refresh_hours: u64,
    /// Address the HTTP server listens on
    pub bind_addr: SocketAddr,
    /// Default log level when RUST_LOG is unset
    pub log_level: String,
    /// Emit JSON log lines
    pub log_json: bool,
}

impl Settings {
    /// Read settings from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through an arbitrary lookup function.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        let defaults = Self::default();

        Ok(Self {
            base_url: lookup("KAI_BASE_URL").unwrap_or(defaults.base_url),
            request_timeout_secs: bounded(&lookup, "REQUEST_TIMEOUT", MAX_REQUEST_TIMEOUT_SECS)?
                .unwrap_or(defaults.request_timeout_secs),
            cache_max_size: bounded(&lookup, "CACHE_MAX_SIZE", MAX_CACHE_SIZE)?
                .unwrap_or(defaults.cache_max_size),
            cache_ttl_secs: bounded(&lookup, "CACHE_TTL", MAX_CACHE_TTL_SECS)?
                .unwrap_or(defaults.cache_ttl_secs),
            stations_file: lookup("STATIONS_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.stations_file),
            station_refresh_hours: bounded(&lookup, "STATION_REFRESH_HOURS", MAX_REFRESH_HOURS)?
                .unwrap_or(defaults.station_refresh_hours),
            bind_addr: parsed(&lookup, "BIND_ADDR")?.unwrap_or(defaults.bind_addr),
            log_level: lookup("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_json: lookup("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json")),
        })
    }

    pub fn kai_config(&self) -> KaiConfig {
        KaiConfig::new(&self.base_url).with_timeout(self.request_timeout_secs)
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            ttl: Duration::from_secs(self.cache_ttl_secs),
            max_capacity: self.cache_max_size,
        }
    }

    pub fn station_refresh_interval(&self) -> Duration {
        // Clamped in case the field was set directly rather than parsed
        let hours = self.station_refresh_hours.clamp(1, MAX_REFRESH_HOURS);
        Duration::from_secs(hours * SECS_PER_HOUR)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: 60,
            cache_max_size: 128,
            cache_ttl_secs: 900,
            stations_file: PathBuf::from(DEFAULT_STATIONS_FILE),
            station_refresh_hours: 24,
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            log_level: "INFO".to_string(),
            log_json: false,
        }
    }
}

fn parsed<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, SettingsError> {
    lookup(name)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| SettingsError { name, value })
        })
        .transpose()
}

/// Parse a numeric variable that must lie in `1..=max`.
fn bounded(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    max: u64,
) -> Result<Option<u64>, SettingsError> {
    let Some(value) = parsed::<u64>(lookup, name)? else {
        return Ok(None);
    };

    if (1..=max).contains(&value) {
        Ok(Some(value))
    } else {
        Err(SettingsError {
            name,
            value: value.to_string(),
        })
    }
}
