//! Geocoder configuration: defaults, JSON file, environment.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::error::{Error, Result};
use crate::query::Query;

pub const DEFAULT_HOST: &str = "nominatim.openstreetmap.org";
pub const DEFAULT_FORMAT: &str = "json";
pub const DEFAULT_LIMIT: i64 = 3;
pub const DEFAULT_CACHE_MAX_ENTRIES: usize = 10_000;
pub const DEFAULT_CACHE_MAX_AGE_SECS: u64 = 60 * 60 * 24;
pub const DEFAULT_MIN_INTERVAL_MS: u64 = 1000;

/// Appended to the client id in the outbound `User-Agent` header.
pub const CLIENT_ID_SUFFIX: &str = "powered by Geolane.";

/// Recognized geocoder options. Every field has a default, so a partial
/// JSON file (or `{}`) is a valid configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocoderConfig {
    /// Use `https://` when the host carries no scheme.
    #[serde(default = "default_true", deserialize_with = "deserialize_flag")]
    pub secure_transport: bool,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_true", deserialize_with = "deserialize_flag")]
    pub cache_enabled: bool,
    /// Free-form client identification, prefixed to [`CLIENT_ID_SUFFIX`].
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default = "default_format")]
    pub default_format: String,
    #[serde(default = "default_limit")]
    pub default_limit: i64,
    /// Extra parameters merged into every query.
    #[serde(default)]
    pub default_params: Query,
    #[serde(default = "default_cache_max_entries")]
    pub cache_max_entries: usize,
    #[serde(default = "default_cache_max_age_secs")]
    pub cache_max_age_secs: u64,
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_true() -> bool {
    true
}

/// Flags accept any JSON value and are read by truthiness.
fn deserialize_flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => b,
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|x| x != 0.0),
        serde_json::Value::String(s) => truthy(&s),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => true,
    })
}
fn default_host() -> String {
    DEFAULT_HOST.into()
}
fn default_format() -> String {
    DEFAULT_FORMAT.into()
}
fn default_limit() -> i64 {
    DEFAULT_LIMIT
}
fn default_cache_max_entries() -> usize {
    DEFAULT_CACHE_MAX_ENTRIES
}
fn default_cache_max_age_secs() -> u64 {
    DEFAULT_CACHE_MAX_AGE_SECS
}
fn default_min_interval_ms() -> u64 {
    DEFAULT_MIN_INTERVAL_MS
}
fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            secure_transport: true,
            host: DEFAULT_HOST.into(),
            cache_enabled: true,
            client_id: None,
            default_format: DEFAULT_FORMAT.into(),
            default_limit: DEFAULT_LIMIT,
            default_params: Query::new(),
            cache_max_entries: DEFAULT_CACHE_MAX_ENTRIES,
            cache_max_age_secs: DEFAULT_CACHE_MAX_AGE_SECS,
            min_interval_ms: DEFAULT_MIN_INTERVAL_MS,
            request_timeout_secs: 30,
        }
    }
}

impl GeocoderConfig {
    /// Load config from a JSON file, falling back to defaults when the file
    /// is missing or unreadable.
    pub fn load(config_path: &Path) -> Self {
        match Self::try_load(config_path) {
            Ok(config) => config,
            Err(Error::Io(_)) => Self::default(),
            Err(e) => {
                warn!("Ignoring invalid config {}: {}", config_path.display(), e);
                Self::default()
            }
        }
    }

    /// Like [`load`](Self::load), but reports read and parse failures.
    pub fn try_load(config_path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(config_path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Defaults overlaid with `GEOLANE_*` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Overlay `GEOLANE_*` environment variables onto this config.
    pub fn apply_env(&mut self) {
        if let Ok(host) = std::env::var("GEOLANE_HOST") {
            self.host = host;
        }
        if let Ok(id) = std::env::var("GEOLANE_CLIENT_ID") {
            self.client_id = Some(id);
        }
        if let Ok(v) = std::env::var("GEOLANE_INSECURE") {
            self.secure_transport = !truthy(&v);
        }
        if let Ok(v) = std::env::var("GEOLANE_NO_CACHE") {
            self.cache_enabled = !truthy(&v);
        }
        if let Some(ms) = std::env::var("GEOLANE_MIN_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.min_interval_ms = ms;
        }
    }

    /// Parameters merged into every query: `format` and `limit`, then any
    /// configured `default_params`.
    pub fn request_defaults(&self) -> Query {
        let mut defaults = Query::new()
            .with("format", self.default_format.to_lowercase())
            .with("limit", self.default_limit);
        defaults.merge(&self.default_params);
        defaults
    }

    /// Value of the outbound identification header.
    pub fn user_agent(&self) -> String {
        match &self.client_id {
            Some(id) => format!("{} {}", id, CLIENT_ID_SUFFIX),
            None => format!("Application {}", CLIENT_ID_SUFFIX),
        }
    }

    pub fn cache_max_age(&self) -> Duration {
        Duration::from_secs(self.cache_max_age_secs)
    }

    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Anything but empty, `0`, `false`, or `no` counts as set.
fn truthy(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "" | "0" | "false" | "no"
    )
}
