//! Process configuration, read once from the environment and passed explicitly
//! to every component.

use crate::utils::get_cache_dir;
use bon::Builder;
use std::fmt;
use std::num::{NonZeroU16, ParseIntError};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const API_KEY_VAR: &str = "OPENWEATHER_API_KEY";
pub const PORT_VAR: &str = "WEATHER_FEATURES_PORT";
pub const API_URL_VAR: &str = "WEATHER_API_URL";
pub const CACHE_DIR_VAR: &str = "WEATHER_CACHE_DIR";

/// How long a fetched observation is served from cache.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Required environment variable {0} is not set or empty")]
    MissingVar(&'static str),

    #[error("WEATHER_FEATURES_PORT must be a port number between 1 and 65535, got '{value}'")]
    InvalidPort {
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("Failed to determine cache directory; set WEATHER_CACHE_DIR")]
    CacheDirResolution,
}

#[derive(Clone, PartialEq, Eq, Builder)]
pub struct WeatherConfig {
    #[builder(into)]
    pub api_key: String,
    #[builder(into)]
    pub api_url: String,
    pub port: u16,
    #[builder(into)]
    pub cache_dir: PathBuf,
    #[builder(default = DEFAULT_CACHE_TTL)]
    pub cache_ttl: Duration,
}

impl WeatherConfig {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingVar`] if `OPENWEATHER_API_KEY`, `WEATHER_FEATURES_PORT`
    /// or `WEATHER_API_URL` is unset or empty, and [`ConfigError::InvalidPort`] if the
    /// port does not parse. `WEATHER_CACHE_DIR` is optional.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`WeatherConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.is_empty());
        let required = |name: &'static str| non_empty(name).ok_or(ConfigError::MissingVar(name));

        let api_key = required(API_KEY_VAR)?;
        let port_value = required(PORT_VAR)?;
        let api_url = required(API_URL_VAR)?;

        let port = port_value
            .trim()
            .parse::<NonZeroU16>()
            .map_err(|source| ConfigError::InvalidPort {
                value: port_value.clone(),
                source,
            })?
            .get();

        let cache_dir = match non_empty(CACHE_DIR_VAR) {
            Some(dir) => PathBuf::from(dir),
            None => get_cache_dir().ok_or(ConfigError::CacheDirResolution)?,
        };

        Ok(Self {
            api_key,
            api_url,
            port,
            cache_dir,
            cache_ttl: DEFAULT_CACHE_TTL,
        })
    }
}

impl fmt::Debug for WeatherConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeatherConfig")
            .field("api_key", &"<redacted>")
            .field("api_url", &self.api_url)
            .field("port", &self.port)
            .field("cache_dir", &self.cache_dir)
            .field("cache_ttl", &self.cache_ttl)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    const COMPLETE: &[(&str, &str)] = &[
        (API_KEY_VAR, "secret"),
        (PORT_VAR, "8815"),
        (API_URL_VAR, "https://api.openweathermap.org/data/2.5/weather"),
        (CACHE_DIR_VAR, "/tmp/weather-cache"),
    ];

    #[test]
    fn reads_all_variables() {
        let config = WeatherConfig::from_lookup(lookup_from(COMPLETE)).unwrap();
        assert_eq!(config.api_key, "secret");
        assert_eq!(config.port, 8815);
        assert_eq!(config.api_url, "https://api.openweathermap.org/data/2.5/weather");
        assert_eq!(config.cache_dir, PathBuf::from("/tmp/weather-cache"));
        assert_eq!(config.cache_ttl, Duration::from_secs(3));
    }

    #[test]
    fn missing_or_empty_required_variable_fails() {
        for missing in [API_KEY_VAR, PORT_VAR, API_URL_VAR] {
            let vars: Vec<_> = COMPLETE.iter().copied().filter(|(k, _)| *k != missing).collect();
            let err = WeatherConfig::from_lookup(lookup_from(&vars)).unwrap_err();
            assert!(matches!(err, ConfigError::MissingVar(name) if name == missing));

            let vars: Vec<_> = COMPLETE
                .iter()
                .map(|(k, v)| if *k == missing { (*k, "") } else { (*k, *v) })
                .collect();
            let err = WeatherConfig::from_lookup(lookup_from(&vars)).unwrap_err();
            assert!(matches!(err, ConfigError::MissingVar(name) if name == missing));
        }
    }

    #[test]
    fn invalid_port_fails() {
        for bad in ["http", "0", "70000", "-1"] {
            let vars: Vec<_> = COMPLETE
                .iter()
                .map(|(k, v)| if *k == PORT_VAR { (*k, bad) } else { (*k, *v) })
                .collect();
            let err = WeatherConfig::from_lookup(lookup_from(&vars)).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidPort { .. }), "port {bad}");
        }
    }

    #[test]
    fn cache_dir_defaults_to_system_cache() {
        let vars: Vec<_> = COMPLETE.iter().copied().filter(|(k, _)| *k != CACHE_DIR_VAR).collect();
        match WeatherConfig::from_lookup(lookup_from(&vars)) {
            Ok(config) => assert!(config.cache_dir.ends_with("weather-cache")),
            Err(err) => assert!(matches!(err, ConfigError::CacheDirResolution)),
        }
    }

    #[test]
    fn debug_output_hides_api_key() {
        let config = WeatherConfig::builder()
            .api_key("super-secret")
            .api_url("http://localhost")
            .port(8815)
            .cache_dir("/tmp")
            .build();
        let printed = format!("{:?}", config);
        assert!(!printed.contains("super-secret"));
        assert!(printed.contains("<redacted>"));
    }
}
