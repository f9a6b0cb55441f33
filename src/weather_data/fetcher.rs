use crate::cache::{CacheKey, ResultCache};
use crate::config::WeatherConfig;
use crate::weather_data::error::FetchError;
use crate::weather_data::extractor::{extract_record, WeatherRecord};
use chrono::{SecondsFormat, Utc};
use log::{debug, info, warn};
use reqwest::Client;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Name the fetcher's results are cached under.
pub const FETCH_FUNCTION_NAME: &str = "fetch_one_city";

/// Fetches the current weather for one city at a time, caching each result
/// for the configured time-to-live.
pub struct CurrentWeatherFetcher {
    client: Client,
    api_url: String,
    api_key: String,
    cache: Arc<dyn ResultCache>,
    cache_ttl: Duration,
}

impl CurrentWeatherFetcher {
    pub fn new(config: &WeatherConfig, cache: Arc<dyn ResultCache>) -> Self {
        Self::with_client(Client::new(), config, cache)
    }

    pub fn with_client(client: Client, config: &WeatherConfig, cache: Arc<dyn ResultCache>) -> Self {
        Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            cache,
            cache_ttl: config.cache_ttl,
        }
    }

    /// Returns the flattened observation for `city`, with `city` and the fetch
    /// `timestamp` attached.
    ///
    /// A result cached for the same arguments within the time-to-live is returned
    /// without contacting the API; otherwise the API is called and the cache entry
    /// is (over)written.
    ///
    /// # Errors
    ///
    /// Any [`FetchError`]: transport failures, non-2xx responses, undecodable bodies,
    /// malformed documents and cache I/O failures. Nothing is retried.
    pub async fn fetch(&self, city: &str) -> Result<WeatherRecord, FetchError> {
        let key = Self::cache_key(city)?;

        if let Some(entry) = self.cache.get(&key).await? {
            match entry.value {
                Value::Object(record) => {
                    debug!("Serving cached weather for '{}'", city);
                    return Ok(record);
                }
                other => warn!(
                    "Cached weather for '{}' is not a record ({}), fetching again",
                    city, other
                ),
            }
        }

        let record = self.fetch_uncached(city).await?;
        self.cache
            .put(&key, Value::Object(record.clone()), self.cache_ttl)
            .await?;
        Ok(record)
    }

    /// Calls the weather API for `city`, bypassing the cache.
    pub async fn fetch_uncached(&self, city: &str) -> Result<WeatherRecord, FetchError> {
        info!("Requesting current weather for '{}' from {}", city, self.api_url);

        // Errors are stripped of their URL, which carries the API key.
        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("q", city),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ])
            .send()
            .await
            .map_err(|e| FetchError::NetworkRequest(self.api_url.clone(), e.without_url()))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                warn!("HTTP error fetching weather for '{}': {:?}", city, e.status());
                return Err(match e.status() {
                    Some(status) => FetchError::HttpStatus {
                        url: self.api_url.clone(),
                        status,
                        source: e.without_url(),
                    },
                    None => FetchError::NetworkRequest(self.api_url.clone(), e.without_url()),
                });
            }
        };

        let observation: Value = response.json().await.map_err(|e| FetchError::JsonParse {
            city: city.to_string(),
            source: e.without_url(),
        })?;

        let mut record = extract_record(&observation)?;
        record.insert("city".to_string(), Value::String(city.to_string()));
        record.insert(
            "timestamp".to_string(),
            Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)),
        );
        Ok(record)
    }

    fn cache_key(city: &str) -> Result<CacheKey, FetchError> {
        let mut kwargs = BTreeMap::new();
        kwargs.insert("city".to_string(), Value::String(city.to_string()));
        Ok(CacheKey::from_kwargs(FETCH_FUNCTION_NAME, kwargs)?)
    }
}
