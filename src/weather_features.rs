//! Entry point tying configuration, cache, fetcher, batch adapter and transform
//! registrations together.

use crate::batch::CurrentWeatherBatch;
use crate::cache::disk_cache::DiskCache;
use crate::cache::ResultCache;
use crate::config::WeatherConfig;
use crate::error::WeatherFeaturesError;
use crate::server::run_server;
use crate::transforms::{register_weather_transforms, TransformRegistry};
use crate::weather_data::fetcher::CurrentWeatherFetcher;
use log::info;
use polars::prelude::DataFrame;
use std::sync::Arc;

/// Configured current-weather service.
///
/// # Examples
///
/// ```no_run
/// # use weather_features::{WeatherConfig, WeatherFeatures};
/// use polars::prelude::*;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = WeatherConfig::from_env()?;
/// let features = WeatherFeatures::new(config).await?;
///
/// let cities = df!("city" => ["Amsterdam", "Lisbon"])?;
/// let weather = features.get_current_weather_batch(&cities).await?;
/// println!("{}", weather);
/// # Ok(())
/// # }
/// ```
pub struct WeatherFeatures {
    config: WeatherConfig,
    batch: Arc<CurrentWeatherBatch>,
    registry: Arc<TransformRegistry>,
}

impl WeatherFeatures {
    /// Builds the service with a [`DiskCache`] under `config.cache_dir`, creating
    /// the directory if needed.
    pub async fn new(config: WeatherConfig) -> Result<Self, WeatherFeaturesError> {
        let cache = DiskCache::open(&config.cache_dir).await?;
        info!("Using weather cache at {}", cache.cache_dir().display());
        Ok(Self::with_cache(config, Arc::new(cache)))
    }

    /// Builds the service on top of any [`ResultCache`].
    pub fn with_cache(config: WeatherConfig, cache: Arc<dyn ResultCache>) -> Self {
        let fetcher = CurrentWeatherFetcher::new(&config, cache);
        let batch = Arc::new(CurrentWeatherBatch::new(fetcher));
        let registry = Arc::new(register_weather_transforms(batch.clone()));
        Self {
            config,
            batch,
            registry,
        }
    }

    pub fn config(&self) -> &WeatherConfig {
        &self.config
    }

    pub fn registry(&self) -> Arc<TransformRegistry> {
        self.registry.clone()
    }

    /// Runs the batch adapter directly, outside any registration.
    pub async fn get_current_weather_batch(
        &self,
        cities: &DataFrame,
    ) -> Result<DataFrame, WeatherFeaturesError> {
        Ok(self.batch.process(cities).await?)
    }

    /// Serves the registered transforms on the configured port.
    pub async fn serve(&self) -> Result<(), WeatherFeaturesError> {
        let port = self.config.port;
        run_server(self.registry(), port)
            .await
            .map_err(|e| WeatherFeaturesError::Server(port, e))
    }
}
