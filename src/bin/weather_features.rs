//! Batch-service listener for the current-weather transforms.
//!
//! Configuration comes from the environment (`OPENWEATHER_API_KEY`,
//! `WEATHER_FEATURES_PORT`, `WEATHER_API_URL`, optional `WEATHER_CACHE_DIR`).
//! Log verbosity follows `RUST_LOG`, defaulting to `info`.

use log::{error, info};
use weather_features::{WeatherConfig, WeatherFeatures};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env = env_logger::Env::default().default_filter_or("info");
    env_logger::init_from_env(env);

    let config = match WeatherConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return Err(e.into());
        }
    };
    info!("Starting weather features with {:?}", config);

    let features = WeatherFeatures::new(config).await?;
    for transform in features.registry().iter() {
        info!("Registered transform {} ({:?})", transform.name(), transform.kind());
    }

    features.serve().await?;
    Ok(())
}
