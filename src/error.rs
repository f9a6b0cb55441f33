use crate::batch::BatchError;
use crate::cache::error::CacheError;
use crate::config::ConfigError;
use crate::transforms::TransformError;
use crate::weather_data::error::FetchError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WeatherFeaturesError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Batch(#[from] BatchError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error("Batch-service listener failed on port {0}")]
    Server(u16, #[source] std::io::Error),
}
