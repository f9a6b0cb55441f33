mod batch;
mod cache;
mod config;
mod error;
mod schema;
mod server;
mod transforms;
mod utils;
mod weather_data;
mod weather_features;

pub use error::WeatherFeaturesError;
pub use weather_features::WeatherFeatures;

pub use batch::{conform_to_schema, input_cities, records_to_frame, BatchError, CurrentWeatherBatch};
pub use cache::disk_cache::DiskCache;
pub use cache::error::CacheError;
pub use cache::memory_cache::MemoryCache;
pub use cache::{CacheEntry, CacheKey, ResultCache};
pub use config::{ConfigError, WeatherConfig, DEFAULT_CACHE_TTL};
pub use schema::{ColumnSpec, ColumnType, TableSchema, SCHEMA_IN, SCHEMA_OUT};
pub use server::{create_router, frame_to_json, run_server, serve, BatchRequest};
pub use transforms::{
    register_weather_transforms, RegisteredTransform, TransformDescription, TransformError,
    TransformKind, TransformRegistry, EXCHANGE_TRANSFORM_NAME, FLIGHT_TRANSFORM_NAME,
};
pub use utils::get_cache_dir;
pub use weather_data::error::{ExtractionError, FetchError};
pub use weather_data::extractor::{extract_record, PathSegment, WeatherRecord, FIELD_PATHS};
pub use weather_data::fetcher::{CurrentWeatherFetcher, FETCH_FUNCTION_NAME};
