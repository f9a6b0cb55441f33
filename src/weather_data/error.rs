use crate::cache::error::CacheError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Cannot apply path segment {segment} to a JSON {found} while extracting '{field}'")]
    UnexpectedType {
        field: &'static str,
        segment: String,
        found: &'static str,
    },
}

/// Failure to obtain the current weather for a single city.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to parse weather response for '{city}' as JSON")]
    JsonParse {
        city: String,
        #[source]
        source: reqwest::Error,
    },

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

