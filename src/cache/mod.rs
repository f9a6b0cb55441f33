//! Argument-keyed, time-boxed result caching.
//!
//! A [`ResultCache`] stores the result of a call under a [`CacheKey`] derived
//! from the called function's name and its keyword arguments. Entries expire
//! `ttl` after they were written; an expired entry is reported as absent.

pub mod disk_cache;
pub mod error;
pub mod memory_cache;

use crate::cache::error::CacheError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::time::Duration;

/// Storage for cached call results.
///
/// `get` must return `None` for entries whose time-to-live has elapsed.
#[async_trait]
pub trait ResultCache: Send + Sync {
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError>;

    async fn put(&self, key: &CacheKey, value: Value, ttl: Duration) -> Result<(), CacheError>;
}

/// Deterministic key for one call: a SHA-256 digest over the function name and
/// the canonical JSON encoding of its keyword arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheKey {
    digest: String,
    request: Value,
}

impl CacheKey {
    pub fn from_kwargs(
        function: &str,
        kwargs: BTreeMap<String, Value>,
    ) -> Result<Self, CacheError> {
        // BTreeMap serializes its keys sorted.
        let canonical = serde_json::to_vec(&(function, &kwargs)).map_err(CacheError::CacheEncode)?;
        let digest = hex::encode(Sha256::digest(&canonical));
        let request = serde_json::json!({
            "function": function,
            "kwargs": kwargs,
        });
        Ok(Self { digest, request })
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// The call this key was derived from, stored next to the cached value.
    pub fn request(&self) -> &Value {
        &self.request
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub created_at: DateTime<Utc>,
    pub ttl_ms: u64,
    pub request: Value,
    pub value: Value,
}

impl CacheEntry {
    pub fn new(key: &CacheKey, value: Value, ttl: Duration) -> Self {
        Self {
            created_at: Utc::now(),
            ttl_ms: u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX),
            request: key.request().clone(),
            value,
        }
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        match now.signed_duration_since(self.created_at).to_std() {
            Ok(age) => age < self.ttl(),
            // Written "in the future" by a process with a skewed clock.
            Err(_) => true,
        }
    }

    pub fn is_fresh(&self) -> bool {
        self.is_fresh_at(Utc::now())
    }
}
