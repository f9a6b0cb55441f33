use crate::cache::error::CacheError;
use crate::cache::{CacheEntry, CacheKey, ResultCache};
use crate::utils::ensure_cache_dir_exists;
use async_trait::async_trait;
use log::{debug, info, warn};
use serde_json::Value;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::NamedTempFile;

/// [`ResultCache`] persisted as one JSON file per key inside a directory.
///
/// Entries are written to a temporary file in the same directory and renamed
/// into place, so readers in other processes never see a partial entry.
#[derive(Debug, Clone)]
pub struct DiskCache {
    cache_dir: PathBuf,
}

impl DiskCache {
    /// Opens (and if needed creates) a cache rooted at `cache_dir`.
    pub async fn open(cache_dir: &Path) -> Result<Self, CacheError> {
        ensure_cache_dir_exists(cache_dir).await?;
        Ok(Self {
            cache_dir: cache_dir.to_path_buf(),
        })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.cache_dir.join(format!("{}.json", key.digest()))
    }

    /// Reads the stored entry for `key` regardless of its age.
    ///
    /// Entries that cannot be read or decoded are logged and reported as absent.
    pub async fn read_entry(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError> {
        let path = self.entry_path(key);
        let entry = tokio::task::spawn_blocking(move || Self::read_entry_at(&path)).await?;
        Ok(entry)
    }

    fn read_entry_at(path: &Path) -> Option<CacheEntry> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("Ignoring unreadable cache entry {:?}: {}", path.display(), e);
                return None;
            }
        };
        match serde_json::from_slice::<CacheEntry>(&bytes) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(
                    "Ignoring undecodable cache entry {:?}: {}",
                    path.display(),
                    e
                );
                None
            }
        }
    }

    fn write_entry_at(cache_dir: &Path, path: &Path, bytes: &[u8]) -> Result<(), CacheError> {
        let write_err = |e: io::Error| CacheError::CacheWrite(path.to_path_buf(), e);

        let mut temp_file = NamedTempFile::new_in(cache_dir).map_err(write_err)?;
        temp_file.write_all(bytes).map_err(write_err)?;
        temp_file.flush().map_err(write_err)?;
        temp_file.persist(path).map_err(|e| write_err(e.error))?;
        Ok(())
    }
}

#[async_trait]
impl ResultCache for DiskCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError> {
        match self.read_entry(key).await? {
            Some(entry) if entry.is_fresh() => {
                debug!("Cache hit for {} at {:?}", key.request(), self.entry_path(key));
                Ok(Some(entry))
            }
            Some(entry) => {
                info!(
                    "Cache entry for {} expired (written {}, ttl {:?})",
                    key.request(),
                    entry.created_at,
                    entry.ttl()
                );
                Ok(None)
            }
            None => {
                debug!("Cache miss for {}", key.request());
                Ok(None)
            }
        }
    }

    async fn put(&self, key: &CacheKey, value: Value, ttl: Duration) -> Result<(), CacheError> {
        let path = self.entry_path(key);
        let entry = CacheEntry::new(key, value, ttl);
        let bytes = serde_json::to_vec_pretty(&entry).map_err(CacheError::CacheEncode)?;

        let cache_dir = self.cache_dir.clone();
        let target = path.clone();
        tokio::task::spawn_blocking(move || Self::write_entry_at(&cache_dir, &target, &bytes))
            .await??;

        debug!("Cached {} to {:?}", key.request(), path);
        Ok(())
    }
}
