use crate::cache::error::CacheError;
use log::info;
use std::io;
use std::path::{Path, PathBuf};

const CACHE_DIR_NAME: &str = "weather_features";
const WEATHER_CACHE_DIR_NAME: &str = "weather-cache";

/// Default location of the weather result cache, under the system cache directory.
pub fn get_cache_dir() -> Option<PathBuf> {
    dirs::cache_dir().map(|p| p.join(CACHE_DIR_NAME).join(WEATHER_CACHE_DIR_NAME))
}

pub async fn ensure_cache_dir_exists(path: &Path) -> Result<(), CacheError> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => {
            if !metadata.is_dir() {
                return Err(CacheError::NotADirectory(path.to_path_buf()));
            }
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!("Creating cache directory: {}", path.display());
            tokio::fs::create_dir_all(path)
                .await
                .map_err(|e| CacheError::CacheDirCreation(path.to_path_buf(), e))?;
            Ok(())
        }
        Err(e) => Err(CacheError::CacheMetadataRead(path.to_path_buf(), e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_cache_dir_ends_with_weather_cache() {
        if let Some(dir) = get_cache_dir() {
            assert!(dir.ends_with("weather_features/weather-cache"));
        }
    }

    #[tokio::test]
    async fn creates_missing_directory() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("a").join("b");
        ensure_cache_dir_exists(&nested).await.unwrap();
        assert!(nested.is_dir());
        // Existing directory is fine too.
        ensure_cache_dir_exists(&nested).await.unwrap();
    }

    #[tokio::test]
    async fn rejects_file_in_place_of_directory() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = ensure_cache_dir_exists(file.path()).await.unwrap_err();
        assert!(matches!(err, CacheError::NotADirectory(_)));
    }
}
