//! On-disk copy of the detectable-applications list.
//!
//! Stored as the raw JSON array under
//! `~/.cache/steam-presenced/games.json`. Freshness is judged by the
//! file's modification time.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use super::{CatalogError, DetectableApp};

/// Returns the default cache file path.
pub fn default_cache_path() -> Result<PathBuf, CatalogError> {
    let base = dirs::cache_dir().ok_or(CatalogError::NoCacheDir)?;
    Ok(cache_path_in(&base))
}

fn cache_path_in(base: &Path) -> PathBuf {
    base.join("steam-presenced").join("games.json")
}

/// Cache file handle.
#[derive(Debug, Clone)]
pub struct CatalogCache {
    path: PathBuf,
}

impl CatalogCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Time since the file was last written, or `None` if it does not
    /// exist or its mtime is unreadable.
    pub async fn age(&self) -> Option<Duration> {
        let modified = tokio::fs::metadata(&self.path).await.ok()?.modified().ok()?;
        // An mtime in the future counts as just written.
        Some(
            SystemTime::now()
                .duration_since(modified)
                .unwrap_or_default(),
        )
    }

    pub async fn is_fresh(&self, ttl: Duration) -> bool {
        self.age().await.is_some_and(|age| age < ttl)
    }

    pub async fn load(&self) -> Result<Vec<DetectableApp>, CatalogError> {
        let raw = tokio::fs::read(&self.path).await?;
        Ok(serde_json::from_slice(&raw)?)
    }

    /// Write the list, creating parent directories. The file is replaced
    /// atomically so a crash never leaves half a cache behind.
    pub async fn store(&self, apps: &[DetectableApp]) -> Result<(), CatalogError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let data = serde_json::to_vec(apps)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, data).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apps() -> Vec<DetectableApp> {
        vec![DetectableApp {
            id: "1209665818464358430".into(),
            name: "Balatro".into(),
            executables: Vec::new(),
        }]
    }

    fn backdate(path: &Path, by: Duration) {
        let file = std::fs::File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - by).unwrap();
    }

    #[test]
    fn cache_path_layout() {
        assert_eq!(
            cache_path_in(Path::new("/home/u/.cache")),
            PathBuf::from("/home/u/.cache/steam-presenced/games.json")
        );
    }

    #[tokio::test]
    async fn store_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CatalogCache::new(dir.path().join("nested/dir/games.json"));

        cache.store(&apps()).await.unwrap();
        assert_eq!(cache.load().await.unwrap(), apps());
        assert!(!dir.path().join("nested/dir/games.json.tmp").exists());
    }

    #[tokio::test]
    async fn missing_file_has_no_age() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CatalogCache::new(dir.path().join("games.json"));
        assert_eq!(cache.age().await, None);
        assert!(!cache.is_fresh(Duration::from_secs(3600)).await);
        assert!(matches!(cache.load().await, Err(CatalogError::Io(_))));
    }

    #[tokio::test]
    async fn freshness_respects_ttl() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CatalogCache::new(dir.path().join("games.json"));
        cache.store(&apps()).await.unwrap();

        let day = Duration::from_secs(24 * 3600);
        assert!(cache.is_fresh(day).await);

        backdate(cache.path(), day * 2);
        assert!(!cache.is_fresh(day).await);
        assert!(cache.is_fresh(day * 3).await);
    }

    #[tokio::test]
    async fn corrupt_file_is_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("games.json");
        std::fs::write(&path, b"{not json").unwrap();
        let cache = CatalogCache::new(path);
        assert!(matches!(cache.load().await, Err(CatalogError::Json(_))));
    }
}
