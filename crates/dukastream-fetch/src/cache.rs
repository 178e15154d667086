//! Flat on-disk cache of decompressed payloads.
//!
//! One file per remote path, named after the path with separators replaced
//! by [`KEY_DELIMITER`]. Writes go through a uniquely named temporary file
//! and a rename, so a concurrent reader never sees a partial payload.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Replaces `/` in remote paths to keep the cache folder flat.
pub const KEY_DELIMITER: char = '-';

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Read-through/write-through payload cache rooted at a folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskCache {
    root: PathBuf,
}

impl DiskCache {
    /// Creates a cache rooted at `root`. The folder is created on first write.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the cache root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the cache key of a remote path.
    ///
    /// ```
    /// use dukastream_fetch::DiskCache;
    ///
    /// assert_eq!(
    ///     DiskCache::key("EURUSD/2019/01/04/00h_ticks.bi5"),
    ///     "EURUSD-2019-01-04-00h_ticks.bi5"
    /// );
    /// ```
    #[must_use]
    pub fn key(path: &str) -> String {
        path.replace('/', &KEY_DELIMITER.to_string())
    }

    /// Returns the file holding the payload of `path`.
    #[must_use]
    pub fn file_for(&self, path: &str) -> PathBuf {
        self.root.join(Self::key(path))
    }

    /// Reads the cached payload of `path`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub async fn read(&self, path: &str) -> io::Result<Option<Vec<u8>>> {
        match tokio::fs::read(self.file_for(path)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Stores the payload of `path`, creating the cache folder if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the folder or file cannot be written.
    pub async fn write(&self, path: &str, payload: &[u8]) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        let target = self.file_for(path);
        let temp = self.root.join(format!(
            ".{}.{}.{}.tmp",
            Self::key(path),
            std::process::id(),
            TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        tokio::fs::write(&temp, payload).await?;
        if let Err(e) = tokio::fs::rename(&temp, &target).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_key_is_flat() {
        let key = DiskCache::key("XAUUSD/2021/06/ASK_candles_hour_1.bi5");
        assert!(!key.contains('/'));
        assert_eq!(key, "XAUUSD-2021-06-ASK_candles_hour_1.bi5");
    }

    #[tokio::test]
    async fn test_read_missing_is_none() {
        let dir = TempDir::new().unwrap();
        let cache = DiskCache::new(dir.path());
        assert_eq!(cache.read("A/2020/00/01/00h_ticks.bi5").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_write_creates_folder_and_reads_back() {
        let dir = TempDir::new().unwrap();
        let cache = DiskCache::new(dir.path().join("nested").join("cache"));
        let path = "A/2020/00/01/00h_ticks.bi5";

        cache.write(path, &[1, 2, 3]).await.unwrap();

        assert!(cache.file_for(path).is_file());
        assert_eq!(cache.read(path).await.unwrap(), Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn test_overwrite_is_last_write_wins() {
        let dir = TempDir::new().unwrap();
        let cache = DiskCache::new(dir.path());
        let path = "A/2020/BID_candles_day_1.bi5";

        cache.write(path, &[1]).await.unwrap();
        cache.write(path, &[2, 2]).await.unwrap();

        assert_eq!(cache.read(path).await.unwrap(), Some(vec![2, 2]));
        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }
}
