// Thumbnail store implementation
// On-disk cache of `<key>.jpg` artifacts with atomic replacement

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempPath;
use tokio::fs;
use tracing::{debug, warn};

use crate::backend::cache_key::CacheKey;
use crate::error::{ErrorKind, GalleryError, GalleryResult};

/// Marker carried by every scratch file name. Artifacts never contain it.
const SCRATCH_MARKER: &str = ".part";

/// Cache directory of generated thumbnails.
///
/// An artifact counts as cached only when its file exists and is non-empty.
/// Writes go to a scratch file first and are renamed into place, so a reader
/// sees either the previous artifact, nothing, or the complete new one.
#[derive(Debug, Clone)]
pub struct ThumbnailStore {
    cache_dir: PathBuf,
}

impl ThumbnailStore {
    /// Opens the store, creating the cache directory if needed.
    pub fn open(cache_dir: impl Into<PathBuf>) -> GalleryResult<Self> {
        let cache_dir = cache_dir.into();
        std::fs::create_dir_all(&cache_dir)
            .map_err(|e| GalleryError::store("Failed to create cache dir", e))?;
        Ok(Self { cache_dir })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.cache_dir.join(key.file_name())
    }

    /// Returns the cached bytes, or `None` when the artifact is missing or empty.
    pub async fn lookup(&self, key: &CacheKey) -> GalleryResult<Option<Vec<u8>>> {
        let path = self.path_for(key);
        match fs::read(&path).await {
            Ok(bytes) if bytes.is_empty() => {
                debug!(%key, "Ignoring zero-length cache entry");
                Ok(None)
            }
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(GalleryError::store("Failed to read thumbnail", e)),
        }
    }

    /// Whether a valid artifact exists, without reading it.
    pub async fn contains(&self, key: &CacheKey) -> GalleryResult<bool> {
        match fs::metadata(self.path_for(key)).await {
            Ok(meta) => Ok(meta.is_file() && meta.len() > 0),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(GalleryError::store("Failed to stat thumbnail", e)),
        }
    }

    /// Persists `bytes` as the artifact for `key`.
    ///
    /// Concurrent writers of the same key are safe: each renames its own
    /// complete scratch file over the target and the last one wins.
    pub async fn store(&self, key: &CacheKey, bytes: &[u8]) -> GalleryResult<PathBuf> {
        if bytes.is_empty() {
            return Err(GalleryError::new(
                ErrorKind::StoreError,
                "Refusing to cache an empty thumbnail",
            ));
        }

        let dir = self.cache_dir.clone();
        let target = self.path_for(key);
        let prefix = format!("{}.", key);
        let data = bytes.to_vec();

        let final_path = target.clone();
        tokio::task::spawn_blocking(move || -> io::Result<()> {
            let mut scratch = tempfile::Builder::new()
                .prefix(&prefix)
                .suffix(SCRATCH_MARKER)
                .tempfile_in(&dir)?;
            scratch.write_all(&data)?;
            scratch.as_file().sync_all()?;
            scratch.persist(&target).map_err(|e| e.error)?;
            Ok(())
        })
        .await?
        .map_err(|e| GalleryError::store("Failed to write thumbnail", e))?;

        let len = fs::metadata(&final_path)
            .await
            .map_err(|e| GalleryError::store("Failed to verify thumbnail", e))?
            .len();
        if len == 0 {
            return Err(GalleryError::new(
                ErrorKind::StoreError,
                "Thumbnail is empty after write",
            ));
        }

        debug!(%key, bytes = len, "Stored thumbnail");
        Ok(final_path)
    }

    /// A fresh scratch file in the cache directory for tools that insist on
    /// writing to a path. The file is deleted when the returned handle drops.
    pub fn scratch_path(&self, key: &CacheKey, extension: &str) -> GalleryResult<TempPath> {
        let file = tempfile::Builder::new()
            .prefix(&format!("{}.", key))
            .suffix(&format!("{}.{}", SCRATCH_MARKER, extension))
            .tempfile_in(&self.cache_dir)
            .map_err(|e| GalleryError::store("Failed to create scratch file", e))?;
        Ok(file.into_temp_path())
    }

    /// Deletes the artifact for `key`. A missing artifact is not an error.
    pub async fn remove(&self, key: &CacheKey) -> GalleryResult<()> {
        match fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(GalleryError::store("Failed to remove thumbnail", e)),
        }
    }

    /// Deletes artifacts and leftover scratch files last modified more than
    /// `max_age` ago. Returns how many files were removed.
    ///
    /// Nothing on the request path calls this; the cache only shrinks when an
    /// operator asks for it.
    pub async fn prune_older_than(&self, max_age: Duration) -> GalleryResult<usize> {
        let mut entries = match fs::read_dir(&self.cache_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(GalleryError::store("Failed to read cache dir", e)),
        };

        let mut deleted = 0;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| GalleryError::store("Failed to read cache dir", e))?
        {
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().into_owned();
            let is_artifact = name.ends_with(".jpg") && !name.contains(SCRATCH_MARKER);
            if !is_artifact && !name.contains(SCRATCH_MARKER) {
                continue;
            }

            let metadata = match entry.metadata().await {
                Ok(m) if m.is_file() => m,
                _ => continue,
            };
            let expired = metadata
                .modified()
                .ok()
                .and_then(|m| m.elapsed().ok())
                .map(|age| age > max_age)
                .unwrap_or(false);

            if expired {
                match fs::remove_file(&path).await {
                    Ok(()) => deleted += 1,
                    Err(e) => warn!(file = %name, error = %e, "Failed to prune cache entry"),
                }
            }
        }

        debug!(deleted, "Pruned thumbnail cache");
        Ok(deleted)
    }
}
