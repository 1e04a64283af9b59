// Thumbnail service implementation
// Resolves, looks up, generates and caches previews for gallery paths

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::fs;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::backend::cache_key::CacheKey;
use crate::backend::generator::{ThumbnailGenerator, Thumbnailer};
use crate::backend::store::ThumbnailStore;
use crate::config::{GalleryConfig, DEFAULT_GENERATION_TIMEOUT};
use crate::error::{ErrorKind, GalleryError, GalleryResult};
use crate::metadata::MediaKind;
use crate::path::PathResolver;

/// Event emitted when a generation attempt completes
#[derive(Debug, Clone)]
pub enum ThumbnailEvent {
    /// A new artifact was generated and stored
    ThumbnailReady {
        path: String,
        key: CacheKey,
        kind: MediaKind,
    },
    /// Generation or storage failed; nothing was cached
    ThumbnailFailed {
        path: String,
        key: CacheKey,
        error_kind: ErrorKind,
        error_message: String,
    },
}

/// JPEG preview returned to callers
#[derive(Debug, Clone)]
pub struct Thumbnail {
    pub bytes: Vec<u8>,
    /// Served from the cache without generation work
    pub cached: bool,
}

impl Thumbnail {
    pub const CONTENT_TYPE: &'static str = "image/jpeg";

    pub fn content_type(&self) -> &'static str {
        Self::CONTENT_TYPE
    }
}

/// Thumbnail service for gallery paths
pub struct ThumbnailService {
    resolver: PathResolver,
    store: ThumbnailStore,
    thumbnailer: Arc<dyn Thumbnailer>,
    timeout: Duration,
    in_flight: Mutex<HashMap<CacheKey, Arc<tokio::sync::Mutex<()>>>>,
    event_sender: broadcast::Sender<ThumbnailEvent>,
}

impl ThumbnailService {
    pub fn new(
        resolver: PathResolver,
        store: ThumbnailStore,
        thumbnailer: Arc<dyn Thumbnailer>,
    ) -> Self {
        let (sender, _) = broadcast::channel(100);
        Self {
            resolver,
            store,
            thumbnailer,
            timeout: DEFAULT_GENERATION_TIMEOUT,
            in_flight: Mutex::new(HashMap::new()),
            event_sender: sender,
        }
    }

    /// Wires the ffmpeg-backed generator and the on-disk store from `config`.
    pub fn from_config(config: &GalleryConfig) -> GalleryResult<Self> {
        let store = ThumbnailStore::open(&config.cache_dir)?;
        let generator = ThumbnailGenerator::with_ffmpeg(store.clone(), &config.ffmpeg);
        Ok(Self::new(PathResolver::new(&config.root), store, Arc::new(generator))
            .with_timeout(config.generation_timeout))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Subscribe to thumbnail events
    pub fn subscribe(&self) -> broadcast::Receiver<ThumbnailEvent> {
        self.event_sender.subscribe()
    }

    pub fn store(&self) -> &ThumbnailStore {
        &self.store
    }

    /// Whether `relative` names an image or video. Does not check existence.
    pub async fn is_supported(&self, relative: &str) -> GalleryResult<bool> {
        let source = self.resolver.resolve(relative)?;
        Ok(MediaKind::detect(&source).await.is_previewable())
    }

    /// Returns the preview for `relative`, generating and caching it on a miss.
    ///
    /// Concurrent misses for the same file share one generation: later
    /// callers wait for the first and then read its artifact.
    pub async fn get_thumbnail(&self, relative: &str) -> GalleryResult<Thumbnail> {
        if relative.is_empty() {
            return Err(GalleryError::new(ErrorKind::BadRequest, "No path given"));
        }

        let source = self.resolver.resolve(relative)?;
        let key = CacheKey::for_path(&source);

        if let Some(bytes) = self.store.lookup(&key).await? {
            debug!(%key, "Cache hit");
            return Ok(Thumbnail { bytes, cached: true });
        }

        // declared before the gate so the entry is released after the gate
        // is dropped, including when this future is cancelled
        let _in_flight = InFlight { service: self, key: &key };
        let gate = self.gate(&key);
        let _permit = gate.lock().await;
        self.fill(relative, &source, &key).await
    }

    async fn fill(&self, relative: &str, source: &Path, key: &CacheKey) -> GalleryResult<Thumbnail> {
        // filled by whoever held the gate before us
        if let Some(bytes) = self.store.lookup(key).await? {
            debug!(%key, "Cache hit after wait");
            return Ok(Thumbnail { bytes, cached: true });
        }

        let metadata = match fs::metadata(source).await {
            Ok(m) if m.is_file() => m,
            Ok(_) => return Err(GalleryError::new(ErrorKind::NotFound, "Not a file")),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(GalleryError::new(ErrorKind::NotFound, "File not found"))
            }
            Err(e) => return Err(e.into()),
        };

        let kind = MediaKind::detect(source).await;
        if kind == MediaKind::Other {
            return Err(GalleryError::new(ErrorKind::NotFound, "Unsupported media type"));
        }

        let modified = metadata
            .modified()
            .ok()
            .map(|t| DateTime::<Utc>::from(t).to_rfc3339())
            .unwrap_or_default();
        info!(%key, ?kind, size = metadata.len(), %modified, "Cache miss, generating");

        let outcome = match tokio::time::timeout(self.timeout, self.thumbnailer.generate(source, kind)).await {
            Ok(Ok(bytes)) => self.store.store(key, &bytes).await.map(|_| bytes),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(GalleryError::new(
                ErrorKind::TimedOut,
                format!("Generation exceeded {:?}", self.timeout),
            )),
        };

        match outcome {
            Ok(bytes) => {
                let _ = self.event_sender.send(ThumbnailEvent::ThumbnailReady {
                    path: relative.to_string(),
                    key: key.clone(),
                    kind,
                });
                Ok(Thumbnail { bytes, cached: false })
            }
            Err(e) => {
                // a leftover artifact would be served as a permanent hit
                if let Err(cleanup) = self.store.remove(key).await {
                    warn!(%key, error = %cleanup, "Failed to clear artifact after failed generation");
                }

                let e = classify(e);
                warn!(%key, error = %e, "Thumbnail generation failed");
                let _ = self.event_sender.send(ThumbnailEvent::ThumbnailFailed {
                    path: relative.to_string(),
                    key: key.clone(),
                    error_kind: e.kind(),
                    error_message: e.message().to_string(),
                });
                Err(e)
            }
        }
    }

    /// Drops the cached artifact for `relative`, forcing regeneration.
    pub async fn invalidate(&self, relative: &str) -> GalleryResult<()> {
        let source = self.resolver.resolve(relative)?;
        self.store.remove(&CacheKey::for_path(&source)).await
    }

    /// Operator-driven cache cleanup, see [`ThumbnailStore::prune_older_than`].
    pub async fn prune(&self, max_age: Duration) -> GalleryResult<usize> {
        self.store.prune_older_than(max_age).await
    }

    fn gate(&self, key: &CacheKey) -> Arc<tokio::sync::Mutex<()>> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| {
            warn!("Recovering poisoned in-flight map");
            e.into_inner()
        });
        in_flight.entry(key.clone()).or_default().clone()
    }

    fn release(&self, key: &CacheKey) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| {
            warn!("Recovering poisoned in-flight map");
            e.into_inner()
        });
        if in_flight.get(key).is_some_and(|gate| Arc::strong_count(gate) == 1) {
            in_flight.remove(key);
        }
    }

    /// Number of keys with a generation in progress or queued.
    pub fn in_flight(&self) -> usize {
        self.in_flight.lock().map(|m| m.len()).unwrap_or_else(|e| e.into_inner().len())
    }
}

/// Releases a key's in-flight entry when the request holding it ends.
struct InFlight<'a> {
    service: &'a ThumbnailService,
    key: &'a CacheKey,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.service.release(self.key);
    }
}

/// Folds generator-level failures into what callers act on.
fn classify(e: GalleryError) -> GalleryError {
    match e.kind() {
        ErrorKind::UnsupportedKind => e.into_kind(ErrorKind::NotFound),
        ErrorKind::TransformFailure | ErrorKind::TimedOut | ErrorKind::Failed => {
            e.into_kind(ErrorKind::GenerationError)
        }
        _ => e,
    }
}
