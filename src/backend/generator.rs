// Thumbnail generator implementation
// Dispatches on media kind to the image or the video pipeline

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, info};

use crate::backend::cache_key::CacheKey;
use crate::backend::store::ThumbnailStore;
use crate::backend::transform::{self, FfmpegFrameExtractor, FrameExtractor, ThumbnailSpec};
use crate::error::{ErrorKind, GalleryError, GalleryResult};
use crate::metadata::MediaKind;

/// Produces JPEG preview bytes for a source file.
#[async_trait]
pub trait Thumbnailer: Send + Sync {
    async fn generate(&self, source: &Path, kind: MediaKind) -> GalleryResult<Vec<u8>>;
}

/// The default [`Thumbnailer`]: in-process letterboxing for images, one
/// extracted frame for videos.
pub struct ThumbnailGenerator {
    spec: ThumbnailSpec,
    extractor: Arc<dyn FrameExtractor>,
    scratch: ThumbnailStore,
}

impl ThumbnailGenerator {
    /// `scratch` only provides temporary files for extracted frames; the
    /// generator never writes artifacts itself.
    pub fn new(scratch: ThumbnailStore, extractor: Arc<dyn FrameExtractor>) -> Self {
        Self {
            spec: ThumbnailSpec::default(),
            extractor,
            scratch,
        }
    }

    pub fn with_ffmpeg(scratch: ThumbnailStore, binary: impl Into<std::path::PathBuf>) -> Self {
        Self::new(scratch, Arc::new(FfmpegFrameExtractor::new(binary)))
    }

    pub fn with_spec(mut self, spec: ThumbnailSpec) -> Self {
        self.spec = spec;
        self
    }

    async fn image_thumbnail(&self, source: &Path) -> GalleryResult<Vec<u8>> {
        let path = source.to_path_buf();
        let spec = self.spec.clone();
        tokio::task::spawn_blocking(move || {
            let img = transform::open_oriented(&path)?;
            transform::render(&img, &spec)
        })
        .await?
    }

    /// Grabs the frame at the configured timestamp. Clips shorter than that
    /// yield nothing there, in which case the first frame is used instead.
    async fn video_thumbnail(&self, source: &Path) -> GalleryResult<Vec<u8>> {
        let frame_path = self
            .scratch
            .scratch_path(&CacheKey::for_path(source), "png")?;

        let mut frame = self
            .extract(source, self.spec.video_timestamp, &frame_path)
            .await?;
        if frame.is_empty() && !self.spec.video_timestamp.is_zero() {
            debug!("No frame at {:?}, falling back to the first frame", self.spec.video_timestamp);
            frame = self.extract(source, Duration::ZERO, &frame_path).await?;
        }
        drop(frame_path);

        if frame.is_empty() {
            return Err(GalleryError::transform("Video yielded no frame"));
        }

        let spec = self.spec.clone();
        tokio::task::spawn_blocking(move || {
            let img = image::load_from_memory(&frame)?;
            transform::render(&img, &spec)
        })
        .await?
    }

    async fn extract(&self, source: &Path, at: Duration, dest: &Path) -> GalleryResult<Vec<u8>> {
        self.extractor.extract_frame(source, at, dest).await?;
        match fs::read(dest).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(GalleryError::transform(format!("Failed to read extracted frame: {}", e))),
        }
    }
}

#[async_trait]
impl Thumbnailer for ThumbnailGenerator {
    async fn generate(&self, source: &Path, kind: MediaKind) -> GalleryResult<Vec<u8>> {
        let started = std::time::Instant::now();
        let bytes = match kind {
            MediaKind::Image => self.image_thumbnail(source).await?,
            MediaKind::Video => self.video_thumbnail(source).await?,
            MediaKind::Other => {
                return Err(GalleryError::new(
                    ErrorKind::UnsupportedKind,
                    "No preview available for this file type",
                ))
            }
        };

        if bytes.is_empty() {
            return Err(GalleryError::transform("Encoder produced no output"));
        }

        info!(
            kind = ?kind,
            bytes = bytes.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Generated thumbnail"
        );
        Ok(bytes)
    }
}
