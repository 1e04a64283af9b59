// Image and video transforms
// Letterbox composition, JPEG encoding and ffmpeg frame extraction

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use image::imageops::{self, FilterType};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageDecoder, ImageReader, Rgba, RgbaImage};
use tokio::process::Command;
use tracing::debug;

use crate::error::{GalleryError, GalleryResult};

/// Output geometry and encoding of every thumbnail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailSpec {
    /// Edge of the square canvas in pixels.
    pub size: u32,
    /// JPEG quality, 1-100.
    pub quality: u8,
    /// Opaque padding color.
    pub background: [u8; 3],
    /// Where in a video the preview frame is taken.
    pub video_timestamp: Duration,
}

impl Default for ThumbnailSpec {
    fn default() -> Self {
        Self {
            size: 300,
            quality: 70,
            background: [0, 0, 0],
            video_timestamp: Duration::from_secs(1),
        }
    }
}

/// Decodes an image and applies its EXIF orientation so the pixels match
/// what a viewer would show.
pub fn open_oriented(path: &Path) -> GalleryResult<DynamicImage> {
    let reader = ImageReader::open(path)?.with_guessed_format()?;
    let mut decoder = reader.into_decoder()?;
    let orientation = decoder.orientation().ok();
    let mut img = DynamicImage::from_decoder(decoder)?;
    if let Some(orientation) = orientation {
        img.apply_orientation(orientation);
    }
    Ok(img)
}

/// Scales `img` to fit inside the canvas without cropping and centers it on
/// an opaque background. Transparent pixels are flattened onto the background.
pub fn letterbox(img: &DynamicImage, spec: &ThumbnailSpec) -> RgbaImage {
    let [r, g, b] = spec.background;
    let mut canvas = RgbaImage::from_pixel(spec.size, spec.size, Rgba([r, g, b, 255]));

    let scaled = img.resize(spec.size, spec.size, FilterType::Triangle).to_rgba8();
    let x = (spec.size.saturating_sub(scaled.width()) / 2) as i64;
    let y = (spec.size.saturating_sub(scaled.height()) / 2) as i64;
    imageops::overlay(&mut canvas, &scaled, x, y);

    canvas
}

pub fn encode_jpeg(canvas: &RgbaImage, quality: u8) -> GalleryResult<Vec<u8>> {
    // JPEG has no alpha; the canvas is already opaque
    let rgb = DynamicImage::ImageRgba8(canvas.clone()).to_rgb8();
    let mut buffer = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
    encoder.encode_image(&rgb)?;
    Ok(buffer)
}

/// Letterbox followed by JPEG encode, the shared tail of both pipelines.
pub fn render(img: &DynamicImage, spec: &ThumbnailSpec) -> GalleryResult<Vec<u8>> {
    encode_jpeg(&letterbox(img, spec), spec.quality)
}

/// Pulls a single still out of a video into a file.
///
/// Producing no output (or an empty file) is how an implementation reports
/// that the requested timestamp lies past the end of the stream; hard
/// failures are errors.
#[async_trait]
pub trait FrameExtractor: Send + Sync {
    async fn extract_frame(&self, source: &Path, at: Duration, dest: &Path) -> GalleryResult<()>;
}

/// Frame extraction through an external `ffmpeg` binary.
#[derive(Debug, Clone)]
pub struct FfmpegFrameExtractor {
    binary: PathBuf,
}

impl FfmpegFrameExtractor {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for FfmpegFrameExtractor {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

#[async_trait]
impl FrameExtractor for FfmpegFrameExtractor {
    async fn extract_frame(&self, source: &Path, at: Duration, dest: &Path) -> GalleryResult<()> {
        let timestamp = format!("{:.3}", at.as_secs_f64());
        debug!(%timestamp, "Running ffmpeg frame extraction");

        // kill_on_drop: a timed out request must not leave ffmpeg behind
        let output = Command::new(&self.binary)
            .arg("-hide_banner")
            .args(["-loglevel", "error"])
            .args(["-ss", timestamp.as_str()])
            .arg("-i")
            .arg(source)
            .args(["-frames:v", "1", "-an", "-sn", "-dn", "-y"])
            .arg(dest)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| GalleryError::transform(format!("Failed to run ffmpeg: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GalleryError::transform(format!(
                "ffmpeg exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(())
    }
}
