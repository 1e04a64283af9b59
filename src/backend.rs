//! Thumbnail pipeline building blocks
//!
//! - [`cache_key`]: path to cache identifier
//! - [`store`]: the on-disk artifact cache
//! - [`transform`]: letterbox composition, JPEG encoding, frame extraction
//! - [`generator`]: per-media-kind thumbnail generation

pub mod cache_key;
pub mod generator;
pub mod store;
pub mod transform;

pub use cache_key::CacheKey;
pub use generator::{ThumbnailGenerator, Thumbnailer};
pub use store::ThumbnailStore;
pub use transform::{FfmpegFrameExtractor, FrameExtractor, ThumbnailSpec};
