//! # npgallery - Nepsod Gallery
//!
//! Serves a directory tree over the local network as a media gallery:
//! directory listings, raw file transfer and letterboxed JPEG previews for
//! images and videos, cached on disk.
//!
//! ## Core Concepts
//!
//! - **PathResolver**: confines client paths to the configured root
//! - **CacheKey**: MD5 of the resolved source path, the artifact file stem
//! - **ThumbnailStore**: `<key>.jpg` artifacts; empty or missing means "not cached"
//! - **Thumbnailer**: image letterboxing and video frame extraction
//! - **ThumbnailService**: lookup, de-duplicated generation, storage
//!
//! ## Example
//!
//! ```no_run
//! use npgallery::{GalleryConfig, ThumbnailService};
//!
//! # async fn example() -> npgallery::GalleryResult<()> {
//! let config = GalleryConfig::new("/srv/media", "/var/cache/npgallery");
//! let service = ThumbnailService::from_config(&config)?;
//!
//! let thumbnail = service.get_thumbnail("photos/beach.jpg").await?;
//! println!("{} bytes of {}", thumbnail.bytes.len(), thumbnail.content_type());
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod metadata;
pub mod path;
pub mod server;
pub mod service;

pub use backend::{
    CacheKey, FfmpegFrameExtractor, FrameExtractor, ThumbnailGenerator, ThumbnailSpec,
    ThumbnailStore, Thumbnailer,
};
pub use config::GalleryConfig;
pub use error::{ErrorKind, GalleryError, GalleryResult};
pub use metadata::{MediaKind, MimeResolver};
pub use path::PathResolver;
pub use server::{router, serve, AppState};
pub use service::listing::{DirEntry, ListingService};
pub use service::raw::{RawFile, RawService};
pub use service::thumbnail::{Thumbnail, ThumbnailEvent, ThumbnailService};
