//! Services behind the gallery routes
//!
//! - ThumbnailService: cached thumbnail generation
//! - ListingService: directory browsing
//! - RawService: raw file resolution

pub mod listing;
pub mod raw;
pub mod thumbnail;
