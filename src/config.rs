//! Runtime configuration
//!
//! Every setting has a default; the binary layers CLI flags and environment
//! variables on top. The served root is an explicit value handed to
//! [`crate::path::PathResolver`]; nothing reads it from global state.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;

pub const DEFAULT_ROOT: &str = "/Volumes/JAdv";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct GalleryConfig {
    /// Root of the served tree.
    pub root: PathBuf,
    /// Directory holding `<key>.jpg` artifacts.
    pub cache_dir: PathBuf,
    /// Static frontend assets.
    pub public_dir: PathBuf,
    pub bind: SocketAddr,
    pub ffmpeg: PathBuf,
    /// Upper bound for one generation attempt.
    pub generation_timeout: Duration,
}

impl GalleryConfig {
    pub fn new(root: impl Into<PathBuf>, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache_dir: cache_dir.into(),
            public_dir: PathBuf::from("public"),
            bind: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            ffmpeg: PathBuf::from("ffmpeg"),
            generation_timeout: DEFAULT_GENERATION_TIMEOUT,
        }
    }
}

/// The per-user cache directory, falling back to `./cache` when no home
/// directory can be determined.
pub fn default_cache_dir() -> PathBuf {
    ProjectDirs::from("", "Nepsod", "npgallery")
        .map(|dirs| dirs.cache_dir().join("thumbnails"))
        .unwrap_or_else(|| PathBuf::from("cache"))
}

/// Age threshold for `--prune-days`, saturating instead of overflowing.
pub fn prune_age(days: u64) -> Duration {
    Duration::from_secs(days.saturating_mul(24 * 60 * 60))
}
