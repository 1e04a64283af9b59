// Cache key derivation
// Thumbnails are named after the MD5 of the resolved source path

use std::fmt;
use std::path::Path;

/// Lowercase hex MD5 of an absolute source path.
///
/// The key depends on the path only, so editing a file in place keeps
/// serving the old preview until the artifact is invalidated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn for_path(absolute: &Path) -> Self {
        let digest = md5::compute(absolute.to_string_lossy().as_bytes());
        CacheKey(format!("{:x}", digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Artifact file name inside the cache directory.
    pub fn file_name(&self) -> String {
        format!("{}.jpg", self.0)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
