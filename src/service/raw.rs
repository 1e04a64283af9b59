// Raw file lookup for pass-through serving

use std::path::PathBuf;

use tokio::fs;

use crate::error::{ErrorKind, GalleryError, GalleryResult};
use crate::metadata::MimeResolver;
use crate::path::PathResolver;

#[derive(Debug, Clone)]
pub struct RawFile {
    pub path: PathBuf,
    pub content_type: String,
}

pub struct RawService {
    resolver: PathResolver,
}

impl RawService {
    pub fn new(resolver: PathResolver) -> Self {
        Self { resolver }
    }

    /// Resolves `relative` to a regular file under the root.
    pub async fn resolve_file(&self, relative: &str) -> GalleryResult<RawFile> {
        if relative.is_empty() {
            return Err(GalleryError::new(ErrorKind::NotFound, "No path given"));
        }

        let path = self.resolver.resolve(relative)?;
        let metadata = fs::metadata(&path)
            .await
            .map_err(|_| GalleryError::new(ErrorKind::NotFound, "File not found"))?;
        if !metadata.is_file() {
            return Err(GalleryError::new(ErrorKind::NotFound, "Not a file"));
        }

        let content_type = MimeResolver::guess_mime_type(&path);
        Ok(RawFile { path, content_type })
    }
}
