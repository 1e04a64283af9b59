// Directory listing for the browse view

use std::cmp::Ordering;

use serde::Serialize;
use tokio::fs;
use tracing::debug;

use crate::error::GalleryResult;
use crate::metadata::MimeResolver;
use crate::path::PathResolver;

/// One row of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirEntry {
    pub name: String,
    /// Path relative to the served root, `/`-separated.
    pub path: String,
    pub is_dir: bool,
    /// `"folder"`, a MIME type, or `"unknown"`.
    #[serde(rename = "type")]
    pub kind: String,
}

pub struct ListingService {
    resolver: PathResolver,
}

impl ListingService {
    pub fn new(resolver: PathResolver) -> Self {
        Self { resolver }
    }

    /// Lists `relative` (the root when empty). Dotfiles are skipped and
    /// folders come first, each group ordered by name.
    pub async fn browse(&self, relative: &str) -> GalleryResult<Vec<DirEntry>> {
        let dir = self.resolver.resolve(relative)?;
        let mut read_dir = fs::read_dir(&dir).await?;
        let mut entries = Vec::new();

        while let Some(entry) = read_dir.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }

            // follows symlinks so linked folders browse like folders
            let is_dir = match fs::metadata(entry.path()).await {
                Ok(meta) => meta.is_dir(),
                Err(_) => entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false),
            };
            let kind = if is_dir {
                "folder".to_string()
            } else {
                MimeResolver::lookup(&entry.path()).unwrap_or_else(|| "unknown".to_string())
            };
            let path = self
                .resolver
                .relative(&entry.path())
                .unwrap_or_else(|| name.clone());

            entries.push(DirEntry {
                name,
                path,
                is_dir,
                kind,
            });
        }

        entries.sort_by(|a, b| match (a.is_dir, b.is_dir) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => a.name.cmp(&b.name),
        });

        debug!(count = entries.len(), "Listed directory");
        Ok(entries)
    }
}
