//! Mapping of client-supplied relative paths onto the served root.

use std::path::{Component, Path, PathBuf};

use percent_encoding::percent_decode_str;

use crate::error::{ErrorKind, GalleryError, GalleryResult};

/// Confines every resolved path to a single root directory.
///
/// Resolution is purely lexical: no filesystem access happens here, so a
/// denied request never touches the disk.
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
}

impl PathResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: normalize(&root.into()),
        }
    }

    /// Percent-decodes `relative`, joins it onto the root and normalizes it.
    ///
    /// Fails with `AccessDenied` for absolute inputs and for any `..` that
    /// would climb above the root.
    ///
    /// Query values reach this already decoded once by the HTTP layer, so a
    /// path is decoded twice end to end. Clients that send encoded paths
    /// inside the query keep working; a file whose name contains a literal
    /// `%XX` sequence must be requested with its `%` escaped as `%25`.
    pub fn resolve(&self, relative: &str) -> GalleryResult<PathBuf> {
        let decoded = percent_decode_str(relative).decode_utf8().map_err(|_| {
            GalleryError::new(ErrorKind::BadRequest, "Path is not valid UTF-8")
        })?;

        let mut resolved = self.root.clone();
        let mut depth = 0usize;

        for component in Path::new(&*decoded).components() {
            match component {
                Component::Normal(part) => {
                    resolved.push(part);
                    depth += 1;
                }
                Component::CurDir => {}
                Component::ParentDir => {
                    if depth == 0 {
                        return Err(denied());
                    }
                    resolved.pop();
                    depth -= 1;
                }
                Component::RootDir | Component::Prefix(_) => return Err(denied()),
            }
        }

        if !resolved.starts_with(&self.root) {
            return Err(denied());
        }

        Ok(resolved)
    }

    /// The client-facing form of a path under the root, `/`-separated.
    pub fn relative(&self, absolute: &Path) -> Option<String> {
        let rest = absolute.strip_prefix(&self.root).ok()?;
        let parts: Vec<String> = rest
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        Some(parts.join("/"))
    }
}

fn denied() -> GalleryError {
    GalleryError::new(ErrorKind::AccessDenied, "Access Denied")
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
