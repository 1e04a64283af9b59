use std::path::Path;
use mime_guess::MimeGuess;

pub struct MimeResolver;

impl MimeResolver {
    /// Guesses the MIME type for a file path from its extension.
    pub fn guess_mime_type(path: &Path) -> String {
        let guess = MimeGuess::from_path(path);
        guess.first_or_octet_stream().to_string()
    }

    /// Like [`guess_mime_type`](Self::guess_mime_type) but `None` for unknown extensions.
    pub fn lookup(path: &Path) -> Option<String> {
        MimeGuess::from_path(path).first().map(|m| m.to_string())
    }

    /// Sniffs the leading bytes of a file. Only used when the name says nothing.
    pub async fn sniff(path: &Path) -> Option<String> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || infer::get_from_path(&path))
            .await
            .ok()?
            .ok()?
            .map(|t| t.mime_type().to_string())
    }
}

/// Which generation strategy applies to a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Image,
    Video,
    Other,
}

impl MediaKind {
    pub fn from_mime(mime: &str) -> Self {
        match mime.split('/').next() {
            Some("image") => MediaKind::Image,
            Some("video") => MediaKind::Video,
            _ => MediaKind::Other,
        }
    }

    /// Classifies by file name alone. No I/O.
    pub fn from_path(path: &Path) -> Self {
        MimeResolver::lookup(path)
            .map(|m| Self::from_mime(&m))
            .unwrap_or(MediaKind::Other)
    }

    /// Classifies by file name, falling back to content sniffing for names
    /// whose extension is unknown (e.g. `IMG_0001` with no suffix).
    pub async fn detect(path: &Path) -> Self {
        match MimeResolver::lookup(path) {
            Some(mime) => Self::from_mime(&mime),
            None => match MimeResolver::sniff(path).await {
                Some(mime) => Self::from_mime(&mime),
                None => MediaKind::Other,
            },
        }
    }

    pub fn is_previewable(&self) -> bool {
        !matches!(self, MediaKind::Other)
    }
}

