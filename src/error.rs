use std::fmt;
use std::io;

/// Failure classes surfaced by the gallery.
///
/// `UnsupportedKind`, `TransformFailure` and `TimedOut` are produced by the
/// generator; the thumbnail service folds them into `NotFound` and
/// `GenerationError` before they reach a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BadRequest,
    AccessDenied,
    NotFound,
    UnsupportedKind,
    TransformFailure,
    TimedOut,
    GenerationError,
    StoreError,
    Failed,
}

#[derive(Debug)]
pub struct GalleryError {
    kind: ErrorKind,
    message: String,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl GalleryError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(source),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Re-labels the error while keeping its message and source.
    pub fn into_kind(mut self, kind: ErrorKind) -> Self {
        self.kind = kind;
        self
    }

    /// Wraps any I/O failure on the thumbnail cache itself.
    pub fn store(context: &str, err: io::Error) -> Self {
        Self::with_source(ErrorKind::StoreError, format!("{}: {}", context, err), Box::new(err))
    }

    pub fn transform(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TransformFailure, message)
    }
}

impl fmt::Display for GalleryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for GalleryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_deref().map(|e| e as &dyn std::error::Error)
    }
}

impl From<io::Error> for GalleryError {
    fn from(err: io::Error) -> Self {
        let kind = match err.kind() {
            io::ErrorKind::NotFound => ErrorKind::NotFound,
            io::ErrorKind::PermissionDenied => ErrorKind::AccessDenied,
            io::ErrorKind::InvalidInput => ErrorKind::BadRequest,
            io::ErrorKind::TimedOut => ErrorKind::TimedOut,
            _ => ErrorKind::Failed,
        };

        Self::with_source(kind, err.to_string(), Box::new(err))
    }
}

impl From<image::ImageError> for GalleryError {
    fn from(err: image::ImageError) -> Self {
        Self::with_source(ErrorKind::TransformFailure, err.to_string(), Box::new(err))
    }
}

impl From<tokio::task::JoinError> for GalleryError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::new(ErrorKind::Failed, format!("Join error: {}", err))
    }
}

pub type GalleryResult<T> = Result<T, GalleryError>;
