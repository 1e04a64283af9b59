//! HTTP surface
//!
//! `GET /api/browse?path=` lists a directory, `GET /api/thumb?path=` returns a
//! JPEG preview and `GET /api/raw?path=` streams the file itself (with Range
//! support). Everything else falls through to the static frontend.
//!
//! Error responses never carry filesystem paths.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use axum::extract::{Query, Request, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use mime_guess::Mime;
use serde::{Deserialize, Serialize};
use tower::ServiceExt;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use crate::config::GalleryConfig;
use crate::error::{ErrorKind, GalleryResult};
use crate::path::PathResolver;
use crate::service::listing::{DirEntry, ListingService};
use crate::service::raw::{RawFile, RawService};
use crate::service::thumbnail::{Thumbnail, ThumbnailService};

pub struct AppState {
    pub thumbnails: ThumbnailService,
    pub listing: ListingService,
    pub raw: RawService,
}

impl AppState {
    pub fn new(resolver: PathResolver, thumbnails: ThumbnailService) -> Self {
        Self {
            thumbnails,
            listing: ListingService::new(resolver.clone()),
            raw: RawService::new(resolver),
        }
    }

    pub fn from_config(config: &GalleryConfig) -> GalleryResult<Self> {
        let thumbnails = ThumbnailService::from_config(config)?;
        Ok(Self::new(PathResolver::new(&config.root), thumbnails))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PathQuery {
    #[serde(default)]
    path: Option<String>,
}

#[derive(Serialize)]
struct Listing {
    items: Vec<DirEntry>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
}

/// Builds the application router. `public_dir`, when given, is served for
/// every path the API does not claim.
pub fn router(state: Arc<AppState>, public_dir: Option<&Path>) -> Router {
    let api = Router::new()
        .route("/api/browse", get(browse))
        .route("/api/thumb", get(thumb))
        .route("/api/raw", get(raw))
        .with_state(state);

    let app = match public_dir {
        Some(dir) => api.fallback_service(ServeDir::new(dir)),
        None => api,
    };

    app.layer(TraceLayer::new_for_http())
}

/// Binds `config.bind` and serves until `shutdown` resolves.
pub async fn serve(
    config: &GalleryConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> GalleryResult<()> {
    let state = Arc::new(AppState::from_config(config)?);
    let app = router(state, Some(config.public_dir.as_path()));

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    info!("Listening on http://{}", config.bind);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

// `Query` decodes `path` once; `PathResolver::resolve` decodes it again.
async fn browse(State(state): State<Arc<AppState>>, Query(query): Query<PathQuery>) -> Response {
    let relative = query.path.unwrap_or_default();
    match state.listing.browse(&relative).await {
        Ok(items) => Json(Listing { items }).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to read directory");
            let status = match e.kind() {
                ErrorKind::AccessDenied => StatusCode::FORBIDDEN,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, Json(ErrorBody { error: "Unable to read directory" })).into_response()
        }
    }
}

async fn thumb(State(state): State<Arc<AppState>>, Query(query): Query<PathQuery>) -> Response {
    let relative = query.path.unwrap_or_default();
    match state.thumbnails.get_thumbnail(&relative).await {
        Ok(thumbnail) => (
            [
                (header::CONTENT_TYPE, Thumbnail::CONTENT_TYPE),
                (header::CACHE_CONTROL, "public, max-age=86400"),
            ],
            thumbnail.bytes,
        )
            .into_response(),
        Err(e) => {
            let status = thumb_status(e.kind());
            if status.is_server_error() {
                error!(error = %e, "Thumbnail request failed");
            } else {
                debug!(error = %e, "Thumbnail request rejected");
            }
            status.into_response()
        }
    }
}

async fn raw(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PathQuery>,
    request: Request,
) -> Response {
    let relative = query.path.unwrap_or_default();
    match state.raw.resolve_file(&relative).await {
        Ok(file) => match serve_file(&file).oneshot(request).await {
            Ok(response) => response.into_response(),
            Err(never) => match never {},
        },
        Err(e) => {
            debug!(error = %e, "Raw request rejected");
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

fn serve_file(file: &RawFile) -> ServeFile {
    match file.content_type.parse::<Mime>() {
        Ok(mime) => ServeFile::new_with_mime(&file.path, &mime),
        Err(_) => ServeFile::new(&file.path),
    }
}

pub fn thumb_status(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::BadRequest | ErrorKind::NotFound | ErrorKind::UnsupportedKind => {
            StatusCode::NOT_FOUND
        }
        ErrorKind::AccessDenied => StatusCode::FORBIDDEN,
        ErrorKind::TransformFailure
        | ErrorKind::TimedOut
        | ErrorKind::GenerationError
        | ErrorKind::StoreError
        | ErrorKind::Failed => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
