use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use npgallery::config::{prune_age, DEFAULT_GENERATION_TIMEOUT, DEFAULT_PORT};
use npgallery::{router, AppState, GalleryConfig};
use tower::ServiceExt;

#[test]
fn test_config_defaults() {
    let config = GalleryConfig::new("/srv/media", "/tmp/thumbs");
    assert_eq!(config.root.to_str(), Some("/srv/media"));
    assert_eq!(config.cache_dir.to_str(), Some("/tmp/thumbs"));
    assert_eq!(config.bind.port(), DEFAULT_PORT);
    assert_eq!(config.ffmpeg.to_str(), Some("ffmpeg"));
    assert_eq!(config.generation_timeout, DEFAULT_GENERATION_TIMEOUT);
    assert_eq!(DEFAULT_GENERATION_TIMEOUT, Duration::from_secs(30));
}

#[test]
fn test_prune_age() {
    assert_eq!(prune_age(0), Duration::ZERO);
    assert_eq!(prune_age(2), Duration::from_secs(2 * 86_400));
    assert_eq!(prune_age(u64::MAX), Duration::from_secs(u64::MAX));
}

#[tokio::test]
async fn test_state_from_config_creates_cache() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("media");
    std::fs::create_dir_all(root.join("album")).unwrap();
    let cache = tmp.path().join("nested").join("cache");

    let config = GalleryConfig::new(&root, &cache);
    let state = AppState::from_config(&config).unwrap();
    assert!(cache.is_dir());

    let app = router(Arc::new(state), None);
    let response = app
        .oneshot(Request::builder().uri("/api/browse").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
