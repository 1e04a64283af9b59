use std::path::Path;
use std::time::Duration;
use npgallery::{CacheKey, ErrorKind, ThumbnailStore};

fn key(name: &str) -> CacheKey {
    CacheKey::for_path(Path::new(name))
}

fn dir_entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn test_open_creates_cache_dir() {
    let tmp = tempfile::tempdir().unwrap();
    let cache_dir = tmp.path().join("nested").join("cache");

    let store = ThumbnailStore::open(&cache_dir).expect("Failed to open store");
    assert!(cache_dir.is_dir());
    assert_eq!(store.cache_dir(), cache_dir.as_path());
}

#[test]
fn test_path_for_uses_key_file_name() {
    let tmp = tempfile::tempdir().unwrap();
    let store = ThumbnailStore::open(tmp.path()).unwrap();
    let k = key("/tmp/test.png");
    assert_eq!(
        store.path_for(&k),
        tmp.path().join("920208a8948c944b4b392b70c7b8a00a.jpg")
    );
}

#[tokio::test]
async fn test_lookup_missing_is_miss() {
    let tmp = tempfile::tempdir().unwrap();
    let store = ThumbnailStore::open(tmp.path()).unwrap();

    assert!(store.lookup(&key("/nope.jpg")).await.unwrap().is_none());
    assert!(!store.contains(&key("/nope.jpg")).await.unwrap());
}

#[tokio::test]
async fn test_zero_length_entry_is_miss() {
    let tmp = tempfile::tempdir().unwrap();
    let store = ThumbnailStore::open(tmp.path()).unwrap();
    let k = key("/srv/media/empty.png");

    tokio::fs::write(store.path_for(&k), b"").await.unwrap();

    assert!(store.lookup(&k).await.unwrap().is_none());
    assert!(!store.contains(&k).await.unwrap());
}

#[tokio::test]
async fn test_store_then_lookup() {
    let tmp = tempfile::tempdir().unwrap();
    let store = ThumbnailStore::open(tmp.path()).unwrap();
    let k = key("/srv/media/a.png");

    let path = store.store(&k, b"jpeg-bytes").await.expect("Failed to store");
    assert_eq!(path, store.path_for(&k));
    assert_eq!(store.lookup(&k).await.unwrap().as_deref(), Some(&b"jpeg-bytes"[..]));
    assert!(store.contains(&k).await.unwrap());

    // no scratch files survive a successful write
    assert_eq!(dir_entries(tmp.path()), vec![k.file_name()]);
}

#[tokio::test]
async fn test_store_overwrites_previous_artifact() {
    let tmp = tempfile::tempdir().unwrap();
    let store = ThumbnailStore::open(tmp.path()).unwrap();
    let k = key("/srv/media/a.png");

    store.store(&k, b"first").await.unwrap();
    store.store(&k, b"second").await.unwrap();
    assert_eq!(store.lookup(&k).await.unwrap().as_deref(), Some(&b"second"[..]));
}

#[tokio::test]
async fn test_store_refuses_empty_bytes() {
    let tmp = tempfile::tempdir().unwrap();
    let store = ThumbnailStore::open(tmp.path()).unwrap();
    let k = key("/srv/media/a.png");

    let err = store.store(&k, b"").await.expect_err("stored empty artifact");
    assert_eq!(err.kind(), ErrorKind::StoreError);
    assert!(dir_entries(tmp.path()).is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_writers_same_key() {
    let tmp = tempfile::tempdir().unwrap();
    let store = ThumbnailStore::open(tmp.path()).unwrap();
    let k = key("/srv/media/a.png");
    let payload = vec![7u8; 64 * 1024];

    let writes = (0..8).map(|_| store.store(&k, &payload));
    for result in futures::future::join_all(writes).await {
        result.expect("Concurrent store failed");
    }

    assert_eq!(store.lookup(&k).await.unwrap(), Some(payload));
    assert_eq!(dir_entries(tmp.path()), vec![k.file_name()]);
}

#[tokio::test]
async fn test_remove() {
    let tmp = tempfile::tempdir().unwrap();
    let store = ThumbnailStore::open(tmp.path()).unwrap();
    let k = key("/srv/media/a.png");

    store.store(&k, b"bytes").await.unwrap();
    store.remove(&k).await.expect("Failed to remove");
    assert!(store.lookup(&k).await.unwrap().is_none());

    // removing again is fine
    store.remove(&k).await.expect("Second remove failed");
}

#[tokio::test]
async fn test_scratch_path_is_cleaned_on_drop() {
    let tmp = tempfile::tempdir().unwrap();
    let store = ThumbnailStore::open(tmp.path()).unwrap();
    let k = key("/srv/media/clip.mp4");

    let scratch = store.scratch_path(&k, "png").expect("Failed to create scratch");
    let scratch_file = scratch.to_path_buf();
    assert!(scratch_file.exists());
    assert!(scratch_file.starts_with(tmp.path()));
    assert!(scratch_file.to_string_lossy().ends_with(".png"));
    assert!(!scratch_file.to_string_lossy().ends_with(".jpg"));

    drop(scratch);
    assert!(!scratch_file.exists());
}

#[tokio::test]
async fn test_prune_older_than() {
    let tmp = tempfile::tempdir().unwrap();
    let store = ThumbnailStore::open(tmp.path()).unwrap();

    store.store(&key("/a.png"), b"a").await.unwrap();
    store.store(&key("/b.png"), b"b").await.unwrap();
    // unrelated files are left alone
    tokio::fs::write(tmp.path().join("README"), b"keep").await.unwrap();

    let deleted = store.prune_older_than(Duration::from_secs(3600)).await.unwrap();
    assert_eq!(deleted, 0);

    tokio::time::sleep(Duration::from_millis(50)).await;
    let deleted = store.prune_older_than(Duration::from_millis(10)).await.unwrap();
    assert_eq!(deleted, 2);
    assert_eq!(dir_entries(tmp.path()), vec!["README".to_string()]);
}
