use std::path::Path;
use image::{Rgb, RgbImage};
use npgallery::{MediaKind, MimeResolver};

#[test]
fn test_mime_guessing() {
    assert_eq!(MimeResolver::guess_mime_type(Path::new("a.png")), "image/png");
    assert_eq!(MimeResolver::guess_mime_type(Path::new("notes.txt")), "text/plain");
    assert_eq!(
        MimeResolver::guess_mime_type(Path::new("mystery")),
        "application/octet-stream"
    );
    assert_eq!(MimeResolver::lookup(Path::new("mystery")), None);
}

#[test]
fn test_media_kind_from_name() {
    assert_eq!(MediaKind::from_path(Path::new("photos/a.png")), MediaKind::Image);
    assert_eq!(MediaKind::from_path(Path::new("photos/B.JPEG")), MediaKind::Image);
    assert_eq!(MediaKind::from_path(Path::new("clips/b.mp4")), MediaKind::Video);
    assert_eq!(MediaKind::from_path(Path::new("clips/c.mov")), MediaKind::Video);
    assert_eq!(MediaKind::from_path(Path::new("docs/notes.txt")), MediaKind::Other);
    assert_eq!(MediaKind::from_path(Path::new("docs/Makefile")), MediaKind::Other);

    assert!(MediaKind::Image.is_previewable());
    assert!(MediaKind::Video.is_previewable());
    assert!(!MediaKind::Other.is_previewable());
}

#[test]
fn test_media_kind_from_mime() {
    assert_eq!(MediaKind::from_mime("image/webp"), MediaKind::Image);
    assert_eq!(MediaKind::from_mime("video/x-matroska"), MediaKind::Video);
    assert_eq!(MediaKind::from_mime("audio/mpeg"), MediaKind::Other);
    assert_eq!(MediaKind::from_mime(""), MediaKind::Other);
}

#[tokio::test]
async fn test_detect_sniffs_unknown_extensions() {
    let tmp = tempfile::tempdir().unwrap();

    // 1. Extension-less PNG is recognized by content
    let png = tmp.path().join("IMG_0001");
    RgbImage::from_pixel(4, 4, Rgb([0, 0, 0]))
        .save_with_format(&png, image::ImageFormat::Png)
        .unwrap();
    assert_eq!(MediaKind::detect(&png).await, MediaKind::Image);

    // 2. Extension wins when present, even if content disagrees
    let txt = tmp.path().join("really-png.txt");
    std::fs::copy(&png, &txt).unwrap();
    assert_eq!(MediaKind::detect(&txt).await, MediaKind::Other);

    // 3. Unknown content and no extension
    let blob = tmp.path().join("blob");
    std::fs::write(&blob, b"just some words").unwrap();
    assert_eq!(MediaKind::detect(&blob).await, MediaKind::Other);

    // 4. Missing file
    assert_eq!(MediaKind::detect(&tmp.path().join("gone")).await, MediaKind::Other);
}
