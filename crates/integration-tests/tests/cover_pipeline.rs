//! Cover pipeline against the real filesystem, decoder and encoder.

mod common;

use std::sync::Arc;

use api_adapters::Metrics;
use common::{image_bytes, processor, spooled, MediaDirs};
use domains::{CoverOutcome, CoverRejection, UploadedFile};
use image::ImageFormat;
use uuid::Uuid;

fn upload(path: std::path::PathBuf, media_type: &str) -> UploadedFile {
    UploadedFile {
        path,
        media_type: media_type.to_string(),
        original_name: Some("cover".to_string()),
    }
}

#[tokio::test]
async fn small_png_is_rejected_and_temp_removed() {
    let dirs = MediaDirs::new();
    let metrics = Arc::new(Metrics::new());
    let covers = processor(&dirs, metrics.clone()).await;
    let path = spooled(&dirs, "a", &image_bytes(500, 500, ImageFormat::Png));

    let outcome = covers.process(upload(path.clone(), "image/png")).await.unwrap();

    assert_eq!(
        outcome,
        CoverOutcome::Rejected(CoverRejection::InvalidSize {
            width: 500,
            height: 500
        })
    );
    assert!(!path.exists());
    assert!(dirs.cover_files().is_empty());
    assert!(metrics
        .render()
        .unwrap()
        .contains(r#"covers_processed_total{outcome="invalid size"} 1"#));
}

#[tokio::test]
async fn gif_is_rejected_by_type_before_decoding() {
    let dirs = MediaDirs::new();
    let covers = processor(&dirs, Arc::new(Metrics::new())).await;
    let path = spooled(&dirs, "b", &image_bytes(800, 900, ImageFormat::Gif));

    let outcome = covers.process(upload(path.clone(), "image/gif")).await.unwrap();

    assert_eq!(
        outcome,
        CoverOutcome::Rejected(CoverRejection::UnsupportedType("image/gif".into()))
    );
    assert!(!path.exists());
    assert!(dirs.cover_files().is_empty());
}

#[tokio::test]
async fn jpeg_in_bounds_is_stored_as_webp_under_a_uuid_name() {
    let dirs = MediaDirs::new();
    let covers = processor(&dirs, Arc::new(Metrics::new())).await;
    let path = spooled(&dirs, "c", &image_bytes(800, 600, ImageFormat::Jpeg));

    let outcome = covers.process(upload(path.clone(), "image/jpeg")).await.unwrap();

    let CoverOutcome::Stored(asset) = outcome else {
        panic!("expected a stored cover, got {outcome:?}");
    };
    let stem = asset.filename().strip_suffix(".webp").unwrap();
    assert_eq!(Uuid::parse_str(stem).unwrap().get_version_num(), 4);

    assert!(!path.exists());
    assert_eq!(dirs.cover_files(), vec![asset.filename().to_string()]);
    let stored = std::fs::read(dirs.covers.join(asset.filename())).unwrap();
    assert_eq!(&stored[0..4], b"RIFF");
    assert_eq!(&stored[8..12], b"WEBP");
}

#[tokio::test]
async fn bounds_are_inclusive() {
    let dirs = MediaDirs::new();
    let covers = processor(&dirs, Arc::new(Metrics::new())).await;

    for (i, (w, h)) in [(600, 400), (1200, 1200)].into_iter().enumerate() {
        let path = spooled(&dirs, &format!("edge-{i}"), &image_bytes(w, h, ImageFormat::Png));
        let outcome = covers.process(upload(path, "image/png")).await.unwrap();
        assert!(matches!(outcome, CoverOutcome::Stored(_)), "{w}x{h}");
    }

    let path = spooled(&dirs, "wide", &image_bytes(1201, 800, ImageFormat::Png));
    let outcome = covers.process(upload(path, "image/png")).await.unwrap();
    assert!(matches!(
        outcome,
        CoverOutcome::Rejected(CoverRejection::InvalidSize { width: 1201, .. })
    ));
    assert_eq!(dirs.cover_files().len(), 2);
}

#[tokio::test]
async fn declared_type_is_trusted_and_content_is_decoded_as_is() {
    let dirs = MediaDirs::new();
    let covers = processor(&dirs, Arc::new(Metrics::new())).await;
    // PNG bytes declared as JPEG still pass: only the declaration is gated.
    let path = spooled(&dirs, "d", &image_bytes(700, 500, ImageFormat::Png));

    let outcome = covers.process(upload(path, "image/jpeg")).await.unwrap();
    assert!(matches!(outcome, CoverOutcome::Stored(_)));
}

#[tokio::test]
async fn garbage_declared_as_png_is_undecodable() {
    let dirs = MediaDirs::new();
    let covers = processor(&dirs, Arc::new(Metrics::new())).await;
    let path = spooled(&dirs, "e", b"this is not a picture at all");

    let outcome = covers.process(upload(path.clone(), "image/png")).await.unwrap();
    assert_eq!(outcome, CoverOutcome::Rejected(CoverRejection::Undecodable));
    assert!(!path.exists());
}

#[tokio::test]
async fn every_stored_cover_gets_a_fresh_name() {
    let dirs = MediaDirs::new();
    let covers = processor(&dirs, Arc::new(Metrics::new())).await;
    let bytes = image_bytes(640, 480, ImageFormat::Png);

    let mut names = Vec::new();
    for i in 0..3 {
        let path = spooled(&dirs, &format!("same-{i}"), &bytes);
        match covers.process(upload(path, "image/png")).await.unwrap() {
            CoverOutcome::Stored(asset) => names.push(asset.into_filename()),
            other => panic!("unexpected {other:?}"),
        }
    }
    names.sort();
    names.dedup();
    assert_eq!(names.len(), 3);
    assert!(dirs.upload_files().is_empty());
}
