mod common;

use std::fs;
use std::sync::Arc;
use image::{Rgb, RgbImage};
use tempfile::TempDir;

use common::*;
use thumbkit_lib::constants::{MIME_DOCX, PASSWORD_PROTECTED_TEXT};
use thumbkit_lib::external::Backends;
use thumbkit_lib::render::{render_placeholder, render_text_preview};
use thumbkit_lib::strategy::Strategy;
use thumbkit_lib::thumbnail::read_preview_lines;
use thumbkit_lib::types::{FailureKind, OutputFormat, ThumbnailStatus};
use thumbkit_lib::{Settings, ThumbnailService};

#[tokio::test]
async fn oversized_file_is_rejected_without_output() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("huge.png");
    RgbImage::from_pixel(64, 64, Rgb([1, 2, 3])).save(&path).unwrap();

    let settings = Settings {
        max_file_size: 16,
        ..Settings::default()
    };
    let report = service(settings).process_path(&path).await.unwrap();

    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].status, ThumbnailStatus::Rejected);
    assert_eq!(
        report.results[0].failure.as_ref().unwrap().kind,
        FailureKind::SizeLimitExceeded
    );
    assert!(thumbnails_in(dir.path()).is_empty());
}

#[tokio::test]
async fn unknown_type_matches_placeholder_output() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data.xyz");
    fs::write(&path, b"opaque bytes").unwrap();

    let settings = Settings::default();
    let report = service(settings.clone()).process_path(&path).await.unwrap();

    let result = &report.results[0];
    assert_eq!(result.status, ThumbnailStatus::Success);
    assert_eq!(result.strategy, Some(Strategy::Default));

    let written = fs::read(result.output_path.as_ref().unwrap()).unwrap();
    let expected = persisted_bytes(
        &settings,
        &render_placeholder("data.xyz", settings.dimensions()),
        "data.xyz",
        OutputFormat::Jpeg,
    );
    assert_eq!(written, expected);
}

#[tokio::test]
async fn second_call_is_a_cache_hit() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("notes.xyz");
    fs::write(&path, b"x").unwrap();

    let service = service(Settings::default());
    let first = service.process_path(&path).await.unwrap();
    assert_eq!(first.results.len(), 1);

    let output = dir.path().join("thumb_notes.jpg");
    let modified = fs::metadata(&output).unwrap().modified().unwrap();

    let second = service.process_path(&path).await.unwrap();
    assert!(second.results.is_empty());
    assert_eq!(second.cache_hits, 1);
    assert_eq!(fs::metadata(&output).unwrap().modified().unwrap(), modified);
    assert_eq!(thumbnails_in(dir.path()), vec!["thumb_notes.jpg"]);
}

#[tokio::test]
async fn concurrent_requests_generate_once() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("same.xyz");
    fs::write(&path, b"x").unwrap();

    let service = service(Settings::default());
    let (a, b) = tokio::join!(service.process_path(&path), service.process_path(&path));
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_eq!(a.results.len() + b.results.len(), 1);
    assert_eq!(a.cache_hits + b.cache_hits, 1);
}

#[tokio::test]
async fn invalidated_path_is_processed_again() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("again.xyz");
    fs::write(&path, b"x").unwrap();

    let service = service(Settings::default());
    service.process_path(&path).await.unwrap();
    service.cache().invalidate(&path);

    let report = service.process_path(&path).await.unwrap();
    assert_eq!(report.results.len(), 1);
}

#[tokio::test]
async fn corrupt_image_degrades_to_placeholder() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.png");
    fs::write(&path, b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDRgarbage").unwrap();

    let settings = Settings::default();
    let report = service(settings.clone()).process_path(&path).await.unwrap();

    let result = &report.results[0];
    assert_eq!(result.status, ThumbnailStatus::Degraded);
    assert_eq!(result.strategy, Some(Strategy::Image));
    assert_eq!(result.attempts, settings.max_attempts);
    assert_eq!(result.failure.as_ref().unwrap().kind, FailureKind::UnreadableContent);

    let written = fs::read(result.output_path.as_ref().unwrap()).unwrap();
    let expected = persisted_bytes(
        &settings,
        &render_placeholder("broken.png", settings.dimensions()),
        "broken.png",
        OutputFormat::Jpeg,
    );
    assert_eq!(written, expected);
}

#[tokio::test]
async fn classification_failure_degrades_with_reason() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("photo.png");
    RgbImage::from_pixel(64, 64, Rgb([1, 2, 3])).save(&path).unwrap();

    let settings = Settings::default();
    let backends = Backends {
        classifier: Arc::new(DeniedClassifier),
        ..backends()
    };
    let report = ThumbnailService::with_backends(settings.clone(), backends)
        .process_path(&path)
        .await
        .unwrap();

    let result = &report.results[0];
    assert_eq!(result.status, ThumbnailStatus::Degraded);
    assert_eq!(result.strategy, Some(Strategy::Default));
    let failure = result.failure.as_ref().unwrap();
    assert_eq!(failure.kind, FailureKind::UnreadableContent);
    assert!(failure.message.contains("permission denied"));

    let written = fs::read(dir.path().join("thumb_photo.jpg")).unwrap();
    let expected = persisted_bytes(
        &settings,
        &render_placeholder("photo.png", settings.dimensions()),
        "photo.png",
        OutputFormat::Jpeg,
    );
    assert_eq!(written, expected);
}

#[tokio::test]
async fn png_is_fitted_and_kept_lossless() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("banner.png");
    RgbImage::from_pixel(1600, 400, Rgb([30, 60, 90])).save(&path).unwrap();

    let report = service(Settings::default()).process_path(&path).await.unwrap();
    let result = &report.results[0];
    assert_eq!(result.status, ThumbnailStatus::Success);

    let output = result.output_path.as_ref().unwrap();
    assert_eq!(output, &dir.path().join("thumb_banner.png"));
    let thumb = image::open(output).unwrap();
    assert_eq!((thumb.width(), thumb.height()), (400, 100));
}

#[tokio::test]
async fn locked_pdf_renders_password_notice() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("secret.pdf");
    fs::write(&path, b"%PDF-1.7\n%\xe2\xe3\xcf\xd3\n1 0 obj\n").unwrap();

    let settings = Settings::default();
    let mut backends = backends();
    backends.pdf = Arc::new(LockedPdf);
    let service = ThumbnailService::with_backends(settings.clone(), backends);

    let report = service.process_path(&path).await.unwrap();
    let result = &report.results[0];
    assert_eq!(result.strategy, Some(Strategy::Pdf));
    assert_eq!(result.status, ThumbnailStatus::Degraded);

    let written = fs::read(result.output_path.as_ref().unwrap()).unwrap();
    let expected = persisted_bytes(
        &settings,
        &render_text_preview(PASSWORD_PROTECTED_TEXT, settings.dimensions()),
        "secret.pdf",
        OutputFormat::Jpeg,
    );
    assert_eq!(written, expected);
}

#[tokio::test]
async fn video_failure_uses_full_retry_budget() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("clip.mp4");
    fs::write(&path, b"\x00\x00\x00\x18ftypmp42\x00\x00\x00\x00mp42isom\x00\x00\x00\x08free").unwrap();

    let settings = Settings::default();
    let frames = Arc::new(FailingFrames::default());
    let mut backends = backends();
    backends.frames = frames.clone();
    let service = ThumbnailService::with_backends(settings.clone(), backends);

    let report = service.process_path(&path).await.unwrap();
    let result = &report.results[0];

    assert_eq!(frames.calls(), settings.max_attempts);
    assert_eq!(result.status, ThumbnailStatus::Degraded);
    assert_eq!(result.failure.as_ref().unwrap().kind, FailureKind::ProcessFailure);
    assert_eq!(thumbnails_in(dir.path()), vec!["thumb_clip.jpg"]);
}

#[tokio::test]
async fn office_document_is_converted_then_rendered() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("report.docx");
    fs::write(&path, b"PK\x03\x04").unwrap();

    let converter = Arc::new(StubConverter::default());
    let backends = Backends {
        classifier: Arc::new(FixedClassifier(MIME_DOCX)),
        converter: converter.clone(),
        ..backends()
    };
    let service = ThumbnailService::with_backends(Settings::default(), backends);

    let report = service.process_path(&path).await.unwrap();
    let result = &report.results[0];
    assert_eq!(result.strategy, Some(Strategy::OfficeDocument));
    assert_eq!(result.status, ThumbnailStatus::Success);
    assert_eq!(converter.calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    assert_eq!(thumbnails_in(dir.path()), vec!["thumb_report.jpg"]);
}

#[test]
fn csv_preview_lines_are_sanitised() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("wide.csv");
    let long_cell = "abcdefghij".repeat(6);
    fs::write(&path, format!("{}\nshort,\u{1}row\n", long_cell)).unwrap();

    let lines = read_preview_lines(&path, true).unwrap();
    assert_eq!(lines[0], format!("{}...", &long_cell[..47]));
    assert_eq!(lines[1], "short, row");
    assert!(lines
        .iter()
        .all(|line| line.chars().all(|c| (' '..='~').contains(&c))));
}
