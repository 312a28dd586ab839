mod helpers;

use helpers::fixtures::{pdf_payload, png_bytes, png_payload, text_payload};
use helpers::{setup_test_app, setup_test_app_with, setup_without_db};
use intake_core::config::OrganizeBy;
use intake_core::models::{UploadOptions, UploadOutcome};
use intake_core::{Config, ErrorMetadata, FileCategory, UploadError};
use intake_services::{FilePayload, IncomingRequest, RequestFile, UploadSource};
use std::collections::HashMap;

#[tokio::test]
async fn test_upload_image_writes_blob_thumbnails_and_record() {
    let app = setup_test_app().await;

    let outcome = app
        .service
        .upload(
            UploadSource::File(png_payload("photo.png", 400, 300)),
            UploadOptions {
                user_id: Some(7),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let result = outcome.into_single().expect("single result");

    assert_eq!(result.category, FileCategory::Image);
    assert_eq!(result.mime_type, "image/png");
    assert_eq!(result.original_name, "photo.png");
    assert_eq!(result.disk, "local");
    assert!(result.path.starts_with("uploads/"));
    assert!(result.path.ends_with(".png"));
    assert!(result.url.ends_with(&result.path));
    assert!(app.storage.exists(&result.path).await.unwrap());

    assert_eq!(result.thumbnails.len(), 2);
    for thumb in &result.thumbnails {
        assert!(thumb.path.contains(&format!("thumb_{}_", thumb.label)));
        assert!(app.storage.exists(&thumb.path).await.unwrap());
        assert!(!thumb.crop);
    }
    let medium = result
        .thumbnails
        .iter()
        .find(|t| t.label == "medium")
        .expect("medium thumbnail");
    assert_eq!((medium.width, medium.height), (300, 300));

    let records = app.repository.as_ref().unwrap().all().await;
    assert_eq!(records.len(), 1);
    assert_eq!(Some(records[0].id), result.id);
    assert_eq!(records[0].path, result.path);
    assert_eq!(records[0].size as u64, result.size);
    assert_eq!(records[0].user_id, Some(7));
}

#[tokio::test]
async fn test_oversize_file_rejected_before_any_write() {
    let app = setup_test_app().await;
    let mut rules = HashMap::new();
    rules.insert("file".to_string(), "required|max:1".to_string());

    let err = app
        .service
        .upload(
            UploadSource::File(pdf_payload("big.pdf", 4096)),
            UploadOptions {
                custom_rules: rules,
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, UploadError::Validation(_)));
    assert_eq!(
        err.to_string(),
        "The file field must not be greater than 1 kilobytes."
    );
    assert!(app.stored_files().is_empty());
    assert_eq!(app.record_count().await, 0);
}

#[tokio::test]
async fn test_mimes_rule_rejects_other_types() {
    let app = setup_test_app().await;

    // text/plain falls under the document rule, which only lists office formats and pdf
    let err = app
        .service
        .upload(
            UploadSource::File(text_payload("notes.txt", 64)),
            UploadOptions::default(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "VALIDATION_ERROR");
    assert!(err.to_string().contains("must be a file of type"));
}

#[tokio::test]
async fn test_batch_failure_does_not_abort_siblings() {
    let app = setup_test_app().await;

    let outcome = app
        .service
        .upload(
            UploadSource::Files(vec![
                pdf_payload("a.pdf", 128),
                FilePayload::from_bytes("empty.pdf", Some("application/pdf"), Vec::new()),
                png_payload("c.png", 20, 20),
            ]),
            UploadOptions::default(),
        )
        .await
        .unwrap();

    let items = outcome.into_batch().expect("batch result");
    assert_eq!(items.len(), 3);
    assert!(items[0].as_uploaded().is_some());
    let failed = items[1].as_failed().expect("second element fails");
    assert_eq!(failed.source, "empty.pdf");
    assert_eq!(failed.code, "VALIDATION_ERROR");
    assert!(items[2].as_uploaded().is_some());
    assert_eq!(app.record_count().await, 2);
}

#[tokio::test]
async fn test_convert_to_override_changes_format() {
    let app = setup_test_app().await;

    let result = app
        .service
        .upload(
            UploadSource::File(png_payload("photo.png", 64, 48)),
            UploadOptions {
                convert_to: Some("jpeg".to_string()),
                quality: Some(70),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .into_single()
        .unwrap();

    assert_eq!(result.mime_type, "image/jpeg");
    assert!(result.name.ends_with(".jpg"));
    let stored = app.storage.get(&result.path).await.unwrap();
    assert_eq!(&stored[..3], &[0xFF, 0xD8, 0xFF]);
}

#[tokio::test]
async fn test_resize_override_bounds_dimensions() {
    let app = setup_test_app().await;

    let result = app
        .service
        .upload(
            UploadSource::File(png_payload("wide.png", 400, 200)),
            UploadOptions {
                resize: Some(intake_core::models::ResizeOverride {
                    width: Some(100),
                    height: None,
                }),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .into_single()
        .unwrap();

    let stored = app.storage.get(&result.path).await.unwrap();
    let img = image::load_from_memory(&stored).unwrap();
    assert_eq!((img.width(), img.height()), (100, 50));
}

#[tokio::test]
async fn test_folder_and_user_organisation() {
    let mut config = Config::default();
    config.storage.organize_by = OrganizeBy::User;
    let app = setup_test_app_with(config).await;

    let result = app
        .service
        .upload(
            UploadSource::File(pdf_payload("report.pdf", 256)),
            UploadOptions {
                folder_name: Some("reports".to_string()),
                user_id: Some(42),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .into_single()
        .unwrap();

    assert!(result.path.starts_with("uploads/reports/user_42/"));
    assert!(result.path.ends_with(".pdf"));
    assert_eq!(result.category, FileCategory::Pdf);
}

#[tokio::test]
async fn test_folder_with_parent_segment_is_rejected() {
    let app = setup_test_app().await;

    let err = app
        .service
        .upload(
            UploadSource::File(pdf_payload("report.pdf", 256)),
            UploadOptions {
                folder_name: Some("../escape".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, UploadError::InvalidInput(_)));
}

#[tokio::test]
async fn test_cdn_url_used_when_enabled() {
    let mut config = Config::default();
    config.storage.cdn.enabled = true;
    config.storage.cdn.url = "https://cdn.example.com/".to_string();
    let app = setup_test_app_with(config).await;

    let result = app
        .service
        .upload(
            UploadSource::File(png_payload("photo.png", 120, 120)),
            UploadOptions::default(),
        )
        .await
        .unwrap()
        .into_single()
        .unwrap();

    assert_eq!(result.url, format!("https://cdn.example.com/{}", result.path));
    assert!(result
        .thumbnails
        .iter()
        .all(|t| t.url.starts_with("https://cdn.example.com/uploads/")));
}

#[tokio::test]
async fn test_unknown_disk_is_config_error() {
    let app = setup_test_app().await;

    let err = app
        .service
        .upload(
            UploadSource::File(pdf_payload("a.pdf", 32)),
            UploadOptions {
                disk: Some("archive".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, UploadError::Config(_)));
}

#[tokio::test]
async fn test_request_fields_use_their_own_rules() {
    let mut config = Config::default();
    config
        .validation
        .custom_fields
        .insert("avatar".to_string(), "required|image|max:1".parse().unwrap());
    let app = setup_test_app_with(config).await;

    let request = IncomingRequest::default()
        .with_file(RequestFile::new("avatar", png_payload("me.png", 300, 300)))
        .with_file(RequestFile::new("resume", pdf_payload("cv.pdf", 100)));

    let items = app
        .service
        .upload(UploadSource::Request(request), UploadOptions::default())
        .await
        .unwrap()
        .into_batch()
        .unwrap();

    assert_eq!(items.len(), 2);
    let avatar = items[0].as_failed().expect("avatar exceeds its 1 KB rule");
    assert!(avatar.error.contains("The avatar field"));
    assert!(items[1].as_uploaded().is_some());
}

#[tokio::test]
async fn test_empty_request_fails_required() {
    let app = setup_test_app().await;

    let err = app
        .service
        .upload(
            UploadSource::Request(IncomingRequest::default()),
            UploadOptions::default(),
        )
        .await
        .unwrap_err();
    assert!(err.to_string().contains("The file field is required."));
}

#[tokio::test]
async fn test_upload_without_metadata_store() {
    let app = setup_without_db(Config::default()).await;

    let result = app
        .service
        .upload(
            UploadSource::File(pdf_payload("a.pdf", 64)),
            UploadOptions::default(),
        )
        .await
        .unwrap();

    let UploadOutcome::Single(result) = result else {
        panic!("expected a single result");
    };
    assert_eq!(result.id, None);
    assert!(app.storage.exists(&result.path).await.unwrap());
}

#[tokio::test]
async fn test_undecodable_image_is_stored_as_received() {
    let app = setup_test_app().await;
    let mut original = png_bytes(64, 64);
    original.truncate(original.len() / 2);

    let result = app
        .service
        .upload(
            UploadSource::File(FilePayload::from_bytes(
                "broken.png",
                Some("image/png"),
                original.clone(),
            )),
            UploadOptions::default(),
        )
        .await
        .unwrap()
        .into_single()
        .unwrap();

    assert_eq!(result.mime_type, "image/png");
    assert_eq!(result.size, original.len() as u64);
    assert!(result.thumbnails.is_empty());
    let stored = app.storage.get(&result.path).await.unwrap();
    assert_eq!(&stored[..], &original[..]);
}

#[tokio::test]
async fn test_missing_watermark_file_does_not_fail_upload() {
    let mut config = Config::default();
    config.processing.image.watermark.path =
        Some(std::path::PathBuf::from("/nonexistent/watermark.png"));
    let app = setup_test_app_with(config).await;

    let result = app
        .service
        .upload(
            UploadSource::File(png_payload("photo.png", 200, 100)),
            UploadOptions::default(),
        )
        .await
        .unwrap()
        .into_single()
        .unwrap();

    assert_eq!(result.category, FileCategory::Image);
    assert!(app.storage.exists(&result.path).await.unwrap());
    assert_eq!(app.record_count().await, 1);
}
