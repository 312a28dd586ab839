mod helpers;

use helpers::fixtures::pdf_bytes;
use helpers::setup_test_app;
use intake_core::models::{UploadOptions, UploadOutcome};
use intake_core::UploadError;
use intake_services::{ChunkInfo, FilePayload, IncomingRequest, RequestFile, UploadSource};

fn fragment(upload_id: &str, data: &[u8], index: u32, total: u32) -> UploadSource {
    let payload = FilePayload::from_bytes("scan.pdf", Some("application/pdf"), data.to_vec());
    let chunk = ChunkInfo {
        upload_id: upload_id.to_string(),
        index,
        total,
    };
    UploadSource::Request(
        IncomingRequest::default().with_file(RequestFile::chunked("file", payload, chunk)),
    )
}

#[tokio::test]
async fn test_chunked_upload_matches_direct_upload() {
    let app = setup_test_app().await;
    let content = pdf_bytes(3000);
    let parts: Vec<&[u8]> = content.chunks(1000).collect();
    assert_eq!(parts.len(), 3);

    // Out of order arrival
    let first = app
        .service
        .upload(fragment("abc", parts[2], 2, 3), UploadOptions::default())
        .await
        .unwrap();
    let progress = first.progress().expect("still receiving");
    assert!(progress.status);
    assert!((progress.done - 100.0 / 3.0).abs() < 0.01);

    let second = app
        .service
        .upload(fragment("abc", parts[0], 0, 3), UploadOptions::default())
        .await
        .unwrap();
    assert!((second.progress().unwrap().done - 200.0 / 3.0).abs() < 0.01);
    assert_eq!(app.record_count().await, 0);

    let done = app
        .service
        .upload(fragment("abc", parts[1], 1, 3), UploadOptions::default())
        .await
        .unwrap();
    let chunked = done.into_single().expect("assembled file is stored");
    assert_eq!(chunked.original_name, "scan.pdf");
    assert_eq!(chunked.mime_type, "application/pdf");
    assert_eq!(chunked.size, content.len() as u64);

    let direct = app
        .service
        .upload(
            UploadSource::File(FilePayload::from_bytes(
                "scan.pdf",
                Some("application/pdf"),
                content.clone(),
            )),
            UploadOptions::default(),
        )
        .await
        .unwrap()
        .into_single()
        .unwrap();

    let chunked_bytes = app.storage.get(&chunked.path).await.unwrap();
    let direct_bytes = app.storage.get(&direct.path).await.unwrap();
    assert_eq!(chunked_bytes, direct_bytes);
    assert_eq!(&chunked_bytes[..], &content[..]);
    assert_eq!(app.service.chunk_assembler().active_sessions().await, 0);
}

#[tokio::test]
async fn test_changed_total_aborts_session() {
    let app = setup_test_app().await;
    let content = pdf_bytes(200);

    let first = app
        .service
        .upload(fragment("xyz", &content[..100], 0, 2), UploadOptions::default())
        .await
        .unwrap();
    assert!(matches!(first, UploadOutcome::Progress(_)));

    let err = app
        .service
        .upload(fragment("xyz", &content[100..], 1, 3), UploadOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, UploadError::ChunkSession(_)));
    assert_eq!(app.service.chunk_assembler().active_sessions().await, 0);
    assert!(app.stored_files().is_empty());
}

#[tokio::test]
async fn test_assembled_file_is_still_validated() {
    let app = setup_test_app().await;
    let mut options = UploadOptions::default();
    options
        .custom_rules
        .insert("file".to_string(), "required|max:1".to_string());
    let content = pdf_bytes(2048);

    app.service
        .upload(fragment("big", &content[..1024], 0, 2), options.clone())
        .await
        .unwrap();
    let err = app
        .service
        .upload(fragment("big", &content[1024..], 1, 2), options)
        .await
        .unwrap_err();

    assert!(matches!(err, UploadError::Validation(_)));
    assert!(app.stored_files().is_empty());
}
