//! Upload integration tests.
//!
//! Tests verify:
//! - Size limit boundary (exactly 10 MiB accepted, one byte more rejected)
//! - Content type allowlist
//! - Missing or empty file fields
//! - Key generation and stored content type
//! - Store failures during the write

use axum::body::Body;
use axum::http::{Request, StatusCode};
use photo_gallery::{StoreError, MAX_UPLOAD_SIZE};
use tower::ServiceExt;

use super::test_utils::{
    admin_router, body_json, image_bytes, unconfigured_router, upload_request, MockStore, Part,
    ADMIN_IP, IP_HEADER,
};

/// Split a generated key into (uuid, extension).
fn split_key(key: &str) -> (&str, Option<&str>) {
    match key.split_once('.') {
        Some((stem, ext)) => (stem, Some(ext)),
        None => (key, None),
    }
}

// =============================================================================
// Successful Uploads
// =============================================================================

#[tokio::test]
async fn test_upload_png() {
    let store = MockStore::new();
    let data = image_bytes(2048);

    let response = admin_router(store.clone())
        .oneshot(upload_request(
            Some(ADMIN_IP),
            &[Part::file("cat.png", "image/png", &data)],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["message"], "File uploaded successfully");

    let key = json["key"].as_str().unwrap().to_string();
    let (stem, ext) = split_key(&key);
    assert_eq!(ext, Some("png"));
    assert_eq!(stem.len(), 36);
    assert_eq!(stem.matches('-').count(), 4);

    let (stored, content_type) = store.stored(&key).await.unwrap();
    assert_eq!(stored.as_ref(), data.as_slice());
    assert_eq!(content_type.as_deref(), Some("image/png"));
    assert_eq!(store.put_count(), 1);
}

#[tokio::test]
async fn test_upload_exactly_max_size() {
    let store = MockStore::new();
    let data = image_bytes(MAX_UPLOAD_SIZE);

    let response = admin_router(store.clone())
        .oneshot(upload_request(
            Some(ADMIN_IP),
            &[Part::file("big.jpg", "image/jpeg", &data)],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(store.put_count(), 1);
    assert_eq!(store.object_count().await, 1);
}

#[tokio::test]
async fn test_upload_keys_are_unique() {
    let store = MockStore::new();
    let data = image_bytes(64);
    let mut keys = Vec::new();

    for _ in 0..3 {
        let response = admin_router(store.clone())
            .oneshot(upload_request(
                Some(ADMIN_IP),
                &[Part::file("same.webp", "image/webp", &data)],
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        keys.push(json["key"].as_str().unwrap().to_string());
    }

    keys.sort();
    keys.dedup();
    assert_eq!(keys.len(), 3);
    assert_eq!(store.object_count().await, 3);
}

#[tokio::test]
async fn test_upload_extension_handling() {
    let cases: [(&str, Option<&str>); 4] = [
        ("Holiday.JPG", Some("jpg")),
        ("noextension", None),
        ("weird.jp-g", None),
        ("archive.tar.webp", Some("webp")),
    ];

    for (filename, expected_ext) in cases {
        let store = MockStore::new();
        let data = image_bytes(32);
        let response = admin_router(store)
            .oneshot(upload_request(
                Some(ADMIN_IP),
                &[Part::file(filename, "image/jpeg", &data)],
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK, "filename {}", filename);
        let json = body_json(response).await;
        let key = json["key"].as_str().unwrap();
        assert_eq!(split_key(key).1, expected_ext, "filename {}", filename);
    }
}

#[tokio::test]
async fn test_upload_content_type_normalized() {
    let store = MockStore::new();
    let data = image_bytes(32);

    let response = admin_router(store.clone())
        .oneshot(upload_request(
            Some(ADMIN_IP),
            &[Part::file("a.jpg", "Image/JPEG; charset=binary", &data)],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let key = json["key"].as_str().unwrap();

    let (_, content_type) = store.stored(key).await.unwrap();
    assert_eq!(content_type.as_deref(), Some("image/jpeg"));
}

#[tokio::test]
async fn test_upload_ignores_other_fields() {
    let store = MockStore::new();
    let data = image_bytes(32);

    let parts = [
        Part {
            name: "caption",
            filename: None,
            content_type: None,
            data: b"my cat",
        },
        Part::file("cat.png", "image/png", &data),
    ];

    let response = admin_router(store.clone())
        .oneshot(upload_request(Some(ADMIN_IP), &parts))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(store.object_count().await, 1);
}

// =============================================================================
// Rejected Uploads
// =============================================================================

#[tokio::test]
async fn test_upload_one_byte_over_limit() {
    let store = MockStore::new();
    let data = image_bytes(MAX_UPLOAD_SIZE + 1);

    let response = admin_router(store.clone())
        .oneshot(upload_request(
            Some(ADMIN_IP),
            &[Part::file("big.jpg", "image/jpeg", &data)],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "file_too_large");
    assert_eq!(store.put_count(), 0);
}

#[tokio::test]
async fn test_upload_far_over_limit() {
    let store = MockStore::new();
    let data = image_bytes(MAX_UPLOAD_SIZE * 2);

    let response = admin_router(store.clone())
        .oneshot(upload_request(
            Some(ADMIN_IP),
            &[Part::file("huge.jpg", "image/jpeg", &data)],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "file_too_large");
    assert_eq!(store.put_count(), 0);
}

#[tokio::test]
async fn test_upload_unsupported_types() {
    for content_type in ["image/gif", "text/plain", "application/pdf", "image/svg+xml"] {
        let store = MockStore::new();
        let data = image_bytes(32);

        let response = admin_router(store.clone())
            .oneshot(upload_request(
                Some(ADMIN_IP),
                &[Part::file("file.bin", content_type, &data)],
            ))
            .await
            .unwrap();

        assert_eq!(
            response.status(),
            StatusCode::BAD_REQUEST,
            "content type {}",
            content_type
        );
        let json = body_json(response).await;
        assert_eq!(json["error"], "unsupported_type");
        assert_eq!(store.put_count(), 0);
    }
}

#[tokio::test]
async fn test_upload_without_part_content_type() {
    let store = MockStore::new();
    let data = image_bytes(32);

    let parts = [Part {
        name: "file",
        filename: Some("a.jpg"),
        content_type: None,
        data: &data,
    }];

    let response = admin_router(store.clone())
        .oneshot(upload_request(Some(ADMIN_IP), &parts))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "unsupported_type");
    assert_eq!(store.put_count(), 0);
}

#[tokio::test]
async fn test_upload_size_checked_before_type() {
    let data = image_bytes(MAX_UPLOAD_SIZE + 1);

    let response = admin_router(MockStore::new())
        .oneshot(upload_request(
            Some(ADMIN_IP),
            &[Part::file("big.gif", "image/gif", &data)],
        ))
        .await
        .unwrap();

    let json = body_json(response).await;
    assert_eq!(json["error"], "file_too_large");
}

#[tokio::test]
async fn test_upload_missing_file_field() {
    let store = MockStore::new();
    let parts = [Part {
        name: "caption",
        filename: None,
        content_type: None,
        data: b"no file here",
    }];

    let response = admin_router(store.clone())
        .oneshot(upload_request(Some(ADMIN_IP), &parts))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "missing_file");
    assert_eq!(store.put_count(), 0);
}

#[tokio::test]
async fn test_upload_empty_form() {
    let response = admin_router(MockStore::new())
        .oneshot(upload_request(Some(ADMIN_IP), &[]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "missing_file");
}

#[tokio::test]
async fn test_upload_empty_file_input() {
    // What a browser sends for a file input left empty
    let parts = [Part {
        name: "file",
        filename: Some(""),
        content_type: Some("application/octet-stream"),
        data: b"",
    }];

    let response = admin_router(MockStore::new())
        .oneshot(upload_request(Some(ADMIN_IP), &parts))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "missing_file");
}

#[tokio::test]
async fn test_upload_not_multipart() {
    let store = MockStore::new();
    let request = Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header(IP_HEADER, ADMIN_IP)
        .header("content-type", "application/json")
        .body(Body::from(r#"{"file":"nope"}"#))
        .unwrap();

    let response = admin_router(store.clone()).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "invalid_multipart");
    assert_eq!(store.put_count(), 0);
}

// =============================================================================
// Store Interaction
// =============================================================================

#[tokio::test]
async fn test_upload_store_failure() {
    let store = MockStore::new();
    store
        .fail_with(StoreError::S3("SlowDown: reduce your request rate".to_string()))
        .await;
    let data = image_bytes(32);

    let response = admin_router(store.clone())
        .oneshot(upload_request(
            Some(ADMIN_IP),
            &[Part::file("a.png", "image/png", &data)],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["error"], "store_error");
    assert!(json["message"]
        .as_str()
        .unwrap()
        .contains("SlowDown: reduce your request rate"));
    assert_eq!(store.put_count(), 1);
}

#[tokio::test]
async fn test_upload_validation_before_unconfigured_store() {
    let data = image_bytes(32);

    let response = unconfigured_router()
        .oneshot(upload_request(
            Some(ADMIN_IP),
            &[Part::file("a.gif", "image/gif", &data)],
        ))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["error"], "unsupported_type");

    let response = unconfigured_router()
        .oneshot(upload_request(
            Some(ADMIN_IP),
            &[Part::file("a.png", "image/png", &data)],
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["error"], "store_unconfigured");
}
