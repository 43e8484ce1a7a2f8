//! Test utilities for integration tests.
//!
//! Provides an in-memory object store with operation tracking and failure
//! injection, plus helpers for building multipart upload requests.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use bytes::Bytes;
use http_body_util::BodyExt;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use photo_gallery::error::StoreError;
use photo_gallery::store::{ObjectInfo, ObjectStore, StoredObject};
use photo_gallery::{create_router, RouterConfig};

/// Admin IP used across tests.
pub const ADMIN_IP: &str = "1.2.3.4";

/// A non-admin IP used across tests.
pub const VISITOR_IP: &str = "9.9.9.9";

/// Header the router reads the client IP from by default.
pub const IP_HEADER: &str = "cf-connecting-ip";

// =============================================================================
// Mock Object Store
// =============================================================================

#[derive(Default)]
struct OpCounts {
    list: AtomicUsize,
    get: AtomicUsize,
    put: AtomicUsize,
    delete: AtomicUsize,
    head: AtomicUsize,
}

/// In-memory object store that records operations.
///
/// Clones share state, so a test can hand one clone to the router and keep
/// another to inspect what happened.
#[derive(Clone, Default)]
pub struct MockStore {
    objects: Arc<RwLock<BTreeMap<String, (Bytes, Option<String>)>>>,
    counts: Arc<OpCounts>,
    failure: Arc<RwLock<Option<StoreError>>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object.
    pub async fn insert(&self, key: &str, data: impl Into<Bytes>, content_type: Option<&str>) {
        self.objects.write().await.insert(
            key.to_string(),
            (data.into(), content_type.map(str::to_string)),
        );
    }

    /// Make every subsequent operation fail with `err`.
    pub async fn fail_with(&self, err: StoreError) {
        *self.failure.write().await = Some(err);
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.objects.read().await.contains_key(key)
    }

    pub async fn object_count(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn stored(&self, key: &str) -> Option<(Bytes, Option<String>)> {
        self.objects.read().await.get(key).cloned()
    }

    pub fn put_count(&self) -> usize {
        self.counts.put.load(Ordering::SeqCst)
    }

    pub fn delete_count(&self) -> usize {
        self.counts.delete.load(Ordering::SeqCst)
    }

    pub fn head_count(&self) -> usize {
        self.counts.head.load(Ordering::SeqCst)
    }

    pub fn get_count(&self) -> usize {
        self.counts.get.load(Ordering::SeqCst)
    }

    /// Total number of store operations of any kind.
    pub fn total_ops(&self) -> usize {
        self.counts.list.load(Ordering::SeqCst)
            + self.get_count()
            + self.put_count()
            + self.delete_count()
            + self.head_count()
    }

    async fn check_failure(&self) -> Result<(), StoreError> {
        match self.failure.read().await.as_ref() {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ObjectStore for MockStore {
    async fn list(&self) -> Result<Vec<ObjectInfo>, StoreError> {
        self.counts.list.fetch_add(1, Ordering::SeqCst);
        self.check_failure().await?;

        Ok(self
            .objects
            .read()
            .await
            .iter()
            .map(|(key, (data, _))| ObjectInfo {
                key: key.clone(),
                size: Some(data.len() as u64),
                last_modified: Some(1_735_689_600),
            })
            .collect())
    }

    async fn get(&self, key: &str) -> Result<StoredObject, StoreError> {
        self.counts.get.fetch_add(1, Ordering::SeqCst);
        self.check_failure().await?;

        match self.objects.read().await.get(key) {
            Some((data, content_type)) => Ok(StoredObject {
                data: data.clone(),
                content_type: content_type.clone(),
            }),
            None => Err(StoreError::NotFound(format!("mock://{}", key))),
        }
    }

    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> Result<(), StoreError> {
        self.counts.put.fetch_add(1, Ordering::SeqCst);
        self.check_failure().await?;

        self.objects
            .write()
            .await
            .insert(key.to_string(), (data, Some(content_type.to_string())));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.counts.delete.fetch_add(1, Ordering::SeqCst);
        self.check_failure().await?;

        // Like S3: deleting a missing key succeeds
        self.objects.write().await.remove(key);
        Ok(())
    }

    async fn head(&self, key: &str) -> Result<ObjectInfo, StoreError> {
        self.counts.head.fetch_add(1, Ordering::SeqCst);
        self.check_failure().await?;

        match self.objects.read().await.get(key) {
            Some((data, _)) => Ok(ObjectInfo {
                key: key.to_string(),
                size: Some(data.len() as u64),
                last_modified: Some(1_735_689_600),
            }),
            None => Err(StoreError::NotFound(format!("mock://{}", key))),
        }
    }
}

// =============================================================================
// Router Helpers
// =============================================================================

/// Router over `store` with [`ADMIN_IP`] as the only admin.
pub fn admin_router(store: MockStore) -> axum::Router {
    create_router(
        Some(store),
        RouterConfig::new()
            .with_admin_ips(ADMIN_IP)
            .with_tracing(false),
    )
}

/// Router with no object store configured.
pub fn unconfigured_router() -> axum::Router {
    create_router::<MockStore>(
        None,
        RouterConfig::new()
            .with_admin_ips(ADMIN_IP)
            .with_tracing(false),
    )
}

// =============================================================================
// Request Helpers
// =============================================================================

const BOUNDARY: &str = "----gallery-test-boundary-7MA4YWxkTrZu0gW";

/// One part of a multipart form.
pub struct Part<'a> {
    pub name: &'a str,
    pub filename: Option<&'a str>,
    pub content_type: Option<&'a str>,
    pub data: &'a [u8],
}

impl<'a> Part<'a> {
    /// A `file` part with the given filename, type and bytes.
    pub fn file(filename: &'a str, content_type: &'a str, data: &'a [u8]) -> Self {
        Self {
            name: "file",
            filename: Some(filename),
            content_type: Some(content_type),
            data,
        }
    }
}

/// Encode parts as a `multipart/form-data` body.
pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part.filename {
            Some(filename) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                    part.name, filename
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n", part.name).as_bytes(),
            ),
        }
        if let Some(content_type) = part.content_type {
            body.extend_from_slice(format!("Content-Type: {}\r\n", content_type).as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

/// Build a `POST /api/upload` request from the given IP.
pub fn upload_request(ip: Option<&str>, parts: &[Part<'_>]) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        );
    if let Some(ip) = ip {
        builder = builder.header(IP_HEADER, ip);
    }
    builder.body(Body::from(multipart_body(parts))).unwrap()
}

/// Build a request with no body from the given IP.
pub fn request(method: &str, uri: &str, ip: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(ip) = ip {
        builder = builder.header(IP_HEADER, ip);
    }
    builder.body(Body::empty()).unwrap()
}

/// Collect a response body into bytes.
pub async fn body_bytes(response: Response<Body>) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let body = body_bytes(response).await;
    serde_json::from_slice(&body).unwrap()
}

/// Deterministic pseudo-image bytes of the given length.
pub fn image_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}
