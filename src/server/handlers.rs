//! HTTP request handlers for the photo gallery API.
//!
//! # Endpoints
//!
//! - `GET /api/list` - List stored photos
//! - `GET /api/{key}` - Serve a photo's bytes
//! - `POST /api/upload` - Upload a photo (admin only)
//! - `DELETE /api/delete/{key}` - Delete a photo (admin only)
//! - `GET /api/ip` - Report the caller's IP and admin status
//! - `GET /health` - Health check endpoint

use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartError, multipart::MultipartRejection, Multipart, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::error::StoreError;
use crate::photo::{
    generate_photo_key, is_allowed_content_type, is_within_size_limit, normalize_content_type,
    ALLOWED_CONTENT_TYPES, MAX_UPLOAD_SIZE,
};
use crate::store::{ObjectInfo, ObjectStore};

use super::admin::AdminGate;

/// Default Cache-Control max-age for photo bytes (one year; content is immutable).
pub const DEFAULT_CACHE_MAX_AGE: u32 = 31_536_000;

/// Multipart field carrying the uploaded file.
pub const UPLOAD_FIELD: &str = "file";

// =============================================================================
// Application State
// =============================================================================

/// Shared application state passed to all handlers.
///
/// Everything here is fixed at startup. The store is optional so a server
/// without a configured bucket still starts and reports a configuration
/// error on the routes that need storage.
pub struct AppState<S: ObjectStore> {
    /// Object store holding the photos (None = not configured)
    pub store: Option<Arc<S>>,

    /// Admin allowlist and trusted client IP header
    pub admin: AdminGate,

    /// Cache-Control max-age in seconds for photo responses
    pub cache_max_age: u32,
}

impl<S: ObjectStore> AppState<S> {
    /// Create application state with the default cache max-age.
    pub fn new(store: Option<S>, admin: AdminGate) -> Self {
        Self {
            store: store.map(Arc::new),
            admin,
            cache_max_age: DEFAULT_CACHE_MAX_AGE,
        }
    }

    /// Set the Cache-Control max-age for photo responses.
    pub fn with_cache_max_age(mut self, cache_max_age: u32) -> Self {
        self.cache_max_age = cache_max_age;
        self
    }

    /// Borrow the store, or fail with a configuration error.
    pub fn store(&self) -> Result<&Arc<S>, ApiError> {
        self.store.as_ref().ok_or(ApiError::StoreUnconfigured)
    }
}

impl<S: ObjectStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            admin: self.admin.clone(),
            cache_max_age: self.cache_max_age,
        }
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g., "not_found", "file_too_large")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code (included for convenience)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: None,
        }
    }

    /// Create a new error response with status code.
    pub fn with_status(
        error: impl Into<String>,
        message: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: Some(status.as_u16()),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

/// One entry of the photo list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoEntry {
    /// Photo key, usable as `/api/{key}`
    pub key: String,

    /// Size in bytes, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,

    /// Upload time in seconds since the Unix epoch, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded: Option<i64>,
}

impl From<ObjectInfo> for PhotoEntry {
    fn from(info: ObjectInfo) -> Self {
        Self {
            key: info.key,
            size: info.size,
            uploaded: info.last_modified,
        }
    }
}

/// Response from a successful upload.
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub message: String,

    /// Generated key of the new photo
    pub key: String,
}

/// Response from a successful delete.
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub message: String,
}

/// Response from the caller IP endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct CallerIpResponse {
    /// Caller IP from the trusted header, or "unknown"
    pub ip: String,

    #[serde(rename = "isAdmin")]
    pub is_admin: bool,
}

// =============================================================================
// Errors
// =============================================================================

/// Errors surfaced by the HTTP API.
///
/// Each variant maps to one status code and a stable `error` identifier in
/// the JSON body.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Caller is not on the admin allowlist
    #[error("Forbidden: admin access required")]
    Forbidden,

    /// Request body is not a readable multipart form
    #[error("Invalid multipart body: {0}")]
    InvalidMultipart(String),

    /// No file was provided in the `file` field
    #[error("No file provided")]
    MissingFile,

    /// File exceeds the upload size limit
    #[error("File too large: {} exceeds the {max} byte limit", describe_size(.size))]
    FileTooLarge { size: Option<usize>, max: usize },

    /// Declared content type is not an allowed image type
    #[error("Unsupported content type '{content_type}' (allowed: {})", ALLOWED_CONTENT_TYPES.join(", "))]
    UnsupportedType { content_type: String },

    /// Key is missing from the request path
    #[error("Missing photo key")]
    MissingKey,

    /// No photo stored under the key
    #[error("Photo not found: {key}")]
    NotFound { key: String },

    /// No object store is configured for this deployment
    #[error("Object store is not configured")]
    StoreUnconfigured,

    /// The object store failed
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

fn describe_size(size: &Option<usize>) -> String {
    match size {
        Some(size) => format!("{} bytes", size),
        None => "request body".to_string(),
    }
}

impl ApiError {
    /// HTTP status and error identifier for this error.
    pub fn status_and_type(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "forbidden"),
            ApiError::InvalidMultipart(_) => (StatusCode::BAD_REQUEST, "invalid_multipart"),
            ApiError::MissingFile => (StatusCode::BAD_REQUEST, "missing_file"),
            ApiError::FileTooLarge { .. } => (StatusCode::BAD_REQUEST, "file_too_large"),
            ApiError::UnsupportedType { .. } => (StatusCode::BAD_REQUEST, "unsupported_type"),
            ApiError::MissingKey => (StatusCode::BAD_REQUEST, "missing_key"),
            ApiError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::StoreUnconfigured => {
                (StatusCode::INTERNAL_SERVER_ERROR, "store_unconfigured")
            }
            ApiError::Store(StoreError::NotFound(_)) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "store_error"),
        }
    }
}

/// Convert ApiError to HTTP response.
///
/// - 4xx errors are logged at WARN level (client errors)
/// - 5xx errors are logged at ERROR level (server errors)
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = self.status_and_type();
        let message = self.to_string();

        match &self {
            ApiError::StoreUnconfigured => {
                error!(
                    error_type = error_type,
                    "Deployment defect: no object store configured (set GALLERY_S3_BUCKET)"
                );
            }
            _ if status.is_server_error() => {
                error!(
                    error_type = error_type,
                    status = status.as_u16(),
                    "Server error: {}",
                    message
                );
            }
            _ => {
                warn!(
                    error_type = error_type,
                    status = status.as_u16(),
                    "Client error: {}",
                    message
                );
            }
        }

        let error_response = ErrorResponse::with_status(error_type, message, status);
        (status, Json(error_response)).into_response()
    }
}

/// Map a store lookup failure for `key`, turning a missing object into 404.
fn lookup_error(key: &str, err: StoreError) -> ApiError {
    match err {
        StoreError::NotFound(_) => ApiError::NotFound {
            key: key.to_string(),
        },
        other => ApiError::Store(other),
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle health check requests.
///
/// `GET /health` → `{"status": "healthy", "version": "0.1.0"}`
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Handle photo list requests.
///
/// # Endpoint
///
/// `GET /api/list`
///
/// # Response
///
/// `200 OK` with a JSON array. An empty store yields `[]`.
/// ```json
/// [
///   { "key": "0b9c...e1.jpg", "size": 2048576, "uploaded": 1735689600 }
/// ]
/// ```
///
/// # Errors
///
/// - `500 Internal Server Error`: store not configured or unavailable
pub async fn list_handler<S: ObjectStore>(
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<PhotoEntry>>, ApiError> {
    let store = state.store()?;
    let objects = store.list().await?;

    Ok(Json(objects.into_iter().map(PhotoEntry::from).collect()))
}

/// Handle photo fetch requests.
///
/// # Endpoint
///
/// `GET /api/{key}`
///
/// # Response
///
/// `200 OK` with the stored bytes, the stored `Content-Type` (or
/// `application/octet-stream`) and `Cache-Control: public, max-age={cache_max_age}`.
///
/// # Errors
///
/// - `404 Not Found`: no photo under this key
/// - `500 Internal Server Error`: store not configured or failed
pub async fn photo_handler<S: ObjectStore>(
    State(state): State<AppState<S>>,
    Path(key): Path<String>,
) -> Result<Response, ApiError> {
    let store = state.store()?;
    let object = store.get(&key).await.map_err(|e| lookup_error(&key, e))?;

    let headers = [
        (header::CONTENT_TYPE, object.content_type_or_default().to_string()),
        (
            header::CACHE_CONTROL,
            format!("public, max-age={}", state.cache_max_age),
        ),
    ];

    Ok((StatusCode::OK, headers, object.data).into_response())
}

/// A file read out of the upload form.
#[derive(Debug)]
struct UploadedFile {
    filename: Option<String>,
    content_type: Option<String>,
    data: Bytes,
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::FileTooLarge {
            size: None,
            max: MAX_UPLOAD_SIZE,
        }
    } else {
        ApiError::InvalidMultipart(err.body_text())
    }
}

/// Read the first `file` field from the form, skipping any other fields.
///
/// A part with no filename and no bytes is what browsers send for an empty
/// file input, so it counts as no file.
async fn read_upload(mut multipart: Multipart) -> Result<UploadedFile, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let filename = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.map_err(multipart_error)?;

        if data.is_empty() && filename.as_deref().map_or(true, str::is_empty) {
            return Err(ApiError::MissingFile);
        }

        return Ok(UploadedFile {
            filename,
            content_type,
            data,
        });
    }

    Err(ApiError::MissingFile)
}

/// Handle photo upload requests.
///
/// # Endpoint
///
/// `POST /api/upload` (admin only), `multipart/form-data` with a `file` field.
///
/// Checks run in order: admin (middleware), file present, size, content type.
/// The key is a fresh UUID plus the original extension when it is purely
/// alphanumeric.
///
/// # Response
///
/// `200 OK` with `{"message": "...", "key": "<uuid>.png"}`
///
/// # Errors
///
/// - `403 Forbidden`: caller is not an admin
/// - `400 Bad Request`: missing file, too large, or unsupported type
/// - `500 Internal Server Error`: store not configured or write failed
pub async fn upload_handler<S: ObjectStore>(
    State(state): State<AppState<S>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let multipart = multipart.map_err(|e| ApiError::InvalidMultipart(e.body_text()))?;
    let upload = read_upload(multipart).await?;

    if !is_within_size_limit(upload.data.len()) {
        return Err(ApiError::FileTooLarge {
            size: Some(upload.data.len()),
            max: MAX_UPLOAD_SIZE,
        });
    }

    let content_type = match upload.content_type.as_deref() {
        Some(ct) if is_allowed_content_type(ct) => normalize_content_type(ct),
        other => {
            return Err(ApiError::UnsupportedType {
                content_type: other.unwrap_or("none").to_string(),
            })
        }
    };

    let store = state.store()?;
    let key = generate_photo_key(upload.filename.as_deref());
    let size = upload.data.len();

    store.put(&key, upload.data, &content_type).await?;

    info!(key = %key, size, content_type = %content_type, "Photo uploaded");

    Ok(Json(UploadResponse {
        message: "File uploaded successfully".to_string(),
        key,
    }))
}

/// Handle photo delete requests.
///
/// # Endpoint
///
/// `DELETE /api/delete/{key}` (admin only)
///
/// The key is probed with `HEAD` first: the store's delete succeeds on
/// missing keys, and a delete of nothing must be reported as 404.
///
/// # Errors
///
/// - `403 Forbidden`: caller is not an admin
/// - `400 Bad Request`: empty key
/// - `404 Not Found`: no photo under this key
/// - `500 Internal Server Error`: store not configured or failed
pub async fn delete_handler<S: ObjectStore>(
    State(state): State<AppState<S>>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    if key.is_empty() {
        return Err(ApiError::MissingKey);
    }

    let store = state.store()?;
    store.head(&key).await.map_err(|e| lookup_error(&key, e))?;
    store.delete(&key).await?;

    info!(key = %key, "Photo deleted");

    Ok(Json(DeleteResponse {
        message: format!("Deleted {}", key),
    }))
}

/// Handle `DELETE /api/delete` with no key in the path.
pub async fn delete_missing_key_handler() -> ApiError {
    ApiError::MissingKey
}

/// Handle caller IP requests.
///
/// `GET /api/ip` → `{"ip": "1.2.3.4", "isAdmin": true}`, or
/// `{"ip": "unknown", "isAdmin": false}` without the trusted header.
pub async fn caller_ip_handler<S: ObjectStore>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
) -> Json<CallerIpResponse> {
    let (ip, is_admin) = state.admin.identify(&headers);

    Json(CallerIpResponse {
        ip: ip.unwrap_or_else(|| "unknown".to_string()),
        is_admin,
    })
}

// =============================================================================
// Tests
// =============================================================================
