//! # Photo Gallery
//!
//! A small personal photo gallery server backed by S3-compatible object
//! storage.
//!
//! Anyone can list photos and fetch their bytes. Uploading and deleting are
//! reserved for admins, identified by the client IP that a trusted reverse
//! proxy (Cloudflare by default) puts in a request header.
//!
//! ## Features
//!
//! - **Thin storage layer**: photos are plain objects in one bucket, keyed by
//!   random UUIDs
//! - **Immutable content**: photos are served with a one-year cache lifetime
//! - **Upload validation**: 10 MiB limit, JPEG/PNG/WebP only
//! - **Fail-closed admin gate**: no allowlist or no client IP means no admin
//!
//! ## Architecture
//!
//! - [`store`] - Object store trait and S3 implementation
//! - [`photo`] - Upload rules and key generation
//! - [`server`] - Axum handlers, admin middleware and router
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use photo_gallery::{create_router, create_s3_client, RouterConfig, S3ObjectStore};
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = create_s3_client(None, "us-east-1").await;
//!     let store = S3ObjectStore::new(client, "my-photos");
//!
//!     let router = create_router(Some(store), RouterConfig::new().with_admin_ips("203.0.113.7"));
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
//!     axum::serve(listener, router).await.unwrap();
//! }
//! ```

pub mod config;
pub mod error;
pub mod photo;
pub mod server;
pub mod store;

// Re-export commonly used types
pub use config::{CheckConfig, Cli, Command, ServeConfig};
pub use error::StoreError;
pub use photo::{
    generate_photo_key, is_allowed_content_type, sanitized_extension, ALLOWED_CONTENT_TYPES,
    MAX_UPLOAD_SIZE,
};
pub use server::{
    create_router, AdminAllowlist, ApiError, AppState, ErrorResponse, PhotoEntry, RouterConfig,
};
pub use store::{create_s3_client, ObjectInfo, ObjectStore, S3ObjectStore, StoredObject};
