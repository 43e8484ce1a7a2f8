//! Router configuration for the photo gallery.
//!
//! This module defines the HTTP routes and applies middleware for admin
//! authorization, CORS, body limits and request tracing.
//!
//! # Route Structure
//!
//! ```text
//! /health                    GET     - Health check (public)
//! /api/list                  GET     - List photos (public)
//! /api/ip                    GET     - Caller IP + admin status (public)
//! /api/{key}                 GET     - Photo bytes (public)
//! /api/upload                POST    - Upload a photo (admin)
//! /api/delete/{key}          DELETE  - Delete a photo (admin)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use photo_gallery::server::routes::{create_router, RouterConfig};
//! use photo_gallery::store::{create_s3_client, S3ObjectStore};
//!
//! let client = create_s3_client(None, "us-east-1").await;
//! let store = S3ObjectStore::new(client, "my-photos");
//!
//! let config = RouterConfig::new()
//!     .with_admin_ips("203.0.113.7")
//!     .with_cors_origins(vec!["https://photos.example.com".to_string()]);
//!
//! let router = create_router(Some(store), config);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post},
    Router,
};
use http::header::CONTENT_TYPE;
use http::{HeaderName, Method};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::admin::{admin_middleware, AdminAllowlist, AdminGate, DEFAULT_CLIENT_IP_HEADER};
use super::handlers::{
    caller_ip_handler, delete_handler, delete_missing_key_handler, health_handler, list_handler,
    photo_handler, upload_handler, AppState, DEFAULT_CACHE_MAX_AGE,
};
use crate::photo::MAX_UPLOAD_SIZE;
use crate::store::ObjectStore;

/// Request body limit for uploads: the file limit plus room for multipart
/// framing, so an oversized file is rejected by the size check rather than
/// by the transport.
pub const UPLOAD_BODY_LIMIT: usize = MAX_UPLOAD_SIZE + 1024 * 1024;

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Clone)]
pub struct RouterConfig {
    /// Comma-separated admin IP allowlist (None = nobody is admin)
    pub admin_ips: Option<String>,

    /// Header carrying the real client IP, set by the trusted proxy
    pub client_ip_header: HeaderName,

    /// Allowed CORS origins (None = allow any origin)
    pub cors_origins: Option<Vec<String>>,

    /// Cache-Control max-age in seconds for photo responses
    pub cache_max_age: u32,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl RouterConfig {
    /// Create a router configuration with defaults.
    ///
    /// By default:
    /// - No admin IPs (uploads and deletes are refused)
    /// - Client IP read from `cf-connecting-ip`
    /// - CORS allows any origin
    /// - Cache max-age is one year
    /// - Tracing is enabled
    pub fn new() -> Self {
        Self {
            admin_ips: None,
            client_ip_header: HeaderName::from_static(DEFAULT_CLIENT_IP_HEADER),
            cors_origins: None,
            cache_max_age: DEFAULT_CACHE_MAX_AGE,
            enable_tracing: true,
        }
    }

    /// Set the comma-separated admin IP allowlist.
    pub fn with_admin_ips(mut self, admin_ips: impl Into<String>) -> Self {
        self.admin_ips = Some(admin_ips.into());
        self
    }

    /// Set the header the trusted proxy uses for the client IP.
    pub fn with_client_ip_header(mut self, header: HeaderName) -> Self {
        self.client_ip_header = header;
        self
    }

    /// Set specific allowed CORS origins.
    ///
    /// Pass an empty vec to disallow all cross-origin requests.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Set the Cache-Control max-age in seconds.
    pub fn with_cache_max_age(mut self, seconds: u32) -> Self {
        self.cache_max_age = seconds;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }

    /// Build the admin gate from the allowlist and header settings.
    pub fn admin_gate(&self) -> AdminGate {
        let allowlist = AdminAllowlist::parse(self.admin_ips.as_deref());
        AdminGate::new(Arc::new(allowlist), self.client_ip_header.clone())
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// `store` is `None` when no bucket is configured; the server still runs and
/// storage routes answer with a configuration error.
pub fn create_router<S>(store: Option<S>, config: RouterConfig) -> Router
where
    S: ObjectStore + 'static,
{
    let app_state =
        AppState::new(store, config.admin_gate()).with_cache_max_age(config.cache_max_age);

    let cors = build_cors_layer(&config);

    // Admin check runs as a route layer so unknown paths still 404
    let admin_routes = Router::new()
        .route(
            "/api/upload",
            post(upload_handler::<S>).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/api/delete", delete(delete_missing_key_handler))
        .route("/api/delete/", delete(delete_missing_key_handler))
        .route("/api/delete/{key}", delete(delete_handler::<S>))
        .route_layer(middleware::from_fn_with_state(
            app_state.admin.clone(),
            admin_middleware,
        ))
        .with_state(app_state.clone());

    let public_routes = Router::new()
        .route("/health", get(health_handler))
        .route("/api/list", get(list_handler::<S>))
        .route("/api/ip", get(caller_ip_handler::<S>))
        .route("/api/{key}", get(photo_handler::<S>))
        .with_state(app_state);

    let router = Router::new()
        .merge(admin_routes)
        .merge(public_routes)
        .layer(cors);

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(86400));

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        Some(origins) if origins.is_empty() => cors,
        Some(origins) => {
            let parsed_origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed_origins)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
