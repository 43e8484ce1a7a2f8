//! HTTP server layer for the photo gallery.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │     /api/list   /api/{key}   /api/upload   /api/delete/{key}    │
//! │                                                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────────┐  │
//! │  │  handlers   │  │    admin    │  │        routes           │  │
//! │  │ (requests)  │  │(IP allowlist│  │  (router config)        │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod admin;
pub mod handlers;
pub mod routes;

pub use admin::{admin_middleware, caller_ip, AdminAllowlist, AdminGate, DEFAULT_CLIENT_IP_HEADER};
pub use handlers::{
    caller_ip_handler, delete_handler, health_handler, list_handler, photo_handler,
    upload_handler, ApiError, AppState, CallerIpResponse, DeleteResponse, ErrorResponse,
    HealthResponse, PhotoEntry, UploadResponse, DEFAULT_CACHE_MAX_AGE,
};
pub use routes::{create_router, RouterConfig, UPLOAD_BODY_LIMIT};
