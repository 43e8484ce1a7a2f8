//! IP allowlist authorization for mutating routes.
//!
//! The gallery has a single privileged role: the admin, recognised by the
//! client IP reported by a trusted reverse proxy (Cloudflare's
//! `cf-connecting-ip` by default). Uploads and deletes are only accepted from
//! IPs on the configured allowlist.
//!
//! # Fail-closed behaviour
//!
//! ```text
//! allowlist unset or empty   → nobody is admin
//! trusted header missing     → not admin
//! header sent more than once → not admin
//! IP not in allowlist        → not admin
//! ```
//!
//! # Example
//!
//! ```rust
//! use photo_gallery::server::admin::AdminAllowlist;
//!
//! let allowlist = AdminAllowlist::parse(Some("1.2.3.4, 10.0.0.1"));
//! assert!(allowlist.is_admin(Some("10.0.0.1")));
//! assert!(!allowlist.is_admin(Some("9.9.9.9")));
//! assert!(!allowlist.is_admin(None));
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderName},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use super::handlers::ApiError;

/// Default header carrying the real client IP.
pub const DEFAULT_CLIENT_IP_HEADER: &str = "cf-connecting-ip";

// =============================================================================
// Allowlist
// =============================================================================

/// Set of IP strings granted write and delete privileges.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminAllowlist {
    ips: HashSet<String>,
}

impl AdminAllowlist {
    /// Build an allowlist from a comma-separated configuration value.
    ///
    /// Tokens are trimmed and empty tokens dropped. `None` yields an empty
    /// allowlist, which admits nobody.
    pub fn parse(value: Option<&str>) -> Self {
        let ips = value
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|ip| !ip.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Self { ips }
    }

    /// Whether `ip` belongs to the allowlist.
    ///
    /// Returns `false` when the IP is absent or blank, or when the allowlist
    /// is empty.
    pub fn is_admin(&self, ip: Option<&str>) -> bool {
        match ip.map(str::trim) {
            Some(ip) if !ip.is_empty() => self.ips.contains(ip),
            _ => false,
        }
    }

    /// Number of configured admin IPs.
    pub fn len(&self) -> usize {
        self.ips.len()
    }

    /// Whether no admin IPs are configured.
    pub fn is_empty(&self) -> bool {
        self.ips.is_empty()
    }
}

// =============================================================================
// Caller Identity
// =============================================================================

/// Read the caller IP from the trusted proxy header.
///
/// The header must appear exactly once and hold a non-blank value. A repeated
/// header is ambiguous and treated as absent.
pub fn caller_ip(headers: &HeaderMap, header: &HeaderName) -> Option<String> {
    let mut values = headers.get_all(header).iter();
    let value = values.next()?;
    if values.next().is_some() {
        debug!(header = %header, "Client IP header sent more than once, ignoring");
        return None;
    }

    let ip = value.to_str().ok()?.trim();
    if ip.is_empty() {
        None
    } else {
        Some(ip.to_string())
    }
}

// =============================================================================
// Axum Middleware
// =============================================================================

/// State for [`admin_middleware`]: the allowlist and where to read the IP from.
#[derive(Debug, Clone)]
pub struct AdminGate {
    allowlist: Arc<AdminAllowlist>,
    header: HeaderName,
}

impl AdminGate {
    /// Create a gate over the given allowlist and trusted header.
    pub fn new(allowlist: Arc<AdminAllowlist>, header: HeaderName) -> Self {
        Self { allowlist, header }
    }

    /// Resolve the caller IP and admin status for a set of request headers.
    pub fn identify(&self, headers: &HeaderMap) -> (Option<String>, bool) {
        let ip = caller_ip(headers, &self.header);
        let is_admin = self.allowlist.is_admin(ip.as_deref());
        (ip, is_admin)
    }
}

/// Axum middleware rejecting callers that are not on the admin allowlist.
///
/// Runs before the handler, so a forbidden request never has its body read
/// and never reaches the object store.
///
/// # Example
///
/// ```ignore
/// use axum::{Router, middleware, routing::post};
/// use photo_gallery::server::admin::{AdminGate, admin_middleware};
///
/// let app = Router::new()
///     .route("/api/upload", post(upload_handler))
///     .layer(middleware::from_fn_with_state(gate, admin_middleware));
/// ```
pub async fn admin_middleware(
    State(gate): State<AdminGate>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let (ip, is_admin) = gate.identify(request.headers());

    if !is_admin {
        warn!(
            ip = ip.as_deref().unwrap_or("unknown"),
            method = %request.method(),
            path = %request.uri().path(),
            "Rejected non-admin request"
        );
        return Err(ApiError::Forbidden);
    }

    debug!(ip = ip.as_deref().unwrap_or("unknown"), "Admin request accepted");
    Ok(next.run(request).await)
}

// =============================================================================
// Tests
// =============================================================================
