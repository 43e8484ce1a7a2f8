//! Photo upload rules and key generation.
//!
//! Uploads are validated in a fixed order before anything touches storage:
//! the file must be present, no larger than [`MAX_UPLOAD_SIZE`], and declare
//! one of [`ALLOWED_CONTENT_TYPES`]. The declared content type is trusted as
//! sent by the client; file bytes are not inspected.

use uuid::Uuid;

// =============================================================================
// Limits
// =============================================================================

/// Maximum accepted photo size in bytes (10 MiB).
pub const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Content types accepted for upload.
pub const ALLOWED_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];

// =============================================================================
// Validation
// =============================================================================

/// Strip MIME parameters and lowercase the essence
/// (`"Image/JPEG; charset=binary"` → `"image/jpeg"`).
pub fn normalize_content_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
        .to_ascii_lowercase()
}

/// Check whether a declared content type is one of the allowed image types.
pub fn is_allowed_content_type(content_type: &str) -> bool {
    let normalized = normalize_content_type(content_type);
    ALLOWED_CONTENT_TYPES.contains(&normalized.as_str())
}

/// Check whether a file of `size` bytes fits the upload limit.
#[inline]
pub fn is_within_size_limit(size: usize) -> bool {
    size <= MAX_UPLOAD_SIZE
}

// =============================================================================
// Key Generation
// =============================================================================

/// Extract a safe extension from a client-supplied filename.
///
/// Returns the text after the last `.`, lowercased, only when it is non-empty
/// and made entirely of ASCII alphanumerics. Anything else (no dot, empty
/// extension, path separators, spaces, unicode) yields `None`.
pub fn sanitized_extension(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Generate a fresh photo key.
///
/// The key is a random UUID v4, suffixed with the sanitized extension of the
/// original filename when there is one.
pub fn generate_photo_key(filename: Option<&str>) -> String {
    let id = Uuid::new_v4();
    match filename.and_then(sanitized_extension) {
        Some(ext) => format!("{}.{}", id, ext),
        None => id.to_string(),
    }
}

// =============================================================================
// Tests
// =============================================================================
