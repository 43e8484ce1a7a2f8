//! Configuration management for the photo gallery.
//!
//! Configuration comes from:
//! - Command-line arguments via clap
//! - Environment variables with `GALLERY_` prefix
//! - Sensible defaults for all optional settings
//!
//! # Environment Variables
//!
//! - `GALLERY_HOST` - Server bind address (default: 0.0.0.0)
//! - `GALLERY_PORT` - Server port (default: 3000)
//! - `GALLERY_S3_BUCKET` - S3 bucket holding the photos
//! - `GALLERY_S3_ENDPOINT` - Custom S3 endpoint for S3-compatible services
//! - `GALLERY_S3_REGION` - AWS region (default: us-east-1)
//! - `GALLERY_ADMIN_IPS` - Comma-separated admin IP allowlist
//! - `GALLERY_CLIENT_IP_HEADER` - Trusted client IP header (default: cf-connecting-ip)
//! - `GALLERY_CACHE_MAX_AGE` - HTTP cache max-age seconds for photos (default: 31536000)
//! - `GALLERY_CORS_ORIGINS` - Allowed CORS origins (comma-separated)
//!
//! A missing bucket does not stop the server: storage routes answer with a
//! configuration error instead. A missing allowlist means nobody is admin.

use clap::{Args, Parser, Subcommand};
use http::HeaderName;

use crate::server::{DEFAULT_CACHE_MAX_AGE, DEFAULT_CLIENT_IP_HEADER};

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default AWS region.
pub const DEFAULT_REGION: &str = "us-east-1";

// =============================================================================
// CLI
// =============================================================================

/// Photo Gallery - a personal photo gallery backed by S3.
///
/// Runs the server when no subcommand is given.
#[derive(Parser, Debug, Clone)]
#[command(name = "photo-gallery")]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub serve: ServeConfig,
}

impl Cli {
    /// Resolve the command to run, defaulting to `serve`.
    pub fn into_command(self) -> Command {
        self.command.unwrap_or(Command::Serve(self.serve))
    }
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the HTTP server (default)
    Serve(ServeConfig),

    /// Check storage connectivity and configuration
    Check(CheckConfig),
}

// =============================================================================
// Serve Configuration
// =============================================================================

/// Configuration for the `serve` command.
#[derive(Args, Debug, Clone)]
pub struct ServeConfig {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "GALLERY_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "GALLERY_PORT")]
    pub port: u16,

    // =========================================================================
    // S3 Configuration
    // =========================================================================
    /// S3 bucket name holding the photos.
    ///
    /// If unset, the server starts but list, fetch, upload and delete answer
    /// with a configuration error.
    #[arg(long, env = "GALLERY_S3_BUCKET")]
    pub s3_bucket: Option<String>,

    /// Custom S3 endpoint URL for S3-compatible services (MinIO, R2, etc.).
    #[arg(long, env = "GALLERY_S3_ENDPOINT")]
    pub s3_endpoint: Option<String>,

    /// AWS region for S3.
    #[arg(long, default_value = DEFAULT_REGION, env = "GALLERY_S3_REGION")]
    pub s3_region: String,

    // =========================================================================
    // Admin Configuration
    // =========================================================================
    /// Comma-separated IPs allowed to upload and delete photos.
    ///
    /// If unset, nobody can upload or delete.
    #[arg(long, env = "GALLERY_ADMIN_IPS")]
    pub admin_ips: Option<String>,

    /// Request header holding the client IP, set by the trusted reverse proxy.
    ///
    /// Only use a header your proxy overwrites on every request.
    #[arg(long, default_value = DEFAULT_CLIENT_IP_HEADER, env = "GALLERY_CLIENT_IP_HEADER")]
    pub client_ip_header: String,

    // =========================================================================
    // HTTP Configuration
    // =========================================================================
    /// HTTP Cache-Control max-age in seconds for photo responses.
    #[arg(long, default_value_t = DEFAULT_CACHE_MAX_AGE, env = "GALLERY_CACHE_MAX_AGE")]
    pub cache_max_age: u32,

    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "GALLERY_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl ServeConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if matches!(self.s3_bucket.as_deref(), Some(b) if b.trim().is_empty()) {
            return Err(
                "S3 bucket name is empty. Set --s3-bucket or GALLERY_S3_BUCKET, or leave it unset"
                    .to_string(),
            );
        }

        self.client_ip_header_name()?;

        if self.cache_max_age == 0 {
            return Err("cache_max_age must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the configured bucket, if any.
    pub fn bucket(&self) -> Option<&str> {
        self.s3_bucket.as_deref().map(str::trim).filter(|b| !b.is_empty())
    }

    /// Parse the client IP header name.
    pub fn client_ip_header_name(&self) -> Result<HeaderName, String> {
        HeaderName::from_bytes(self.client_ip_header.trim().as_bytes()).map_err(|_| {
            format!(
                "Invalid client IP header name: '{}'",
                self.client_ip_header
            )
        })
    }
}

// =============================================================================
// Check Configuration
// =============================================================================

/// Configuration for the `check` command.
#[derive(Args, Debug, Clone)]
pub struct CheckConfig {
    /// S3 bucket name holding the photos.
    #[arg(long, env = "GALLERY_S3_BUCKET")]
    pub s3_bucket: String,

    /// Custom S3 endpoint URL for S3-compatible services.
    #[arg(long, env = "GALLERY_S3_ENDPOINT")]
    pub s3_endpoint: Option<String>,

    /// AWS region for S3.
    #[arg(long, default_value = DEFAULT_REGION, env = "GALLERY_S3_REGION")]
    pub s3_region: String,

    /// List every photo key in the bucket.
    #[arg(long, default_value_t = false)]
    pub list_photos: bool,

    /// Probe a single photo key.
    #[arg(long)]
    pub test_photo: Option<String>,

    /// Enable verbose logging.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl CheckConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.s3_bucket.trim().is_empty() {
            return Err("S3 bucket name is required. Set --s3-bucket or GALLERY_S3_BUCKET".to_string());
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
