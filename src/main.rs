//! Photo Gallery - a personal photo gallery server.
//!
//! This binary starts the HTTP server and configures all components.

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use photo_gallery::{
    config::{CheckConfig, Cli, Command, ServeConfig},
    create_s3_client,
    server::{create_router, AdminAllowlist, RouterConfig},
    store::{ObjectStore, S3ObjectStore},
    StoreError,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.into_command() {
        Command::Serve(config) => run_serve(config).await,
        Command::Check(config) => run_check(config).await,
    }
}

// =============================================================================
// Serve Command
// =============================================================================

async fn run_serve(config: ServeConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let router_config = match build_router_config(&config) {
        Ok(router_config) => router_config,
        Err(e) => {
            error!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("Photo Gallery v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");

    let admins = AdminAllowlist::parse(config.admin_ips.as_deref());
    if admins.is_empty() {
        warn!("  Admin IPs: NONE - uploads and deletes are disabled");
        warn!("             Set --admin-ips or GALLERY_ADMIN_IPS to enable them");
    } else {
        info!("  Admin IPs: {} configured", admins.len());
    }
    info!("  Client IP header: {}", router_config.client_ip_header.as_str());

    let store = match config.bucket() {
        Some(bucket) => {
            info!("  S3 bucket: {}", bucket);
            if let Some(ref endpoint) = config.s3_endpoint {
                info!("  S3 endpoint: {}", endpoint);
            }
            info!("  S3 region: {}", config.s3_region);

            let client = create_s3_client(config.s3_endpoint.as_deref(), &config.s3_region).await;
            let store = S3ObjectStore::new(client, bucket);

            info!("");
            info!("Connecting to S3...");
            match store.list().await {
                Ok(photos) => {
                    info!("  Connected successfully");
                    info!("  Found {} photo(s) in bucket", photos.len());
                }
                Err(e) => {
                    error!("  Failed to connect to S3: {}", e);
                    error!("");
                    error!("  Please check:");
                    error!("    - Your AWS credentials are configured correctly");
                    error!("    - The bucket '{}' exists and is accessible", bucket);
                    error!("    - The S3 endpoint is correct (if using MinIO/custom S3)");
                    return ExitCode::FAILURE;
                }
            }

            Some(store)
        }
        None => {
            warn!("  S3 bucket: NOT CONFIGURED - photo routes will return 500");
            warn!("             Set --s3-bucket or GALLERY_S3_BUCKET");
            None
        }
    };

    let router = create_router(store, router_config);

    let addr = config.bind_address();

    info!("");
    info!("  Server listening on: http://{}", addr);
    info!("");
    info!("  Try these endpoints:");
    info!("    curl http://{}/health", addr);
    info!("    curl http://{}/api/list", addr);
    info!("    curl http://{}/api/ip", addr);
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Server stopped");
    ExitCode::SUCCESS
}

/// Resolve when the process receives Ctrl-C.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "photo_gallery=debug,tower_http=debug"
    } else {
        "photo_gallery=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the application ServeConfig.
fn build_router_config(config: &ServeConfig) -> Result<RouterConfig, String> {
    let mut router_config = RouterConfig::new()
        .with_client_ip_header(config.client_ip_header_name()?)
        .with_cache_max_age(config.cache_max_age)
        .with_tracing(!config.no_tracing);

    if let Some(ref admin_ips) = config.admin_ips {
        router_config = router_config.with_admin_ips(admin_ips.clone());
    }

    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    Ok(router_config)
}

// =============================================================================
// Check Command
// =============================================================================

async fn run_check(config: CheckConfig) -> ExitCode {
    if config.verbose {
        init_logging(true);
    }

    println!("Photo Gallery Configuration Check");
    println!("═════════════════════════════════");
    println!();

    if let Err(e) = config.validate() {
        println!("✗ Bucket: {}", e);
        return ExitCode::FAILURE;
    }

    let bucket = config.s3_bucket.trim();
    println!("✓ Bucket: {}", bucket);
    if let Some(ref endpoint) = config.s3_endpoint {
        println!("✓ Endpoint: {}", endpoint);
    }
    println!("✓ Region: {}", config.s3_region);
    println!();

    print!("Testing S3 connection... ");

    let client = create_s3_client(config.s3_endpoint.as_deref(), &config.s3_region).await;
    let store = S3ObjectStore::new(client, bucket);

    let photos = match store.list().await {
        Ok(photos) => {
            println!("✓ success");
            photos
        }
        Err(e) => {
            println!("✗ failed");
            println!();
            println!("Error: {}", e);
            println!();
            println!("Please check:");
            println!("  - Your AWS credentials are configured correctly");
            println!("  - The bucket '{}' exists and is accessible", bucket);
            if config.s3_endpoint.is_some() {
                println!("  - The S3 endpoint is correct and reachable");
            }
            return ExitCode::FAILURE;
        }
    };

    if config.list_photos {
        println!();
        println!("Photos in bucket:");
        println!("─────────────────");

        if photos.is_empty() {
            println!("  (no photos found)");
        } else {
            for photo in &photos {
                match photo.size {
                    Some(size) => println!("  {} ({} bytes)", photo.key, size),
                    None => println!("  {}", photo.key),
                }
            }
            println!();
            println!("Total: {} photo(s)", photos.len());
        }
    }

    if let Some(ref key) = config.test_photo {
        println!();
        print!("Testing photo '{}'... ", key);

        match store.head(key).await {
            Ok(info) => {
                println!("✓ found");
                if let Some(size) = info.size {
                    let size_mb = size as f64 / (1024.0 * 1024.0);
                    println!("  Size: {:.2} MB", size_mb);
                }
            }
            Err(StoreError::NotFound(_)) => {
                println!("✗ not found");
                println!();
                println!("  The photo '{}' does not exist in the bucket.", key);
                return ExitCode::FAILURE;
            }
            Err(e) => {
                println!("✗ failed");
                println!();
                println!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        }
    }

    println!();
    println!("═════════════════════════════════");
    println!("✓ All checks passed!");

    ExitCode::SUCCESS
}
