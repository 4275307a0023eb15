//! Pixelift Service - HTTP API for image transformations and credits
//!
//! This is the main entry point for the pixelift service.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pixelift_service::{create_router, AppState, ServiceConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,pixelift=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Pixelift Service");

    // Load configuration from environment
    let config = ServiceConfig::from_env();

    tracing::info!(
        listen_addr = %config.listen_addr,
        data_dir = %config.data_dir,
        identity_configured = %config.identity_api_url.is_some(),
        media_configured = %config.media_cloud_name.is_some(),
        stripe_configured = %config.stripe_api_key.is_some(),
        "Service configuration loaded"
    );

    // Open the process-wide store (memoized; concurrent opens coalesce)
    tracing::info!(path = %config.data_dir, "Opening RocksDB store");
    let store = pixelift_store::shared(&config.data_dir)?;

    // Build app state
    let state = AppState::new(store, config.clone());

    // Create the router
    let app = create_router(state);
    tracing::info!("Router configured with all API endpoints");

    // Start HTTP server
    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
