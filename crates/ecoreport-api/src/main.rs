//! ecoreport API Service
//!
//! REST backend for the crowdsourced litter-reporting system

use anyhow::{Context, Result};
use ecoreport_api::{create_router, db, AppState, Config};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ecoreport_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Configuration (fails fast when JWT_SECRET is missing)
    let config = Config::from_env().context("Failed to load configuration")?;
    config.ensure_directories()?;

    info!("Starting ecoreport API");
    info!("Database: {}", config.database_url);
    info!("Uploads directory: {}", config.uploads_dir.display());

    // Initialize storage
    let pool = db::create_pool(&config.database_url)
        .await
        .context("Failed to initialize database")?;

    let addr = config.bind_address();
    let state = AppState::new(config, pool);

    // Create router
    let app = create_router(state);

    // Bind and serve
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    info!("ecoreport API running on http://{}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
