//! MeetLocal server binary.
//!
//! Connects to `PostgreSQL`, runs migrations, wires the admission engine
//! and serves the HTTP API until interrupted.
//!
//! # Usage
//!
//! ```bash
//! # Start infrastructure
//! docker compose up -d postgres
//!
//! # Run server
//! cargo run --bin server
//! ```

use meetlocal_server::{metrics, App, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,meetlocal_server=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting MeetLocal server...");

    let config = Config::from_env();
    metrics::register_business_metrics();

    let app = App::new(config).await?;
    let addr = format!("{}:{}", app.config().server.host, app.config().server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "MeetLocal server is running");

    axum::serve(listener, app.router())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
