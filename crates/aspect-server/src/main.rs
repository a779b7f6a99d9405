//! Aspect Server - resolves the compass orientation of climbing walls

use anyhow::{bail, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use aspect_server::{api, config::Config, state::AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("aspect_server=debug".parse()?),
        )
        .init();

    tracing::info!("Starting Aspect Server...");

    let config = Config::from_env();
    let port = config.server_port;
    let state = Arc::new(AppState::from_config(config)?);

    if state.providers().get(None).is_none() {
        bail!(
            "Unknown default provider '{}'. Supported providers: {}",
            state.providers().default_id(),
            state.providers().ids().join(", ")
        );
    }
    tracing::info!(
        default_provider = state.providers().default_id(),
        providers = ?state.providers().ids(),
        "Elevation providers ready"
    );

    let shutdown = state.shutdown_token().clone();
    let app = api::app(state);

    // Run server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(shutdown))
    .await?;

    tracing::info!("Aspect Server stopped");
    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested, cancelling in-flight elevation fetches");
    shutdown.cancel();
}
