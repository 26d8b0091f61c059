//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

use anyhow::Context;
use axum::Router;
use platform::rate_limit::InMemoryRateLimitStore;
use resolver::{ChromiumEngine, ResolverConfig, resolver_router};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_PORT: u16 = 3000;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,resolver=info,platform=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let port = match env::var("PORT") {
        Ok(raw) => raw
            .parse::<u16>()
            .with_context(|| format!("PORT must be a valid port number, got {:?}", raw))?,
        Err(_) => DEFAULT_PORT,
    };

    let config = ResolverConfig {
        headless: env::var("HEADLESS")
            .map(|v| !matches!(v.trim().to_ascii_lowercase().as_str(), "false" | "0" | "no"))
            .unwrap_or(true),
        chrome_executable: env::var("CHROME_EXECUTABLE")
            .ok()
            .filter(|p| !p.is_empty())
            .map(PathBuf::from),
        ..ResolverConfig::with_api_secret(env::var("API_SECRET").ok())
    };

    tracing::info!(
        auth_enabled = config.api_secret.is_some(),
        headless = config.headless,
        rate_limit_max = config.rate_limit.max_requests,
        rate_limit_window_secs = config.rate_limit.window.as_secs(),
        "Resolver configured"
    );

    // Rate limit state lives for the whole process; idle clients are swept
    // periodically.
    let store = Arc::new(InMemoryRateLimitStore::new());
    let sweeper_store = store.clone();
    let sweep_config = config.rate_limit.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_config.sweep_interval);
        interval.tick().await;
        loop {
            interval.tick().await;
            let removed = sweeper_store.sweep(&sweep_config);
            if removed > 0 {
                tracing::debug!(
                    removed = removed,
                    remaining = sweeper_store.tracked_identities(),
                    "Rate limit sweep completed"
                );
            }
        }
    });

    let engine = Arc::new(ChromiumEngine::new());

    // Build router
    let app = Router::new()
        .merge(resolver_router(engine, store, config))
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
