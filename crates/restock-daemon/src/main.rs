//! restock-daemon entry point.
//!
//! This file is intentionally thin: it sets up tracing, loads settings,
//! builds the shared state around the HTTP gateway, wires middleware, and
//! starts the server. All route handlers live in `routes.rs`; all shared
//! state types live in `state.rs`.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use restock_daemon::{routes, state};
use restock_gateway::HttpInventoryClient;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{info, Level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present (dev convenience). Silent if the file does not
    // exist; production injects env vars directly.
    let _ = dotenvy::dotenv();

    init_tracing();

    let settings = restock_config::Settings::from_env().context("invalid configuration")?;
    info!(
        store = %settings.store_name,
        recipe_field = %settings.recipe_field_name,
        threshold = settings.min_stock_threshold,
        "settings loaded"
    );

    let gateway = HttpInventoryClient::new(settings.api_base.clone(), settings.api_token.clone())
        .context("failed to build inventory api client")?;
    let shared = Arc::new(state::AppState::new(settings, Arc::new(gateway)));

    let addr: SocketAddr = format!(
        "{}:{}",
        shared.settings.server_host, shared.settings.server_port
    )
    .parse()
    .context("invalid SERVER_HOST/SERVER_PORT combination")?;

    let app = routes::build_router(Arc::clone(&shared)).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    info!("restock-daemon listening on http://{}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server crashed")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to install ctrl-c handler: {e}");
    }
}
