use std::{sync::Arc, time::Duration};

use anyhow::Context;
use axum::http::{
    Method,
    header::{AUTHORIZATION, CONTENT_TYPE},
};
use db::PgStore;
use server::{config::Config, state::AppState};
use services::{InviteService, JoinService, UsageLogger};
use tokio::{net::TcpListener, signal};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Arc::new(Config::from_env()?);

    let store = Arc::new(PgStore::connect(&config.database_url).await?);
    store.migrate().await?;

    // The analytics table is written with its own narrowly-scoped
    // credential; everything user-facing stays on the primary pool.
    let usage_store: Arc<PgStore> = match &config.service_database_url {
        Some(url) => Arc::new(PgStore::connect(url).await?),
        None => {
            tracing::warn!("SERVICE_DATABASE_URL not set; analytics writes use the primary credential");
            store.clone()
        }
    };

    let invites = Arc::new(InviteService::new(
        store.clone(),
        store.clone(),
        usage_store.clone(),
    ));
    let join = Arc::new(JoinService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        UsageLogger::new(usage_store),
    ));

    let state = AppState {
        config: config.clone(),
        invites,
        join,
    };

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    let app = server::app(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let address = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    info!("listening on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
        info!("received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
        info!("received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
