use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use planeacion_api::auth::google::GoogleIdTokenVerifier;
use planeacion_api::config::AppConfig;
use planeacion_api::database::{DatabaseManager, PgStore};
use planeacion_api::{app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional; real deployments inject the environment directly
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("planeacion_api=info,tower_http=info")),
        )
        .init();

    let config = AppConfig::from_env();
    tracing::info!("Starting planeacion-api in {:?} mode", config.environment);
    if config.security.jwt_secret.is_none() {
        tracing::warn!("JWT_SECRET is not set; token issuance and verification will fail");
    }
    if config.security.google_client_id.is_none() && !config.is_development() {
        tracing::warn!("GOOGLE_CLIENT_ID is not set; federated login is disabled");
    }

    let pool = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to the database")?;
    let store = Arc::new(PgStore::new(pool));

    let port = config.server.port;
    let drain = Duration::from_secs(config.server.shutdown_drain_secs);
    let state = AppState::new(config, store.clone(), Arc::new(GoogleIdTokenVerifier::new()));

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("Listening on http://{}", bind_addr);

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        axum::serve(listener, app(state))
            .with_graceful_shutdown(async {
                let _ = stop_rx.await;
            })
            .await
    });

    shutdown_signal().await;
    tracing::info!("Shutdown requested; draining for up to {}s", drain.as_secs());
    let _ = stop_tx.send(());

    match tokio::time::timeout(drain, server).await {
        Ok(joined) => joined.context("server task panicked")?.context("server error")?,
        Err(_) => tracing::warn!("Drain timeout elapsed; closing with requests still in flight"),
    }

    store.close().await;
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
