//! acai-server: storefront and admin API for açaí shops
//!
//! Long-running service that:
//! - Serves the public storefront and JWT-protected admin API
//! - Receives payment webhooks and polls pending payments in the background
//! - Stores data in PostgreSQL or the local fallback store

use std::net::SocketAddr;
use std::time::Duration;

use acai_server::{AppState, BoxError, Config, api, auth, seed};
use tokio_util::sync::CancellationToken;

fn init_tracing(log_format: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "acai_server=info,tower_http=info".into());
    if log_format.eq_ignore_ascii_case("json") {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let _ = dotenvy::dotenv();

    let config = Config::from_env()?;
    init_tracing(&config.log_format);

    tracing::info!(
        env = %config.environment,
        persistence = %config.persistence_mode,
        "Starting acai-server"
    );

    let state = AppState::new(&config).await?;

    if config.seed_demo_store {
        let demo = seed::seed_demo_store(state.store.as_ref()).await?;
        tracing::info!(slug = %demo.slug, "Demo store available");
    }

    let shutdown = CancellationToken::new();

    // Background payment reconciliation
    let reconcile_handle = if config.payment_poll_interval_secs > 0 && state.gateway.is_some() {
        Some(state.reconciler.clone().spawn(
            Duration::from_secs(config.payment_poll_interval_secs),
            shutdown.clone(),
        ))
    } else {
        tracing::info!("Background payment reconciliation disabled");
        None
    };

    let rate_limiter = state.rate_limiter.clone();
    let cleanup_token = shutdown.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(auth::rate_limit::STALE_AFTER);
        loop {
            tokio::select! {
                _ = cleanup_token.cancelled() => break,
                _ = interval.tick() => rate_limiter.cleanup().await,
            }
        }
    });

    let app = api::build_app(state, &config.cors_allowed_origins);

    let http_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&http_addr).await?;
    tracing::info!("acai-server HTTP listening on {http_addr}");

    let server_token = shutdown.clone();
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        shutdown_signal().await;
        server_token.cancel();
    })
    .await?;

    shutdown.cancel();
    if let Some(handle) = reconcile_handle {
        let _ = handle.await;
    }
    tracing::info!("acai-server stopped");
    Ok(())
}

/// Resolves on SIGTERM or Ctrl+C
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}
