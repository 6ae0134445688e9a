use anyhow::Result;
use campuspay::{
    config::Config,
    create_router,
    handlers::AppState,
    middleware::apply_rate_limit,
    services::{CacheService, Store},
};
use chrono::Utc;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("campuspay=info,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    tracing::info!("Starting CampusPay API v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {:?}", config.environment);

    // Initialize services
    let store = Arc::new(match &config.data_file {
        Some(path) => Store::open(path.clone()).await?,
        None => {
            tracing::warn!("DATA_FILE not set, state will not survive a restart");
            Store::in_memory()
        }
    });
    let cache = Arc::new(CacheService::new(&config.redis_url).await?);

    let state = AppState::new(config.clone(), store.clone(), cache);

    if let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) {
        if state.auth.bootstrap_admin(email, password).await? {
            tracing::info!(email = %email, "Bootstrap administrator created");
        }
    }

    // Housekeeping: drop stale QR intents and persist the snapshot.
    let housekeeping = {
        let state = state.clone();
        let mut interval = tokio::time::interval(config.flush_interval);
        tokio::spawn(async move {
            loop {
                interval.tick().await;
                let pruned = state.qr.prune_expired(Utc::now()).await;
                if pruned > 0 {
                    tracing::debug!(pruned, "Expired QR intents removed");
                }
                if let Err(e) = state.store.flush().await {
                    tracing::error!("Snapshot flush failed: {:#}", e);
                }
            }
        })
    };

    let app = apply_rate_limit(
        create_router(state),
        config.rate_limit_per_second,
        config.rate_limit_burst,
    )?;

    // Start server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Admin stats stream: ws://{}/ws/admin/stats", addr);
    tracing::info!("Health check: http://{}/health", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    housekeeping.abort();
    if store.flush().await? {
        tracing::info!("Final snapshot written");
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl+c: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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

    tracing::info!("Shutting down gracefully...");
}
