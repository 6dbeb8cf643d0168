//! HostelBridge
//!
//! Main application entry point

use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{info, warn};

use HostelBridge::{
    config::Settings,
    create_router,
    database::{connect_backend, DatabaseService},
    services::AuthEvent,
    utils::logging,
    AppState, ServiceFactory, StateStorage,
};

/// How often expired in-memory drafts and revocations are purged
const STATE_CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new().context("failed to load configuration")?;
    settings.validate()?;

    // Initialize logging; the guard flushes the log file on exit
    let _log_guard = logging::init_logging(&settings.logging)?;

    info!("Starting {}...", HostelBridge::info());

    info!(backend = ?settings.database.backend, "Connecting to backend...");
    let backend = connect_backend(&settings.database).await?;
    let database = DatabaseService::new(backend);

    info!("Connecting state storage...");
    let storage = StateStorage::new(settings.redis.clone()).await?;
    let _cleanup = storage.start_cleanup(STATE_CLEANUP_INTERVAL);

    info!("Initializing services...");
    let services = ServiceFactory::new(database, storage, &settings);
    tokio::spawn(audit_auth_events(services.auth.subscribe()));
    let _limiter_cleanup = services.auth.start_limiter_cleanup(STATE_CLEANUP_INTERVAL);

    let health = services.health_check().await;
    if !health.is_healthy() {
        for issue in health.get_issues() {
            warn!("Startup health check: {}", issue);
        }
    }

    let address = settings.bind_address();
    let app = create_router(AppState::new(services, settings));

    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {}", address))?;
    info!("HostelBridge listening on {}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HostelBridge has been shut down.");
    Ok(())
}

/// Write every auth state change to the log
async fn audit_auth_events(mut events: broadcast::Receiver<AuthEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => info!(event = event.name(), user_id = %event.user_id(), "Auth state changed"),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped = skipped, "Auth audit log fell behind")
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
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
