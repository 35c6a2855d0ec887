//! # Bazaar API Server
//!
//! ## Startup
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  env ──► ApiConfig ──► Database (migrations) ──► settings override      │
//! │                                                        │                │
//! │                                                        ▼                │
//! │            TcpListener ◄── build_router(AppState) ◄── AppState          │
//! │                 │                                                       │
//! │                 ▼                                                       │
//! │           axum::serve ──► graceful shutdown on Ctrl+C / SIGTERM         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use bazaar_api::{build_router, ApiConfig, AppState};
use bazaar_db::Database;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    info!("Starting Bazaar API server...");

    let config = ApiConfig::load()?;
    info!(
        addr = %config.socket_addr(),
        db = %config.database_path.display(),
        "Configuration loaded"
    );

    if let Some(parent) = config.database_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db = Database::new(config.db_config()).await?;

    if let Some(name) = &config.store_name {
        let mut settings = db.settings().get().await?;
        if &settings.store_name != name {
            settings.store_name = name.clone();
            settings.updated_at = chrono::Utc::now();
            db.settings().update(&settings).await?;
            info!(store = %name, "Store name set from environment");
        }
    }

    let addr = config.socket_addr();
    let state = AppState::new(db.clone(), config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber.
///
/// Honors `RUST_LOG`, defaulting to info with debug output for our crates.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,bazaar_api=debug,bazaar_db=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
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
                warn!(error = %e, "Failed to install SIGTERM handler");
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

    info!("Shutdown signal received, starting graceful shutdown...");
}
