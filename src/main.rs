use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use tokio::signal;
use tokio::sync::oneshot;
use tracing::{info, warn};

use pointr::api::{create_router, AppState};
use pointr::config::Config;
use pointr::export::FileExportSink;
use pointr::observability::{init_tracing, MetricsRegistry};
use pointr::rules::load_catalog;
use pointr::storage::{MemoryStorage, PostgresStorage, Storage};
use pointr::AccrualService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse configuration
    let config = Config::parse();

    // Initialize tracing
    init_tracing(&config.log_level, config.log_json);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting pointr accrual service"
    );

    let storage = open_storage(&config).await?;
    let metrics = Arc::new(MetricsRegistry::new());
    let exporter = Arc::new(FileExportSink::new(config.export_path.clone()));

    info!(template = %config.export_path, "Exports enabled");

    let service = AccrualService::new(storage.clone(), exporter, metrics.clone());

    // Create application state
    let state = Arc::new(AppState {
        service,
        storage,
        metrics,
        start_time: Instant::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        max_upload_bytes: config.max_upload_bytes,
    });

    // Create router
    let app = create_router(state);

    // Parse listen address
    let addr: SocketAddr = config.listen_addr.parse()?;

    info!(addr = %addr, "Starting HTTP server");

    // Create TCP listener
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Run server with graceful shutdown
    if config.graceful_shutdown {
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let mut server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = stop_rx.await;
                })
                .await
        });

        tokio::select! {
            joined = &mut server => {
                joined??;
                return Ok(());
            }
            _ = shutdown_signal() => {}
        }

        // Drain in-flight uploads, bounded by the shutdown timeout
        let _ = stop_tx.send(());
        let timeout = config.shutdown_timeout();
        match tokio::time::timeout(timeout, server).await {
            Ok(joined) => joined??,
            Err(_) => warn!(timeout_secs = timeout.as_secs(), "Shutdown timed out, exiting"),
        }
    } else {
        axum::serve(listener, app).await?;
    }

    info!("Shutdown complete");
    Ok(())
}

/// Postgres when a database URL is configured, otherwise memory seeded from
/// the rule catalog.
async fn open_storage(config: &Config) -> anyhow::Result<Arc<dyn Storage>> {
    match config.database_url.as_deref().filter(|_| config.uses_database()) {
        Some(url) => {
            let storage = PostgresStorage::connect(
                url,
                config.db_min_connections,
                config.db_max_connections,
            )
            .await
            .context("failed to connect to database")?;

            storage
                .run_migrations()
                .await
                .context("failed to run migrations")?;

            info!("Using PostgreSQL storage");
            Ok(Arc::new(storage))
        }
        None => {
            let rules = load_catalog(&config.rules_path).with_context(|| {
                format!("failed to load rules from {}", config.rules_path.display())
            })?;

            info!(
                path = %config.rules_path.display(),
                rules = rules.len(),
                "Using in-memory storage"
            );
            Ok(Arc::new(MemoryStorage::with_rules(rules)))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
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

    info!("Received shutdown signal");
}
