use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::serve;
use cap_watch_store::{CounterStore, MemoryStore, SqliteStore};
use cap_watch_tracker::{
    create_router, start_refresh_task, ApiState, StatusBoard, StoreBackend, TrackerConfig,
    UsageWindowTracker,
};
use tokio::{net::TcpListener, signal, sync::Notify};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let config = TrackerConfig::from_env().context("failed to load configuration")?;
    init_tracing(&config);

    info!(
        host = %config.server_host,
        port = config.server_port,
        store = %config.store_backend,
        data_dir = %config.data_dir.display(),
        "starting cap-watch-tracker service"
    );

    let store = open_store(&config)?;
    let changes = Arc::new(Notify::new());
    let tracker = UsageWindowTracker::new(store)
        .with_defaults(config.window_defaults())
        .with_notifier({
            let changes = Arc::clone(&changes);
            move || changes.notify_one()
        });

    let window = tracker
        .initialize()
        .await
        .context("failed to initialize usage window")?;
    info!(
        cap_limit = window.cap_limit,
        message_count = window.message_count,
        "usage window ready"
    );

    let board = StatusBoard::new();
    let _refresh_task = start_refresh_task(
        tracker.clone(),
        board.clone(),
        Duration::from_secs(config.refresh_interval_secs),
        Arc::clone(&changes),
    );

    let addr: SocketAddr = format!("{}:{}", config.server_host, config.server_port)
        .parse()
        .context("invalid server bind address")?;
    let state = Arc::new(ApiState::new(tracker, board, config));
    let router = create_router(state);

    let listener = TcpListener::bind(addr)
        .await
        .context("failed to bind TCP listener")?;
    let local_addr = listener
        .local_addr()
        .context("failed to read bound address")?;
    info!(%local_addr, "cap-watch-tracker listening");

    serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server encountered an unrecoverable error")?;

    info!("cap-watch-tracker shutdown complete");
    Ok(())
}

fn open_store(config: &TrackerConfig) -> Result<Arc<dyn CounterStore>> {
    match config.store_backend {
        StoreBackend::Sqlite => {
            let store = SqliteStore::open(&config.data_dir).with_context(|| {
                format!("failed to open usage store in {}", config.data_dir.display())
            })?;
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            warn!("using in-memory usage store; counts are lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

fn init_tracing(config: &TrackerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install CTRL+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
