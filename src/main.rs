use chrono::Local;
use kindness_app::{
    AppConfig, AppState,
    outbox::Outbox,
    progress::ProgressTracker,
    remote::FirestoreClient,
    router,
    storage::{LocalProgressStore, LocalStorage},
};
use std::{net::SocketAddr, sync::Arc};
use tokio::fs;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = AppConfig::from_env();
    if let Some(parent) = config.data_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }

    let storage = Arc::new(LocalStorage::open(&config.data_path).await);
    let store = Arc::new(LocalProgressStore::new(Arc::clone(&storage)));
    let mut progress = ProgressTracker::load(store).await?;
    progress.check_daily_reset(Local::now().date_naive()).await?;

    let remote = Arc::new(FirestoreClient::new(&config.remote)?);
    let state = AppState::new(remote, progress, Outbox::new(storage), config.donate_url.clone());

    if let Err(err) = state.refresh_catalog().await {
        warn!("starting without acts: {err}");
    }

    let app = router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for ctrl-c: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!("failed to listen for SIGTERM: {err}");
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

    info!("shutting down");
}
