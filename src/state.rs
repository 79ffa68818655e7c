use crate::catalog::ActCatalog;
use crate::errors::FetchError;
use crate::models::Act;
use crate::outbox::Outbox;
use crate::progress::ProgressTracker;
use crate::remote::ActStore;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct AppState {
    pub remote: Arc<dyn ActStore>,
    pub catalog: Arc<Mutex<ActCatalog>>,
    pub progress: Arc<Mutex<ProgressTracker>>,
    pub current: Arc<Mutex<Option<Act>>>,
    pub outbox: Arc<Outbox>,
    pub donate_url: String,
}

impl AppState {
    pub fn new(
        remote: Arc<dyn ActStore>,
        progress: ProgressTracker,
        outbox: Outbox,
        donate_url: String,
    ) -> Self {
        Self {
            remote,
            catalog: Arc::new(Mutex::new(ActCatalog::default())),
            progress: Arc::new(Mutex::new(progress)),
            current: Arc::new(Mutex::new(None)),
            outbox: Arc::new(outbox),
            donate_url,
        }
    }

    /// Fetches the catalog without holding the lock, so overlapping refreshes
    /// all land and the last one to finish wins. A success also retries the
    /// outbox in the background.
    pub async fn refresh_catalog(&self) -> Result<usize, FetchError> {
        let outcome = self.remote.fetch_acts().await;
        let result = self.catalog.lock().await.apply_fetch(outcome);

        match &result {
            Ok(count) => {
                info!(count, "act catalog loaded");
                let remote = Arc::clone(&self.remote);
                let outbox = Arc::clone(&self.outbox);
                tokio::spawn(async move {
                    if let Err(err) = outbox.flush(remote.as_ref()).await {
                        error!("failed to flush completion outbox: {err}");
                    }
                });
            }
            Err(err) => warn!("act catalog fetch failed: {err}"),
        }

        result
    }
}
