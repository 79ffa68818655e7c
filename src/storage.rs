use crate::errors::StoreError;
use crate::models::{ProgressRecord, ProgressState};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::{
    collections::BTreeMap,
    fmt::Display,
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
};
use tokio::{fs, sync::Mutex};
use tracing::{error, warn};

pub const PROGRESS_KEY: &str = "kindnessProgress";
pub const CURRENT_COUNT_KEY: &str = "currentCount";
pub const LAST_RESET_KEY: &str = "lastResetDate";
pub const LAST_ACTIVE_KEY: &str = "lastActiveDate";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// String-keyed, string-valued storage mirrored to a single JSON file.
///
/// Every write rewrites the whole file. There is one writer per file, so the
/// last write wins.
pub struct LocalStorage {
    path: Option<PathBuf>,
    entries: Mutex<BTreeMap<String, String>>,
}

impl LocalStorage {
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = load_entries(&path).await;
        Self {
            path: Some(path),
            entries: Mutex::new(entries),
        }
    }

    /// Storage that never touches the disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    pub async fn get_item(&self, key: &str) -> Option<String> {
        self.entries.lock().await.get(key).cloned()
    }

    pub async fn set_item(&self, key: &str, value: impl Into<String>) -> Result<(), StoreError> {
        self.set_items([(key.to_string(), value.into())]).await
    }

    pub async fn set_items<I>(&self, items: I) -> Result<(), StoreError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut entries = self.entries.lock().await;
        entries.extend(items);
        self.persist(&entries).await
    }

    pub async fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().await;
        if entries.remove(key).is_some() {
            self.persist(&entries).await?;
        }
        Ok(())
    }

    async fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let payload = serde_json::to_vec_pretty(entries)?;
        fs::write(path, payload).await?;
        Ok(())
    }
}

async fn load_entries(path: &Path) -> BTreeMap<String, String> {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(entries) => entries,
            Err(err) => {
                error!("failed to parse storage file {}: {err}", path.display());
                BTreeMap::new()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
        Err(err) => {
            error!("failed to read storage file {}: {err}", path.display());
            BTreeMap::new()
        }
    }
}

/// Where progress lives between visits. The tracker only talks to this.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    async fn load(&self) -> Result<ProgressState, StoreError>;
    async fn save(&self, state: &ProgressState) -> Result<(), StoreError>;
}

/// Keeps progress in [`LocalStorage`] under the four fixed keys.
#[derive(Clone)]
pub struct LocalProgressStore {
    storage: Arc<LocalStorage>,
}

impl LocalProgressStore {
    pub fn new(storage: Arc<LocalStorage>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl ProgressStore for LocalProgressStore {
    async fn load(&self) -> Result<ProgressState, StoreError> {
        let record = match self.storage.get_item(PROGRESS_KEY).await {
            Some(raw) => match serde_json::from_str::<ProgressRecord>(&raw) {
                Ok(record) => record,
                Err(err) => {
                    error!("ignoring malformed {PROGRESS_KEY} record: {err}");
                    ProgressRecord::default()
                }
            },
            None => ProgressRecord::default(),
        };

        let completed_today = self
            .storage
            .get_item(CURRENT_COUNT_KEY)
            .await
            .and_then(|raw| parse_stored::<u32>(CURRENT_COUNT_KEY, &raw))
            .unwrap_or(0);
        let last_reset = self
            .storage
            .get_item(LAST_RESET_KEY)
            .await
            .and_then(|raw| parse_date(LAST_RESET_KEY, &raw));
        let last_active = self
            .storage
            .get_item(LAST_ACTIVE_KEY)
            .await
            .and_then(|raw| parse_date(LAST_ACTIVE_KEY, &raw));

        Ok(ProgressState {
            completed: record.completed.into_iter().collect(),
            streak: record.streak,
            completed_today,
            last_reset,
            last_active,
        })
    }

    async fn save(&self, state: &ProgressState) -> Result<(), StoreError> {
        let record = ProgressRecord {
            completed: state.completed.iter().cloned().collect(),
            streak: state.streak,
        };

        let mut items = vec![
            (PROGRESS_KEY.to_string(), serde_json::to_string(&record)?),
            (CURRENT_COUNT_KEY.to_string(), state.completed_today.to_string()),
        ];
        if let Some(date) = state.last_reset {
            items.push((LAST_RESET_KEY.to_string(), format_date(date)));
        }
        if let Some(date) = state.last_active {
            items.push((LAST_ACTIVE_KEY.to_string(), format_date(date)));
        }

        self.storage.set_items(items).await
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_date(key: &str, raw: &str) -> Option<NaiveDate> {
    match NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(err) => {
            warn!("ignoring malformed {key} value {raw:?}: {err}");
            None
        }
    }
}

fn parse_stored<T>(key: &str, raw: &str) -> Option<T>
where
    T: FromStr,
    T::Err: Display,
{
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(err) => {
            warn!("ignoring malformed {key} value {raw:?}: {err}");
            None
        }
    }
}
