use std::{env, path::PathBuf, time::Duration};

pub const DEFAULT_DONATE_URL: &str = "https://www.buymeacoffee.com/kindnessapp";
const DEFAULT_FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com";
const DEFAULT_PROJECT_ID: &str = "kindness-app";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub data_path: PathBuf,
    pub remote: RemoteConfig,
    pub donate_url: String,
}

#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub base_url: String,
    pub project_id: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = lookup("PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(8080);

        let data_path = lookup("APP_DATA_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("data/local_storage.json"));

        let timeout_secs = lookup("REMOTE_TIMEOUT_SECS")
            .and_then(|value| value.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(10);

        let remote = RemoteConfig {
            base_url: lookup("FIRESTORE_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_FIRESTORE_BASE_URL.to_string()),
            project_id: lookup("FIRESTORE_PROJECT_ID")
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_PROJECT_ID.to_string()),
            api_key: lookup("FIRESTORE_API_KEY").filter(|key| !key.trim().is_empty()),
            timeout: Duration::from_secs(timeout_secs),
        };

        Self {
            port,
            data_path,
            remote,
            donate_url: lookup("DONATE_URL").unwrap_or_else(|| DEFAULT_DONATE_URL.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.data_path, PathBuf::from("data/local_storage.json"));
        assert_eq!(config.remote.base_url, DEFAULT_FIRESTORE_BASE_URL);
        assert_eq!(config.remote.project_id, DEFAULT_PROJECT_ID);
        assert!(config.remote.api_key.is_none());
        assert_eq!(config.remote.timeout, Duration::from_secs(10));
        assert_eq!(config.donate_url, DEFAULT_DONATE_URL);
    }

    #[test]
    fn overrides_are_read_and_bad_numbers_ignored() {
        let config = config_from(&[
            ("PORT", "not-a-port"),
            ("APP_DATA_PATH", "/tmp/ls.json"),
            ("FIRESTORE_BASE_URL", "http://127.0.0.1:9000/"),
            ("FIRESTORE_API_KEY", "abc"),
            ("REMOTE_TIMEOUT_SECS", "0"),
        ]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.data_path, PathBuf::from("/tmp/ls.json"));
        assert_eq!(config.remote.base_url, "http://127.0.0.1:9000");
        assert_eq!(config.remote.api_key.as_deref(), Some("abc"));
        assert_eq!(config.remote.timeout, Duration::from_secs(10));
    }
}
