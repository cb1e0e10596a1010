use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How long a fetched bookmark list is served from memory.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 30;

/// Wait after a sign-in before the first bookmark load, so the backend sees the new token.
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 500;

/// Top-level ZaikaBox settings container.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ZaikaSettings {
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub bookmarks: BookmarkSettings,
}

/// Which durable store backs bookmarks. Chosen once per session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Remote,
    Local,
}

/// Backing store selection and connection details.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageSettings {
    pub backend: StorageBackend,
    pub remote: RemoteSettings,
    pub local_db_path: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Remote,
            remote: RemoteSettings::default(),
            local_db_path: "zaikabox.db".to_string(),
        }
    }
}

/// Remote document store endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteSettings {
    pub base_url: String,
    pub project_id: String,
    #[serde(default)]
    pub api_key: Option<String>,
    pub collection: String,
    pub request_timeout_secs: u64,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            base_url: "https://firestore.googleapis.com/v1".to_string(),
            project_id: "food-recommendation-fea21".to_string(),
            api_key: None,
            collection: "bookmarks".to_string(),
            request_timeout_secs: 15,
        }
    }
}

impl RemoteSettings {
    /// Root URL of the document tree, e.g. `.../projects/p/databases/(default)/documents`.
    pub fn documents_url(&self) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents",
            self.base_url.trim_end_matches('/'),
            self.project_id
        )
    }
}

/// Bookmark cache and load timing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookmarkSettings {
    pub cache_ttl_secs: u64,
    pub settle_delay_ms: u64,
}

impl Default for BookmarkSettings {
    fn default() -> Self {
        Self {
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
        }
    }
}

impl BookmarkSettings {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}
