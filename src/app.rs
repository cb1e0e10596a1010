//! App Core for ZaikaBox.
//!
//! Session-scope container: loads settings, picks the bookmark backing store
//! once, and owns the bookmark manager that views get injected with.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::managers::bookmark_manager::BookmarkManager;
use crate::services::auth_session::AuthSession;
use crate::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use crate::storage::{BookmarkStore, LocalBookmarkStore};
use crate::types::errors::StoreError;
use crate::types::settings::{StorageBackend, ZaikaSettings};

/// Central application struct holding the session's services.
pub struct App {
    pub settings_engine: SettingsEngine,
    pub auth: AuthSession,
    pub bookmarks: Arc<BookmarkManager>,
}

/// Builds the backing store named by the settings.
pub fn build_store(settings: &ZaikaSettings, auth: &AuthSession) -> Result<Arc<dyn BookmarkStore>, StoreError> {
    match settings.storage.backend {
        StorageBackend::Local => {
            info!(path = %settings.storage.local_db_path, "using local bookmark store");
            Ok(Arc::new(LocalBookmarkStore::open(&settings.storage.local_db_path)?))
        }
        #[cfg(feature = "network")]
        StorageBackend::Remote => {
            use crate::storage::{RemoteBookmarkStore, RestDocumentStore};
            let remote = &settings.storage.remote;
            info!(project = %remote.project_id, "using remote bookmark store");
            let documents = RestDocumentStore::new(remote, auth.clone())?;
            Ok(Arc::new(RemoteBookmarkStore::with_collection(documents, &remote.collection)))
        }
        #[cfg(not(feature = "network"))]
        StorageBackend::Remote => {
            let _ = auth;
            warn!("built without the network feature, falling back to the local bookmark store");
            Ok(Arc::new(LocalBookmarkStore::open(&settings.storage.local_db_path)?))
        }
    }
}

impl App {
    /// Loads settings (defaults if the file is missing or unreadable) and wires
    /// the bookmark manager to the configured store.
    pub fn new(config_path: Option<String>) -> Result<Self, Box<dyn std::error::Error>> {
        let mut settings_engine = SettingsEngine::new(config_path);
        let settings = settings_engine.load().unwrap_or_else(|e| {
            warn!("{}, using default settings", e);
            ZaikaSettings::default()
        });

        let auth = AuthSession::new();
        let store = build_store(&settings, &auth)?;
        let bookmarks = Arc::new(BookmarkManager::new(store, auth.clone(), &settings.bookmarks));

        Ok(Self { settings_engine, auth, bookmarks })
    }

    /// Wires an explicit store, bypassing the backend selection.
    pub fn with_store(settings_engine: SettingsEngine, auth: AuthSession, store: Arc<dyn BookmarkStore>) -> Self {
        let bookmarks = Arc::new(BookmarkManager::new(
            store,
            auth.clone(),
            &settings_engine.get_settings().bookmarks,
        ));
        Self { settings_engine, auth, bookmarks }
    }

    /// Starts following auth transitions. Must run inside a tokio runtime.
    pub fn startup(&self) -> JoinHandle<()> {
        info!(backend = ?self.bookmarks.backend(), "starting bookmark manager");
        self.bookmarks.initialize()
    }
}
