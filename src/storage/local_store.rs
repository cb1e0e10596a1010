//! On-device bookmark store.
//!
//! Fallback used when the remote store is disabled. Records are keyed by meal id
//! inside the owning user's namespace, so there is no generated record id and
//! deletion is a direct key removal.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, OptionalExtension};

use super::BookmarkStore;
use crate::database::Database;
use crate::types::bookmark::{BookmarkRecord, NewBookmark};
use crate::types::errors::StoreError;
use crate::types::settings::StorageBackend;

/// Bookmark store backed by the local SQLite database.
///
/// Every query runs on tokio's blocking pool; the connection is never touched
/// from a runtime worker.
pub struct LocalBookmarkStore {
    db: Arc<Mutex<Database>>,
}

impl LocalBookmarkStore {
    pub fn new(db: Database) -> Self {
        Self { db: Arc::new(Mutex::new(db)) }
    }

    /// Opens (or creates) the database file at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        Ok(Self::new(Database::open(path)?))
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Ok(Self::new(Database::open_in_memory()?))
    }

    /// Runs `f` against the locked database on the blocking pool.
    async fn with_db<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> Result<T, StoreError> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let db = db
                .lock()
                .map_err(|_| StoreError::Database("local database lock poisoned".to_string()))?;
            f(&db)
        })
        .await
        .map_err(|e| StoreError::Database(format!("local database task failed: {}", e)))?
    }

    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<BookmarkRecord> {
        let bookmarked_at: Option<String> = row.get(6)?;
        Ok(BookmarkRecord {
            id: None,
            user_id: row.get(0)?,
            meal_id: row.get(1)?,
            meal_name: row.get(2)?,
            meal_thumb: row.get(3)?,
            meal_category: row.get(4)?,
            meal_area: row.get(5)?,
            bookmarked_at: bookmarked_at
                .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
                .map(|t| t.with_timezone(&Utc)),
        })
    }
}

#[async_trait]
impl BookmarkStore for LocalBookmarkStore {
    /// Stores the bookmark unless the user already has this meal, in which case
    /// the existing entry is returned unchanged.
    async fn create(&self, bookmark: NewBookmark) -> Result<BookmarkRecord, StoreError> {
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        self.with_db(move |db| {
            let conn = db.connection();
            conn.execute(
                "INSERT OR IGNORE INTO local_bookmarks \
                 (user_id, meal_id, meal_name, meal_thumb, meal_category, meal_area, bookmarked_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    bookmark.user_id,
                    bookmark.meal_id,
                    bookmark.meal_name,
                    bookmark.meal_thumb,
                    bookmark.meal_category,
                    bookmark.meal_area,
                    now
                ],
            )?;
            conn.query_row(
                "SELECT user_id, meal_id, meal_name, meal_thumb, meal_category, meal_area, bookmarked_at \
                 FROM local_bookmarks WHERE user_id = ?1 AND meal_id = ?2",
                params![bookmark.user_id, bookmark.meal_id],
                Self::row_to_record,
            )
            .optional()?
            .ok_or_else(|| StoreError::Database(format!("bookmark {} vanished after insert", bookmark.meal_id)))
        })
        .await
    }

    async fn delete_where(&self, user_id: &str, meal_id: &str) -> Result<usize, StoreError> {
        let (user_id, meal_id) = (user_id.to_string(), meal_id.to_string());
        self.with_db(move |db| {
            let affected = db.connection().execute(
                "DELETE FROM local_bookmarks WHERE user_id = ?1 AND meal_id = ?2",
                params![user_id, meal_id],
            )?;
            Ok(affected)
        })
        .await
    }

    async fn list_where(&self, user_id: &str) -> Result<Vec<BookmarkRecord>, StoreError> {
        let user_id = user_id.to_string();
        self.with_db(move |db| {
            let mut stmt = db.connection().prepare(
                "SELECT user_id, meal_id, meal_name, meal_thumb, meal_category, meal_area, bookmarked_at \
                 FROM local_bookmarks WHERE user_id = ?1 ORDER BY rowid",
            )?;
            let rows = stmt.query_map(params![user_id], Self::row_to_record)?;
            let mut results = Vec::new();
            for row in rows {
                results.push(row?);
            }
            Ok(results)
        })
        .await
    }

    fn backend(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
