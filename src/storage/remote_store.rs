//! Remote bookmark store.
//!
//! Maps bookmark records onto documents of a single collection. The store never
//! enforces (user, meal) uniqueness; the manager checks before inserting.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::{BookmarkStore, DocumentStore, FieldValue, StoredDocument};
use crate::types::bookmark::{BookmarkRecord, NewBookmark};
use crate::types::errors::StoreError;
use crate::types::settings::StorageBackend;

/// Default collection holding bookmark documents.
pub const BOOKMARKS_COLLECTION: &str = "bookmarks";

/// Bookmark store backed by a remote document collection.
pub struct RemoteBookmarkStore<D: DocumentStore> {
    documents: D,
    collection: String,
}

impl<D: DocumentStore> RemoteBookmarkStore<D> {
    pub fn new(documents: D) -> Self {
        Self::with_collection(documents, BOOKMARKS_COLLECTION)
    }

    pub fn with_collection(documents: D, collection: &str) -> Self {
        Self {
            documents,
            collection: collection.to_string(),
        }
    }

    /// Access to the underlying document store.
    pub fn documents(&self) -> &D {
        &self.documents
    }

    fn to_fields(bookmark: &NewBookmark, now: DateTime<Utc>) -> Vec<(String, FieldValue)> {
        vec![
            ("userId".to_string(), FieldValue::String(bookmark.user_id.clone())),
            ("mealId".to_string(), FieldValue::String(bookmark.meal_id.clone())),
            ("mealName".to_string(), FieldValue::String(bookmark.meal_name.clone())),
            ("mealThumb".to_string(), FieldValue::String(bookmark.meal_thumb.clone())),
            ("mealCategory".to_string(), FieldValue::String(bookmark.meal_category.clone())),
            ("mealArea".to_string(), FieldValue::String(bookmark.meal_area.clone())),
            ("bookmarkedAt".to_string(), FieldValue::Timestamp(now)),
        ]
    }

    /// Reads a document back into a record.
    ///
    /// `userId` and `mealId` are required; display fields default to empty.
    /// `bookmarkedAt` falls back to the document's creation time.
    pub fn document_to_record(doc: &StoredDocument) -> Result<BookmarkRecord, StoreError> {
        let required = |name: &str| -> Result<String, StoreError> {
            string_field(&doc.fields, name).ok_or_else(|| {
                StoreError::InvalidDocument(format!("document {} has no {}", doc.id, name))
            })
        };

        let bookmarked_at = doc
            .fields
            .get("bookmarkedAt")
            .and_then(parse_timestamp)
            .or(doc.create_time);

        Ok(BookmarkRecord {
            id: Some(doc.id.clone()),
            user_id: required("userId")?,
            meal_id: required("mealId")?,
            meal_name: string_field(&doc.fields, "mealName").unwrap_or_default(),
            meal_thumb: string_field(&doc.fields, "mealThumb").unwrap_or_default(),
            meal_category: string_field(&doc.fields, "mealCategory").unwrap_or_default(),
            meal_area: string_field(&doc.fields, "mealArea").unwrap_or_default(),
            bookmarked_at,
        })
    }
}

fn string_field(fields: &Map<String, Value>, name: &str) -> Option<String> {
    match fields.get(name)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Accepts RFC 3339 strings and epoch milliseconds; anything else is treated as missing.
fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|t| t.with_timezone(&Utc)),
        Value::Number(n) => n.as_i64().and_then(DateTime::<Utc>::from_timestamp_millis),
        _ => None,
    }
}

#[async_trait]
impl<D: DocumentStore> BookmarkStore for RemoteBookmarkStore<D> {
    async fn create(&self, bookmark: NewBookmark) -> Result<BookmarkRecord, StoreError> {
        let now = Utc::now();
        let doc = self
            .documents
            .insert(&self.collection, Self::to_fields(&bookmark, now))
            .await?;
        debug!(doc_id = %doc.id, meal_id = %bookmark.meal_id, "bookmark document created");
        let bookmarked_at = doc
            .fields
            .get("bookmarkedAt")
            .and_then(parse_timestamp)
            .or(doc.create_time)
            .or(Some(now));
        Ok(bookmark.into_record(Some(doc.id), bookmarked_at))
    }

    /// Deletes each matching document by id. Stops at the first failed delete.
    async fn delete_where(&self, user_id: &str, meal_id: &str) -> Result<usize, StoreError> {
        let docs = self
            .documents
            .query_eq(&self.collection, &[("userId", user_id), ("mealId", meal_id)])
            .await?;
        for doc in &docs {
            self.documents.delete(&self.collection, &doc.id).await?;
        }
        Ok(docs.len())
    }

    /// Documents that do not read back as a bookmark are logged and skipped.
    async fn list_where(&self, user_id: &str) -> Result<Vec<BookmarkRecord>, StoreError> {
        let docs = self
            .documents
            .query_eq(&self.collection, &[("userId", user_id)])
            .await?;
        Ok(docs
            .iter()
            .filter_map(|doc| match Self::document_to_record(doc) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(doc_id = %doc.id, "skipping bookmark document: {}", e);
                    None
                }
            })
            .collect())
    }

    fn backend(&self) -> StorageBackend {
        StorageBackend::Remote
    }
}
