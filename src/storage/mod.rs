//! Bookmark backing stores.
//!
//! The bookmark manager talks to exactly one [`BookmarkStore`], picked when the
//! app starts: the remote document store or the on-device SQLite fallback.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::types::bookmark::{BookmarkRecord, NewBookmark};
use crate::types::errors::StoreError;
use crate::types::settings::StorageBackend;

pub mod local_store;
pub mod memory_documents;
pub mod remote_store;
#[cfg(feature = "network")]
pub mod rest_client;

pub use local_store::LocalBookmarkStore;
pub use memory_documents::MemoryDocumentStore;
pub use remote_store::RemoteBookmarkStore;
#[cfg(feature = "network")]
pub use rest_client::RestDocumentStore;

/// Durable persistence for bookmark records, partitioned by user id.
#[async_trait]
pub trait BookmarkStore: Send + Sync {
    /// Persists a new record and returns it as stored.
    async fn create(&self, bookmark: NewBookmark) -> Result<BookmarkRecord, StoreError>;
    /// Deletes every record of `user_id` for `meal_id`. Returns how many were removed.
    async fn delete_where(&self, user_id: &str, meal_id: &str) -> Result<usize, StoreError>;
    /// Lists every record of `user_id`, in store order.
    async fn list_where(&self, user_id: &str) -> Result<Vec<BookmarkRecord>, StoreError>;
    fn backend(&self) -> StorageBackend;
}

/// A document as returned by a remote document store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub fields: Map<String, Value>,
    /// Server-assigned creation time, when the store reports one.
    pub create_time: Option<DateTime<Utc>>,
}

/// Field values a document store can hold.
///
/// Timestamps are kept distinct from strings so the REST client can send them
/// as native timestamp values.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    String(String),
    Timestamp(DateTime<Utc>),
}

/// Minimal document collection API: insert one, query by field equality, delete by id.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert(
        &self,
        collection: &str,
        fields: Vec<(String, FieldValue)>,
    ) -> Result<StoredDocument, StoreError>;
    async fn query_eq(
        &self,
        collection: &str,
        filters: &[(&str, &str)],
    ) -> Result<Vec<StoredDocument>, StoreError>;
    async fn delete(&self, collection: &str, doc_id: &str) -> Result<(), StoreError>;
}
