//! In-process document store.
//!
//! Behaves like the remote collection (generated ids, server creation time,
//! equality queries) without a network. Used by the demo binary and tests, with
//! hooks for injecting failures and latency.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{DocumentStore, FieldValue, StoredDocument};
use crate::types::errors::StoreError;

/// Operations that can be made to fail on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentOp {
    Insert,
    Query,
    Delete,
}

#[derive(Default)]
struct Inner {
    collections: Mutex<HashMap<String, Vec<StoredDocument>>>,
    failures: std::sync::Mutex<HashMap<DocumentOp, usize>>,
    latency: std::sync::Mutex<Option<Duration>>,
    inserts: AtomicUsize,
    queries: AtomicUsize,
    deletes: AtomicUsize,
}

/// Cloneable handle to a shared in-memory document tree.
#[derive(Clone, Default)]
pub struct MemoryDocumentStore {
    inner: Arc<Inner>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` calls of `op` fail with a network error.
    pub fn fail_next(&self, op: DocumentOp, count: usize) {
        if let Ok(mut failures) = self.inner.failures.lock() {
            *failures.entry(op).or_insert(0) += count;
        }
    }

    /// Delays every operation by `latency`.
    pub fn set_latency(&self, latency: Option<Duration>) {
        if let Ok(mut slot) = self.inner.latency.lock() {
            *slot = latency;
        }
    }

    pub fn insert_count(&self) -> usize {
        self.inner.inserts.load(Ordering::SeqCst)
    }

    pub fn query_count(&self) -> usize {
        self.inner.queries.load(Ordering::SeqCst)
    }

    pub fn delete_count(&self) -> usize {
        self.inner.deletes.load(Ordering::SeqCst)
    }

    /// Inserts a raw document, bypassing counters and fault injection.
    pub async fn seed(
        &self,
        collection: &str,
        fields: Map<String, Value>,
        create_time: Option<DateTime<Utc>>,
    ) -> String {
        let id = Uuid::new_v4().to_string();
        let mut collections = self.inner.collections.lock().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .push(StoredDocument { id: id.clone(), fields, create_time });
        id
    }

    /// Snapshot of every document in `collection`.
    pub async fn documents(&self, collection: &str) -> Vec<StoredDocument> {
        let collections = self.inner.collections.lock().await;
        collections.get(collection).cloned().unwrap_or_default()
    }

    async fn enter(&self, op: DocumentOp) -> Result<(), StoreError> {
        let latency = self.inner.latency.lock().ok().and_then(|l| *l);
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if let Ok(mut failures) = self.inner.failures.lock() {
            if let Some(remaining) = failures.get_mut(&op) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(StoreError::Network(format!("injected {:?} failure", op)));
                }
            }
        }
        Ok(())
    }
}

fn to_json(value: FieldValue) -> Value {
    match value {
        FieldValue::String(s) => Value::String(s),
        FieldValue::Timestamp(t) => Value::String(t.to_rfc3339_opts(SecondsFormat::Micros, true)),
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn insert(
        &self,
        collection: &str,
        fields: Vec<(String, FieldValue)>,
    ) -> Result<StoredDocument, StoreError> {
        self.enter(DocumentOp::Insert).await?;
        self.inner.inserts.fetch_add(1, Ordering::SeqCst);

        let doc = StoredDocument {
            id: Uuid::new_v4().to_string(),
            fields: fields.into_iter().map(|(k, v)| (k, to_json(v))).collect(),
            create_time: Some(Utc::now()),
        };
        let mut collections = self.inner.collections.lock().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .push(doc.clone());
        Ok(doc)
    }

    async fn query_eq(
        &self,
        collection: &str,
        filters: &[(&str, &str)],
    ) -> Result<Vec<StoredDocument>, StoreError> {
        self.enter(DocumentOp::Query).await?;
        self.inner.queries.fetch_add(1, Ordering::SeqCst);

        let collections = self.inner.collections.lock().await;
        let docs = collections.get(collection).map(Vec::as_slice).unwrap_or(&[]);
        Ok(docs
            .iter()
            .filter(|doc| {
                filters.iter().all(|(field, expected)| {
                    doc.fields.get(*field).and_then(Value::as_str) == Some(*expected)
                })
            })
            .cloned()
            .collect())
    }

    async fn delete(&self, collection: &str, doc_id: &str) -> Result<(), StoreError> {
        self.enter(DocumentOp::Delete).await?;
        self.inner.deletes.fetch_add(1, Ordering::SeqCst);

        let mut collections = self.inner.collections.lock().await;
        if let Some(docs) = collections.get_mut(collection) {
            docs.retain(|doc| doc.id != doc_id);
        }
        Ok(())
    }
}
