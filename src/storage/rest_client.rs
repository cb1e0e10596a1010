//! REST client for the remote document store.
//!
//! Speaks the Firestore v1 REST layout: typed field values, `:runQuery` with a
//! structured query for equality filters, and delete by document path.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, RequestBuilder, Response};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use super::{DocumentStore, FieldValue, StoredDocument};
use crate::services::auth_session::AuthSession;
use crate::types::errors::StoreError;
use crate::types::settings::RemoteSettings;

/// Document store reached over HTTPS.
pub struct RestDocumentStore {
    client: Client,
    documents_url: String,
    api_key: Option<String>,
    auth: AuthSession,
}

impl RestDocumentStore {
    /// Builds a client for the configured project. Requests carry the signed-in
    /// user's id token, read from `auth` at request time.
    pub fn new(settings: &RemoteSettings, auth: AuthSession) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            documents_url: settings.documents_url(),
            api_key: settings.api_key.clone(),
            auth,
        })
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = match &self.api_key {
            Some(key) => request.query(&[("key", key)]),
            None => request,
        };
        match self.auth.current().and_then(|identity| identity.id_token) {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, StoreError> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "document store request failed");
            return Err(StoreError::Http { status: status.as_u16(), body });
        }
        Ok(response)
    }
}

/// Encodes a field as a typed REST value.
pub fn encode_value(value: &FieldValue) -> Value {
    match value {
        FieldValue::String(s) => json!({ "stringValue": s }),
        FieldValue::Timestamp(t) => {
            json!({ "timestampValue": t.to_rfc3339_opts(SecondsFormat::Micros, true) })
        }
    }
}

/// Decodes a typed REST value into plain JSON. Timestamps become RFC 3339 strings.
pub fn decode_value(value: &Value) -> Value {
    let Some(obj) = value.as_object() else {
        return Value::Null;
    };
    if let Some(s) = obj.get("stringValue") {
        return s.clone();
    }
    if let Some(t) = obj.get("timestampValue") {
        return t.clone();
    }
    if let Some(i) = obj.get("integerValue") {
        // Integers arrive as decimal strings.
        return match i {
            Value::String(s) => s.parse::<i64>().map(Value::from).unwrap_or(Value::Null),
            other => other.clone(),
        };
    }
    if let Some(d) = obj.get("doubleValue") {
        return d.clone();
    }
    if let Some(b) = obj.get("booleanValue") {
        return b.clone();
    }
    Value::Null
}

/// Builds the `where` clause for equality filters. A single filter is sent bare.
pub fn build_filter(filters: &[(&str, &str)]) -> Option<Value> {
    let mut clauses: Vec<Value> = filters
        .iter()
        .map(|(field, value)| {
            json!({
                "fieldFilter": {
                    "field": { "fieldPath": field },
                    "op": "EQUAL",
                    "value": { "stringValue": value }
                }
            })
        })
        .collect();
    match clauses.len() {
        0 => None,
        1 => clauses.pop(),
        _ => Some(json!({ "compositeFilter": { "op": "AND", "filters": clauses } })),
    }
}

/// Parses a REST document resource (`name`, `fields`, `createTime`).
pub fn parse_document(resource: &Value) -> Result<StoredDocument, StoreError> {
    let name = resource
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| StoreError::InvalidDocument("document has no name".to_string()))?;
    let id = name.rsplit('/').next().unwrap_or(name).to_string();

    let fields: Map<String, Value> = resource
        .get("fields")
        .and_then(Value::as_object)
        .map(|f| f.iter().map(|(k, v)| (k.clone(), decode_value(v))).collect())
        .unwrap_or_default();

    let create_time = resource
        .get("createTime")
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc));

    Ok(StoredDocument { id, fields, create_time })
}

#[async_trait]
impl DocumentStore for RestDocumentStore {
    async fn insert(
        &self,
        collection: &str,
        fields: Vec<(String, FieldValue)>,
    ) -> Result<StoredDocument, StoreError> {
        let encoded: Map<String, Value> =
            fields.iter().map(|(k, v)| (k.clone(), encode_value(v))).collect();
        let url = format!("{}/{}", self.documents_url, collection);
        let response = self
            .send(self.client.post(&url).json(&json!({ "fields": encoded })))
            .await?;
        let body: Value = response.json().await?;
        let doc = parse_document(&body)?;
        debug!(collection, doc_id = %doc.id, "document inserted");
        Ok(doc)
    }

    async fn query_eq(
        &self,
        collection: &str,
        filters: &[(&str, &str)],
    ) -> Result<Vec<StoredDocument>, StoreError> {
        let mut query = json!({ "from": [{ "collectionId": collection }] });
        if let Some(filter) = build_filter(filters) {
            query["where"] = filter;
        }
        let url = format!("{}:runQuery", self.documents_url);
        let response = self
            .send(self.client.post(&url).json(&json!({ "structuredQuery": query })))
            .await?;
        let rows: Vec<Value> = response.json().await?;

        // Rows without a `document` only carry read metadata.
        rows.iter()
            .filter_map(|row| row.get("document"))
            .map(parse_document)
            .collect()
    }

    async fn delete(&self, collection: &str, doc_id: &str) -> Result<(), StoreError> {
        let url = format!("{}/{}/{}", self.documents_url, collection, doc_id);
        self.send(self.client.delete(&url)).await?;
        debug!(collection, doc_id, "document deleted");
        Ok(())
    }
}
