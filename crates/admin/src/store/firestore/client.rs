//! Firestore REST v1 client.

use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value};
use tracing::instrument;

use super::query::{
    ErrorBody, Precondition, RawDocument, commit_body, parse_run_query, run_query_body,
};
use crate::config::FirestoreConfig;
use crate::store::{Collection, Document, FieldFilter, OrderBy, RecordStore, StoreError};

/// Production Firestore endpoint.
const FIRESTORE_HOST: &str = "https://firestore.googleapis.com";

/// Bearer token the emulator accepts as an admin credential.
const EMULATOR_TOKEN: &str = "owner";

/// Record store backed by Cloud Firestore (or its emulator).
///
/// Cheap to clone; all clones share one HTTP connection pool.
#[derive(Clone)]
pub struct FirestoreStore {
    inner: Arc<FirestoreInner>,
}

struct FirestoreInner {
    client: reqwest::Client,
    /// `{host}/v1/projects/{project}/databases/{database}/documents`
    documents_url: String,
    /// `projects/{project}/databases/{database}/documents`
    documents_path: String,
    api_key: Option<SecretString>,
    bearer_token: Option<SecretString>,
}

impl std::fmt::Debug for FirestoreStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirestoreStore")
            .field("documents_url", &self.inner.documents_url)
            .field("api_key", &self.inner.api_key.as_ref().map(|_| "[REDACTED]"))
            .field(
                "bearer_token",
                &self.inner.bearer_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl FirestoreStore {
    /// Create a client for the configured project and database.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &FirestoreConfig) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        let host = config
            .emulator_host
            .as_ref()
            .map_or_else(|| FIRESTORE_HOST.to_owned(), |h| format!("http://{h}"));
        let documents_path = format!(
            "projects/{}/databases/{}/documents",
            config.project_id, config.database
        );
        let bearer_token = config.bearer_token.clone().or_else(|| {
            config
                .emulator_host
                .is_some()
                .then(|| SecretString::from(EMULATOR_TOKEN))
        });

        Ok(Self {
            inner: Arc::new(FirestoreInner {
                client,
                documents_url: format!("{host}/v1/{documents_path}"),
                documents_path,
                api_key: config.api_key.clone(),
                bearer_token,
            }),
        })
    }

    fn document_url(&self, collection: Collection, id: &str) -> String {
        format!(
            "{}/{}/{}",
            self.inner.documents_url,
            collection.as_str(),
            urlencoding_segment(id)
        )
    }

    fn document_name(&self, collection: Collection, id: &str) -> String {
        format!("{}/{}/{id}", self.inner.documents_path, collection.as_str())
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let mut builder = self.inner.client.request(method, url);
        if let Some(key) = &self.inner.api_key {
            builder = builder.query(&[("key", key.expose_secret())]);
        }
        if let Some(token) = &self.inner.bearer_token {
            builder = builder.bearer_auth(token.expose_secret());
        }
        builder
    }

    /// Send a request and return the JSON body, mapping error statuses.
    async fn send(
        &self,
        builder: RequestBuilder,
        collection: Collection,
        id: Option<&str>,
    ) -> Result<Value, StoreError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            let text = response.text().await?;
            if text.trim().is_empty() {
                return Ok(Value::Null);
            }
            return Ok(serde_json::from_str(&text)?);
        }

        let body: ErrorBody = response.json().await.unwrap_or_default();
        let message = if body.error.message.is_empty() {
            status.to_string()
        } else {
            body.error.message
        };
        Err(match (status, id) {
            (StatusCode::NOT_FOUND, Some(id)) => StoreError::NotFound {
                collection,
                id: id.to_owned(),
            },
            (StatusCode::CONFLICT, _) => StoreError::Conflict(message),
            _ if body.error.status == "ABORTED" => StoreError::Conflict(message),
            _ => StoreError::Status {
                code: status.as_u16(),
                message,
            },
        })
    }

    #[instrument(skip(self, filter), fields(collection = %collection))]
    async fn run_query(
        &self,
        collection: Collection,
        filter: Option<FieldFilter>,
        order_by: OrderBy,
    ) -> Result<Vec<Document>, StoreError> {
        let url = format!("{}:runQuery", self.inner.documents_url);
        let body = run_query_body(collection, filter.as_ref(), order_by);
        let response = self
            .send(self.request(Method::POST, &url).json(&body), collection, None)
            .await?;
        let docs = parse_run_query(response)?;
        tracing::debug!(count = docs.len(), "Query complete");
        Ok(docs)
    }

    #[instrument(skip(self), fields(collection = %collection))]
    async fn fetch(
        &self,
        collection: Collection,
        id: String,
    ) -> Result<Option<Document>, StoreError> {
        let url = self.document_url(collection, &id);
        match self
            .send(self.request(Method::GET, &url), collection, Some(&id))
            .await
        {
            Ok(body) => {
                let raw: RawDocument = serde_json::from_value(body)?;
                raw.into_document().map(Some)
            }
            Err(StoreError::NotFound { .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    #[instrument(skip(self, fields), fields(collection = %collection))]
    async fn commit(
        &self,
        collection: Collection,
        id: String,
        fields: Map<String, Value>,
        precondition: Precondition,
    ) -> Result<(), StoreError> {
        let url = format!("{}:commit", self.inner.documents_url);
        let body = commit_body(&self.document_name(collection, &id), &fields, precondition);
        self.send(
            self.request(Method::POST, &url).json(&body),
            collection,
            Some(&id),
        )
        .await?;
        tracing::info!(?precondition, "Document written");
        Ok(())
    }

    #[instrument(skip(self), fields(collection = %collection))]
    async fn remove(&self, collection: Collection, id: String) -> Result<(), StoreError> {
        let url = self.document_url(collection, &id);
        self.send(self.request(Method::DELETE, &url), collection, None)
            .await?;
        tracing::info!("Document deleted");
        Ok(())
    }
}

/// Percent-encode a document ID for use as a single path segment.
fn urlencoding_segment(id: &str) -> String {
    url::form_urlencoded::byte_serialize(id.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

impl RecordStore for FirestoreStore {
    fn list(
        &self,
        collection: Collection,
        order_by: OrderBy,
    ) -> BoxFuture<'_, Result<Vec<Document>, StoreError>> {
        Box::pin(self.run_query(collection, None, order_by))
    }

    fn list_where(
        &self,
        collection: Collection,
        filter: FieldFilter,
        order_by: OrderBy,
    ) -> BoxFuture<'_, Result<Vec<Document>, StoreError>> {
        Box::pin(self.run_query(collection, Some(filter), order_by))
    }

    fn get(
        &self,
        collection: Collection,
        id: &str,
    ) -> BoxFuture<'_, Result<Option<Document>, StoreError>> {
        Box::pin(self.fetch(collection, id.to_owned()))
    }

    fn update(
        &self,
        collection: Collection,
        id: &str,
        fields: Map<String, Value>,
    ) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(self.commit(collection, id.to_owned(), fields, Precondition::MustExist))
    }

    fn delete(&self, collection: Collection, id: &str) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(self.remove(collection, id.to_owned()))
    }

    fn upsert_merge(
        &self,
        collection: Collection,
        id: &str,
        fields: Map<String, Value>,
    ) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(self.commit(collection, id.to_owned(), fields, Precondition::Any))
    }
}
