//! In-process record store.
//!
//! Holds every collection in a `tokio::sync::RwLock`. Used for local
//! development (optionally seeded from a YAML file) and as the store behind
//! router tests. Ordering, filtering and write semantics follow the hosted
//! database closely enough for the dashboard not to notice the difference.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

use chrono::{DateTime, SecondsFormat, Utc};
use futures::future::BoxFuture;
use serde::Deserialize;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use super::{
    Collection, Direction, Document, FieldFilter, ID_FIELD, OrderBy, RecordStore,
    SETTINGS_DOC_ID, StoreError, UPDATED_AT, deep_merge,
};

type Documents = BTreeMap<String, Map<String, Value>>;

/// Seed file layout.
///
/// ```yaml
/// applications:
///   - id: app-1
///     name: Asha Rao
///     companyName: Acme Tools
///     status: pending
///     createdAt: 2026-03-04T10:00:00Z
/// contacts:
///   - email: visitor@example.com
///     message: Hello
/// settings:
///   commissionRate: 12
/// ```
///
/// Records without an `id` get a generated one.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SeedFile {
    pub applications: Vec<Map<String, Value>>,
    pub contacts: Vec<Map<String, Value>>,
    pub settings: Option<Map<String, Value>>,
}

/// Errors loading a seed file.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("failed to read seed file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid seed file: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Record store backed by in-process maps.
#[derive(Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<HashMap<Collection, Documents>>>,
    fail_reads: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the records of a seed document.
    #[must_use]
    pub fn from_seed(seed: SeedFile) -> Self {
        let mut collections: HashMap<Collection, Documents> = HashMap::new();
        for (collection, records) in [
            (Collection::Applications, seed.applications),
            (Collection::Contacts, seed.contacts),
        ] {
            let docs = collections.entry(collection).or_default();
            for mut record in records {
                let id = match record.remove(ID_FIELD) {
                    Some(Value::String(id)) => id,
                    _ => uuid::Uuid::new_v4().simple().to_string(),
                };
                docs.insert(id, record);
            }
        }
        if let Some(settings) = seed.settings {
            collections
                .entry(Collection::Settings)
                .or_default()
                .insert(SETTINGS_DOC_ID.to_owned(), settings);
        }

        Self {
            collections: Arc::new(RwLock::new(collections)),
            ..Self::default()
        }
    }

    /// Load a YAML seed file.
    ///
    /// # Errors
    ///
    /// Returns [`SeedError`] if the file cannot be read or parsed.
    pub fn from_seed_file(path: &Path) -> Result<Self, SeedError> {
        let contents = std::fs::read_to_string(path)?;
        let seed: SeedFile = serde_yaml::from_str(&contents)?;
        tracing::info!(
            path = %path.display(),
            applications = seed.applications.len(),
            contacts = seed.contacts.len(),
            "Loaded memory store seed"
        );
        Ok(Self::from_seed(seed))
    }

    /// Insert or replace a document directly, bypassing write stamping.
    pub async fn insert(&self, collection: Collection, id: impl Into<String>, fields: Value) {
        let fields = match fields {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        self.collections
            .write()
            .await
            .entry(collection)
            .or_default()
            .insert(id.into(), fields);
    }

    /// Make every read fail, to exercise fetch error handling.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, AtomicOrdering::SeqCst);
    }

    /// Make every write fail, to exercise mutation error handling.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, AtomicOrdering::SeqCst);
    }

    fn check(flag: &AtomicBool) -> Result<(), StoreError> {
        if flag.load(AtomicOrdering::SeqCst) {
            return Err(StoreError::Status {
                code: 503,
                message: "memory store unavailable".to_owned(),
            });
        }
        Ok(())
    }

    fn server_time() -> Value {
        Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true))
    }

    async fn query(
        &self,
        collection: Collection,
        filter: Option<FieldFilter>,
        order_by: OrderBy,
    ) -> Result<Vec<Document>, StoreError> {
        Self::check(&self.fail_reads)?;
        let collections = self.collections.read().await;
        let mut docs: Vec<Document> = collections
            .get(&collection)
            .into_iter()
            .flatten()
            .filter(|(_, fields)| filter.as_ref().is_none_or(|f| matches_filter(fields, f)))
            .map(|(id, fields)| with_id(id, fields))
            .collect();
        drop(collections);

        docs.sort_by(|a, b| {
            let ord = compare_field(a.get(order_by.field), b.get(order_by.field));
            match order_by.direction {
                Direction::Ascending => ord,
                Direction::Descending => ord.reverse(),
            }
        });
        // Documents without the order field always go last.
        docs.sort_by_key(|doc| doc.get(order_by.field).is_none_or(Value::is_null));
        Ok(docs)
    }
}

fn with_id(id: &str, fields: &Map<String, Value>) -> Document {
    let mut doc = fields.clone();
    doc.insert(ID_FIELD.to_owned(), Value::String(id.to_owned()));
    doc
}

/// RFC 3339 strings or epoch milliseconds, as the record decoder accepts.
fn as_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

/// Order two field values: timestamps chronologically, numbers numerically,
/// everything else by its string form.
fn compare_field(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => {
            if let (Some(ta), Some(tb)) = (as_timestamp(a), as_timestamp(b)) {
                return ta.cmp(&tb);
            }
            if let (Some(na), Some(nb)) = (a.as_f64(), b.as_f64()) {
                return na.partial_cmp(&nb).unwrap_or(Ordering::Equal);
            }
            a.to_string().cmp(&b.to_string())
        }
        _ => Ordering::Equal,
    }
}

fn matches_filter(fields: &Map<String, Value>, filter: &FieldFilter) -> bool {
    match filter {
        FieldFilter::Equals(field, value) => fields.get(*field) == Some(value),
        FieldFilter::AtLeast(field, since) => fields
            .get(*field)
            .and_then(as_timestamp)
            .is_some_and(|ts| ts >= *since),
    }
}

impl RecordStore for MemoryStore {
    fn list(
        &self,
        collection: Collection,
        order_by: OrderBy,
    ) -> BoxFuture<'_, Result<Vec<Document>, StoreError>> {
        Box::pin(self.query(collection, None, order_by))
    }

    fn list_where(
        &self,
        collection: Collection,
        filter: FieldFilter,
        order_by: OrderBy,
    ) -> BoxFuture<'_, Result<Vec<Document>, StoreError>> {
        Box::pin(self.query(collection, Some(filter), order_by))
    }

    fn get(
        &self,
        collection: Collection,
        id: &str,
    ) -> BoxFuture<'_, Result<Option<Document>, StoreError>> {
        let id = id.to_owned();
        Box::pin(async move {
            Self::check(&self.fail_reads)?;
            let collections = self.collections.read().await;
            Ok(collections
                .get(&collection)
                .and_then(|docs| docs.get(&id))
                .map(|fields| with_id(&id, fields)))
        })
    }

    fn update(
        &self,
        collection: Collection,
        id: &str,
        fields: Map<String, Value>,
    ) -> BoxFuture<'_, Result<(), StoreError>> {
        let id = id.to_owned();
        Box::pin(async move {
            Self::check(&self.fail_writes)?;
            let mut collections = self.collections.write().await;
            let doc = collections
                .get_mut(&collection)
                .and_then(|docs| docs.get_mut(&id))
                .ok_or_else(|| StoreError::NotFound {
                    collection,
                    id: id.clone(),
                })?;
            doc.extend(fields);
            doc.insert(UPDATED_AT.to_owned(), Self::server_time());
            Ok(())
        })
    }

    fn delete(&self, collection: Collection, id: &str) -> BoxFuture<'_, Result<(), StoreError>> {
        let id = id.to_owned();
        Box::pin(async move {
            Self::check(&self.fail_writes)?;
            if let Some(docs) = self.collections.write().await.get_mut(&collection) {
                docs.remove(&id);
            }
            Ok(())
        })
    }

    fn upsert_merge(
        &self,
        collection: Collection,
        id: &str,
        fields: Map<String, Value>,
    ) -> BoxFuture<'_, Result<(), StoreError>> {
        let id = id.to_owned();
        Box::pin(async move {
            Self::check(&self.fail_writes)?;
            let mut collections = self.collections.write().await;
            let doc = collections
                .entry(collection)
                .or_default()
                .entry(id)
                .or_default();
            deep_merge(doc, fields);
            doc.insert(UPDATED_AT.to_owned(), Self::server_time());
            Ok(())
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .insert(
                Collection::Applications,
                "a1",
                json!({ "status": "pending", "createdAt": "2026-03-01T00:00:00Z" }),
            )
            .await;
        store
            .insert(
                Collection::Applications,
                "a2",
                json!({ "status": "approved", "createdAt": "2026-03-03T00:00:00Z" }),
            )
            .await;
        store
            .insert(Collection::Applications, "a3", json!({ "status": "approved" }))
            .await;
        store
    }

    fn ids(docs: &[Document]) -> Vec<&str> {
        docs.iter()
            .filter_map(|d| d.get(ID_FIELD).and_then(Value::as_str))
            .collect()
    }

    #[tokio::test]
    async fn test_list_orders_and_puts_missing_last() {
        let store = seeded().await;
        let newest = store
            .list(Collection::Applications, OrderBy::NEWEST_FIRST)
            .await
            .unwrap();
        assert_eq!(ids(&newest), ["a2", "a1", "a3"]);

        let oldest = store
            .list(Collection::Applications, OrderBy::OLDEST_FIRST)
            .await
            .unwrap();
        assert_eq!(ids(&oldest), ["a1", "a2", "a3"]);
    }

    #[tokio::test]
    async fn test_list_where() {
        let store = seeded().await;
        let approved = store
            .list_where(
                Collection::Applications,
                FieldFilter::Equals("status", json!("approved")),
                OrderBy::NEWEST_FIRST,
            )
            .await
            .unwrap();
        assert_eq!(ids(&approved), ["a2", "a3"]);

        let since = Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap();
        let recent = store
            .list_where(
                Collection::Applications,
                FieldFilter::created_since(since),
                OrderBy::OLDEST_FIRST,
            )
            .await
            .unwrap();
        assert_eq!(ids(&recent), ["a2"]);
    }

    #[tokio::test]
    async fn test_epoch_millis_timestamps_filter_and_sort() {
        let store = MemoryStore::new();
        let early = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2026, 3, 5, 0, 0, 0).unwrap();
        store
            .insert(
                Collection::Applications,
                "millis",
                json!({ "createdAt": late.timestamp_millis() }),
            )
            .await;
        store
            .insert(
                Collection::Applications,
                "rfc",
                json!({ "createdAt": early.to_rfc3339() }),
            )
            .await;

        let newest = store
            .list(Collection::Applications, OrderBy::NEWEST_FIRST)
            .await
            .unwrap();
        assert_eq!(ids(&newest), ["millis", "rfc"]);

        let since = Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap();
        let recent = store
            .list_where(
                Collection::Applications,
                FieldFilter::created_since(since),
                OrderBy::OLDEST_FIRST,
            )
            .await
            .unwrap();
        assert_eq!(ids(&recent), ["millis"]);
    }

    #[tokio::test]
    async fn test_update_stamps_and_requires_existing() {
        let store = seeded().await;
        let Value::Object(fields) = json!({ "status": "rejected" }) else {
            unreachable!()
        };
        store
            .update(Collection::Applications, "a1", fields.clone())
            .await
            .unwrap();
        let doc = store
            .get(Collection::Applications, "a1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc["status"], json!("rejected"));
        assert!(doc.contains_key(UPDATED_AT));
        assert_eq!(doc["createdAt"], json!("2026-03-01T00:00:00Z"));

        let err = store
            .update(Collection::Applications, "missing", fields)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = seeded().await;
        store.delete(Collection::Applications, "a1").await.unwrap();
        store.delete(Collection::Applications, "a1").await.unwrap();
        assert!(
            store
                .get(Collection::Applications, "a1")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_upsert_merge_creates_then_merges() {
        let store = MemoryStore::new();
        let Value::Object(first) = json!({ "commissionRate": 10, "platformSettings": { "siteName": "A", "maintenanceMode": false } }) else {
            unreachable!()
        };
        let Value::Object(second) = json!({ "platformSettings": { "maintenanceMode": true } }) else {
            unreachable!()
        };
        store
            .upsert_merge(Collection::Settings, SETTINGS_DOC_ID, first)
            .await
            .unwrap();
        store
            .upsert_merge(Collection::Settings, SETTINGS_DOC_ID, second)
            .await
            .unwrap();
        let doc = store
            .get(Collection::Settings, SETTINGS_DOC_ID)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc["platformSettings"]["siteName"], json!("A"));
        assert_eq!(doc["platformSettings"]["maintenanceMode"], json!(true));
        assert_eq!(doc["commissionRate"], json!(10));
    }

    #[tokio::test]
    async fn test_fault_injection() {
        let store = seeded().await;
        store.set_fail_writes(true);
        assert!(store.delete(Collection::Applications, "a1").await.is_err());
        assert!(store.get(Collection::Applications, "a1").await.unwrap().is_some());

        store.set_fail_reads(true);
        assert!(
            store
                .list(Collection::Applications, OrderBy::NEWEST_FIRST)
                .await
                .is_err()
        );
    }

    #[test]
    fn test_seed_file_parsing() {
        let yaml = r"
applications:
  - id: app-1
    name: Asha
    status: pending
    createdAt: 2026-03-04T10:00:00Z
contacts:
  - email: visitor@example.com
settings:
  commissionRate: 12
";
        let seed: SeedFile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(seed.applications.len(), 1);
        assert_eq!(seed.applications[0]["id"], json!("app-1"));
        assert_eq!(seed.applications[0]["createdAt"], json!("2026-03-04T10:00:00Z"));
        assert_eq!(seed.settings.unwrap()["commissionRate"], json!(12));
    }

    #[tokio::test]
    async fn test_from_seed_generates_missing_ids() {
        let seed = SeedFile {
            contacts: vec![Map::new()],
            ..SeedFile::default()
        };
        let store = MemoryStore::from_seed(seed);
        let contacts = store
            .list(Collection::Contacts, OrderBy::NEWEST_FIRST)
            .await
            .unwrap();
        assert_eq!(contacts.len(), 1);
        assert!(contacts[0][ID_FIELD].as_str().is_some_and(|id| !id.is_empty()));
    }
}
