//! Record store access.
//!
//! The dashboard owns no data. Vendor applications, contact messages and the
//! settings singleton live in a hosted document database; this module is the
//! seam between the view layer and that database.
//!
//! # Implementations
//!
//! - [`FirestoreStore`] - Firestore REST v1 (production, or the emulator)
//! - [`MemoryStore`] - in-process maps, optionally seeded from YAML (local
//!   development and tests)
//!
//! Both are used through `Arc<dyn RecordStore>` held in `AppState`.

pub mod firestore;
pub mod memory;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde_json::{Map, Value};
use thiserror::Error;

pub use firestore::FirestoreStore;
pub use memory::MemoryStore;

/// A stored document: its fields plus an `id` entry holding the document ID.
pub type Document = Map<String, Value>;

/// Key under which the document ID is exposed in a [`Document`].
pub const ID_FIELD: &str = "id";

/// Document ID of the settings singleton.
pub const SETTINGS_DOC_ID: &str = "platform";

/// Field stamped with the server time on every write.
pub const UPDATED_AT: &str = "updatedAt";

/// Field used to order record lists.
pub const CREATED_AT: &str = "createdAt";

/// Collections the dashboard reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Applications,
    Contacts,
    Settings,
}

impl Collection {
    /// Collection ID in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Applications => "vendorApplications",
            Self::Contacts => "contacts",
            Self::Settings => "settings",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort direction for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Ordering applied to a list query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub field: &'static str,
    pub direction: Direction,
}

impl OrderBy {
    /// Newest records first.
    pub const NEWEST_FIRST: Self = Self {
        field: CREATED_AT,
        direction: Direction::Descending,
    };

    /// Oldest records first.
    pub const OLDEST_FIRST: Self = Self {
        field: CREATED_AT,
        direction: Direction::Ascending,
    };
}

/// Single-field condition for [`RecordStore::list_where`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldFilter {
    /// `field == value`
    Equals(&'static str, Value),
    /// `field >= timestamp`
    AtLeast(&'static str, DateTime<Utc>),
}

impl FieldFilter {
    /// Records created at or after `since`.
    #[must_use]
    pub const fn created_since(since: DateTime<Utc>) -> Self {
        Self::AtLeast(CREATED_AT, since)
    }
}

/// Errors returned by record store clients.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The request could not be sent or the response not read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The database answered with an error status.
    #[error("store returned {code}: {message}")]
    Status {
        /// HTTP status code.
        code: u16,
        /// Error message from the response body.
        message: String,
    },

    /// A response or document could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// The document to update does not exist.
    #[error("{collection}/{id} not found")]
    NotFound {
        /// Collection searched.
        collection: Collection,
        /// Missing document ID.
        id: String,
    },

    /// The write was rejected because of a concurrent change.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Access to the hosted document database.
///
/// Every method is one round trip. Lists are unpaginated. Writes touch only
/// the given fields and always stamp [`UPDATED_AT`] with the server time.
pub trait RecordStore: Send + Sync {
    /// All documents of a collection, ordered.
    fn list(
        &self,
        collection: Collection,
        order_by: OrderBy,
    ) -> BoxFuture<'_, Result<Vec<Document>, StoreError>>;

    /// Documents matching a single-field condition, ordered.
    fn list_where(
        &self,
        collection: Collection,
        filter: FieldFilter,
        order_by: OrderBy,
    ) -> BoxFuture<'_, Result<Vec<Document>, StoreError>>;

    /// One document by ID, or `None` if it does not exist.
    fn get(
        &self,
        collection: Collection,
        id: &str,
    ) -> BoxFuture<'_, Result<Option<Document>, StoreError>>;

    /// Overwrite the given top-level fields of an existing document.
    ///
    /// Fails with [`StoreError::NotFound`] if the document does not exist.
    fn update(
        &self,
        collection: Collection,
        id: &str,
        fields: Map<String, Value>,
    ) -> BoxFuture<'_, Result<(), StoreError>>;

    /// Delete a document. Deleting a missing document succeeds.
    fn delete(&self, collection: Collection, id: &str) -> BoxFuture<'_, Result<(), StoreError>>;

    /// Create or update a document, deep-merging nested maps.
    fn upsert_merge(
        &self,
        collection: Collection,
        id: &str,
        fields: Map<String, Value>,
    ) -> BoxFuture<'_, Result<(), StoreError>>;
}

/// Recursively merge `patch` into `target`. Nested objects merge; everything
/// else is replaced.
pub(crate) fn deep_merge(target: &mut Map<String, Value>, patch: Map<String, Value>) {
    for (key, value) in patch {
        match (target.get_mut(&key), value) {
            (Some(Value::Object(existing)), Value::Object(nested)) => deep_merge(existing, nested),
            (_, value) => {
                target.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_collection_ids() {
        assert_eq!(Collection::Applications.as_str(), "vendorApplications");
        assert_eq!(Collection::Contacts.to_string(), "contacts");
        assert_eq!(Collection::Settings.as_str(), "settings");
    }

    #[test]
    fn test_deep_merge_keeps_untouched_nested_keys() {
        let Value::Object(mut target) = json!({
            "commissionRate": 15,
            "emailNotifications": { "newApplications": true, "weeklyReports": false },
        }) else {
            unreachable!()
        };
        let Value::Object(patch) = json!({
            "emailNotifications": { "weeklyReports": true },
            "autoApproveVendors": true,
        }) else {
            unreachable!()
        };
        deep_merge(&mut target, patch);
        assert_eq!(
            Value::Object(target),
            json!({
                "commissionRate": 15,
                "emailNotifications": { "newApplications": true, "weeklyReports": true },
                "autoApproveVendors": true,
            })
        );
    }

    #[test]
    fn test_not_found_display() {
        let err = StoreError::NotFound {
            collection: Collection::Contacts,
            id: "c9".to_owned(),
        };
        assert_eq!(err.to_string(), "contacts/c9 not found");
    }
}
