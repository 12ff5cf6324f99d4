//! Request bodies and response parsing for the Firestore REST API.

use chrono::SecondsFormat;
use serde::Deserialize;
use serde_json::{Map, Value, json};

use super::codec::{decode_fields, encode_fields, encode_value, field_paths};
use crate::store::{Collection, Direction, Document, FieldFilter, ID_FIELD, OrderBy, UPDATED_AT};

/// Body for `documents:runQuery`.
#[must_use]
pub fn run_query_body(
    collection: Collection,
    filter: Option<&FieldFilter>,
    order_by: OrderBy,
) -> Value {
    let direction = match order_by.direction {
        Direction::Ascending => "ASCENDING",
        Direction::Descending => "DESCENDING",
    };
    let mut query = json!({
        "from": [{ "collectionId": collection.as_str() }],
        "orderBy": [{
            "field": { "fieldPath": order_by.field },
            "direction": direction,
        }],
    });

    if let (Some(filter), Some(obj)) = (filter, query.as_object_mut()) {
        let (field, op, value) = match filter {
            FieldFilter::Equals(field, value) => (*field, "EQUAL", encode_value(value)),
            FieldFilter::AtLeast(field, since) => (
                *field,
                "GREATER_THAN_OR_EQUAL",
                json!({ "timestampValue": since.to_rfc3339_opts(SecondsFormat::Micros, true) }),
            ),
        };
        obj.insert(
            "where".to_owned(),
            json!({ "fieldFilter": {
                "field": { "fieldPath": field },
                "op": op,
                "value": value,
            } }),
        );
    }

    json!({ "structuredQuery": query })
}

/// Whether a commit must find an existing document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    /// Fail with NOT_FOUND if the document is missing.
    MustExist,
    /// Create the document if it is missing.
    Any,
}

/// Body for `documents:commit` writing `fields` into one document.
///
/// The update mask lists the leaf paths of `fields`, so untouched fields
/// (including untouched nested keys) are preserved. `updatedAt` is set to
/// the server's request time.
#[must_use]
pub fn commit_body(
    document_name: &str,
    fields: &Map<String, Value>,
    precondition: Precondition,
) -> Value {
    let mut write = json!({
        "update": {
            "name": document_name,
            "fields": encode_fields(fields),
        },
        "updateMask": { "fieldPaths": field_paths(fields) },
        "updateTransforms": [{
            "fieldPath": UPDATED_AT,
            "setToServerValue": "REQUEST_TIME",
        }],
    });
    if let (Precondition::MustExist, Some(obj)) = (precondition, write.as_object_mut()) {
        obj.insert("currentDocument".to_owned(), json!({ "exists": true }));
    }
    json!({ "writes": [write] })
}

/// A document resource as returned by Firestore.
#[derive(Debug, Deserialize)]
pub struct RawDocument {
    /// Full resource name, ending in `/{collection}/{id}`.
    pub name: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl RawDocument {
    /// Decode into a plain document with its ID under `id`.
    ///
    /// # Errors
    ///
    /// Returns a decode error if any field is malformed.
    pub fn into_document(self) -> Result<Document, crate::store::StoreError> {
        let id = self
            .name
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_owned();
        let mut doc = decode_fields(&self.fields)?;
        doc.insert(ID_FIELD.to_owned(), Value::String(id));
        Ok(doc)
    }
}

/// One element of a `runQuery` response stream.
///
/// Elements without a document carry only progress metadata.
#[derive(Debug, Deserialize)]
pub struct RunQueryItem {
    #[serde(default)]
    pub document: Option<RawDocument>,
}

/// Decode a complete `runQuery` response.
///
/// # Errors
///
/// Returns a decode error if the body or any document is malformed.
pub fn parse_run_query(body: Value) -> Result<Vec<Document>, crate::store::StoreError> {
    let items: Vec<RunQueryItem> = serde_json::from_value(body)?;
    items
        .into_iter()
        .filter_map(|item| item.document)
        .map(RawDocument::into_document)
        .collect()
}

/// Error body returned by Google APIs.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: ErrorDetail,
}

#[derive(Debug, Default, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn test_list_body() {
        let body = run_query_body(Collection::Applications, None, OrderBy::NEWEST_FIRST);
        assert_eq!(
            body,
            json!({ "structuredQuery": {
                "from": [{ "collectionId": "vendorApplications" }],
                "orderBy": [{ "field": { "fieldPath": "createdAt" }, "direction": "DESCENDING" }],
            } })
        );
    }

    #[test]
    fn test_equality_filter_body() {
        let filter = FieldFilter::Equals("status", json!("pending"));
        let body = run_query_body(Collection::Contacts, Some(&filter), OrderBy::NEWEST_FIRST);
        assert_eq!(
            body["structuredQuery"]["where"],
            json!({ "fieldFilter": {
                "field": { "fieldPath": "status" },
                "op": "EQUAL",
                "value": { "stringValue": "pending" },
            } })
        );
    }

    #[test]
    fn test_range_filter_body() {
        let since = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let body = run_query_body(
            Collection::Applications,
            Some(&FieldFilter::created_since(since)),
            OrderBy::OLDEST_FIRST,
        );
        let query = &body["structuredQuery"];
        assert_eq!(query["where"]["fieldFilter"]["op"], json!("GREATER_THAN_OR_EQUAL"));
        assert_eq!(
            query["where"]["fieldFilter"]["value"],
            json!({ "timestampValue": "2026-03-01T00:00:00.000000Z" })
        );
        assert_eq!(query["orderBy"][0]["direction"], json!("ASCENDING"));
    }

    #[test]
    fn test_commit_body_update() {
        let Value::Object(fields) = json!({ "status": "approved", "notes": "ok" }) else {
            unreachable!()
        };
        let body = commit_body(
            "projects/p/databases/(default)/documents/contacts/c1",
            &fields,
            Precondition::MustExist,
        );
        let write = &body["writes"][0];
        assert_eq!(write["update"]["fields"]["status"], json!({ "stringValue": "approved" }));
        assert_eq!(write["updateMask"]["fieldPaths"], json!(["notes", "status"]));
        assert_eq!(
            write["updateTransforms"],
            json!([{ "fieldPath": "updatedAt", "setToServerValue": "REQUEST_TIME" }])
        );
        assert_eq!(write["currentDocument"], json!({ "exists": true }));
    }

    #[test]
    fn test_commit_body_upsert_has_no_precondition() {
        let Value::Object(fields) = json!({ "platformSettings": { "siteName": "S" } }) else {
            unreachable!()
        };
        let body = commit_body("x/settings/platform", &fields, Precondition::Any);
        let write = &body["writes"][0];
        assert!(write.get("currentDocument").is_none());
        assert_eq!(write["updateMask"]["fieldPaths"], json!(["platformSettings.siteName"]));
    }

    #[test]
    fn test_parse_run_query_skips_empty_items() {
        let body = json!([
            { "readTime": "2026-03-04T10:00:00Z" },
            { "document": {
                "name": "projects/p/databases/(default)/documents/contacts/c1",
                "fields": { "status": { "stringValue": "new" } },
            } },
        ]);
        let docs = parse_run_query(body).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0]["id"], json!("c1"));
        assert_eq!(docs[0]["status"], json!("new"));
    }
}
