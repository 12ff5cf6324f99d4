//! Vendor applications and contact messages.
//!
//! Records arrive from the record store as loosely-typed documents: any field
//! may be missing, and older documents carry values the dashboard no longer
//! offers. Each record kind therefore has two shapes:
//!
//! - `Raw*` - a lenient decode of the stored document, every field optional
//! - the normalized record - every display-relevant field populated
//!
//! Normalization happens exactly once, in the `From<Raw*>` conversions, so
//! no template or metric has to repeat a "missing means pending" rule.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::types::{
    ApplicationId, ApplicationStatus, ContactId, ContactIntent, ContactStatus, VendorPlan,
};

/// Stored field names shared by both record kinds.
pub mod fields {
    pub const STATUS: &str = "status";
    pub const NOTES: &str = "notes";
    pub const CREATED_AT: &str = "createdAt";
    pub const UPDATED_AT: &str = "updatedAt";
}

/// Placeholder for a timestamp the document does not carry.
pub const MISSING_DATE: &str = "N/A";

/// Display name for contacts that did not leave one.
pub const ANONYMOUS: &str = "Anonymous";

/// Number of characters shown in a message preview.
pub const MESSAGE_PREVIEW_CHARS: usize = 50;

// =============================================================================
// Raw documents
// =============================================================================

/// A vendor application exactly as stored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawApplication {
    pub id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub email: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub contact_number: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub designation: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub company_name: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub category: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub plan: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub tax_id: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub notes: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub status: Option<String>,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A contact message exactly as stored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawContact {
    pub id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub email: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub message: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub intent: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub status: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub notes: Option<String>,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Accept strings, numbers and booleans; anything else is treated as absent.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

/// Accept RFC 3339 strings and epoch milliseconds; malformed values are absent.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => DateTime::parse_from_rfc3339(&s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Some(Value::Number(n)) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    })
}

// =============================================================================
// Normalized records
// =============================================================================

/// A vendor application with every display field populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: ApplicationId,
    pub name: String,
    pub email: String,
    pub contact_number: String,
    pub designation: String,
    pub company_name: String,
    pub category: String,
    pub plan: String,
    pub tax_id: String,
    pub notes: String,
    pub status: ApplicationStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<RawApplication> for Application {
    fn from(raw: RawApplication) -> Self {
        Self {
            id: ApplicationId::new(raw.id),
            name: raw.name.unwrap_or_default(),
            email: raw.email.unwrap_or_default(),
            contact_number: raw.contact_number.unwrap_or_default(),
            designation: raw.designation.unwrap_or_default(),
            company_name: raw.company_name.unwrap_or_default(),
            category: raw.category.unwrap_or_default(),
            plan: raw.plan.unwrap_or_default(),
            tax_id: raw.tax_id.unwrap_or_default(),
            notes: raw.notes.unwrap_or_default(),
            status: ApplicationStatus::from_stored(raw.status.as_deref()),
            created_at: raw.created_at,
            updated_at: raw.updated_at,
        }
    }
}

impl Application {
    /// Decode and normalize a stored document.
    ///
    /// # Errors
    ///
    /// Returns an error only if the document is not a JSON object.
    pub fn from_document(document: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value::<RawApplication>(document).map(Self::from)
    }

    /// The plan as a known tier, if it is one.
    #[must_use]
    pub fn plan_tier(&self) -> Option<VendorPlan> {
        VendorPlan::from_stored(&self.plan)
    }
}

/// A contact message with every display field populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: ContactId,
    pub name: String,
    pub email: String,
    pub message: String,
    /// `None` when the sender picked no intent or an unknown one.
    pub intent: Option<ContactIntent>,
    pub status: ContactStatus,
    pub notes: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<RawContact> for Contact {
    fn from(raw: RawContact) -> Self {
        Self {
            id: ContactId::new(raw.id),
            name: raw.name.unwrap_or_default(),
            email: raw.email.unwrap_or_default(),
            message: raw.message.unwrap_or_default(),
            intent: ContactIntent::from_stored(raw.intent.as_deref()),
            status: ContactStatus::from_stored(raw.status.as_deref()),
            notes: raw.notes.unwrap_or_default(),
            created_at: raw.created_at,
            updated_at: raw.updated_at,
        }
    }
}

impl Contact {
    /// Decode and normalize a stored document.
    ///
    /// # Errors
    ///
    /// Returns an error only if the document is not a JSON object.
    pub fn from_document(document: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value::<RawContact>(document).map(Self::from)
    }

    /// The sender's name, or "Anonymous".
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            ANONYMOUS
        } else {
            &self.name
        }
    }

    /// Intent used for the badge: unset intents show as customers.
    #[must_use]
    pub fn display_intent(&self) -> ContactIntent {
        self.intent.unwrap_or(ContactIntent::DISPLAY_DEFAULT)
    }

    /// First 50 characters of the message, with an ellipsis when cut.
    #[must_use]
    pub fn message_preview(&self) -> String {
        if self.message.is_empty() {
            return "No message".to_owned();
        }
        let mut chars = self.message.chars();
        let head: String = chars.by_ref().take(MESSAGE_PREVIEW_CHARS).collect();
        if chars.next().is_some() {
            format!("{head}...")
        } else {
            head
        }
    }
}

// =============================================================================
// Write-back
// =============================================================================

/// The only fields the dashboard writes back to a record.
///
/// The server-assigned update timestamp is added by the store client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange<S> {
    pub status: S,
    /// `None` leaves the stored notes untouched.
    pub notes: Option<String>,
}

impl<S: std::fmt::Display> StatusChange<S> {
    /// Change only the status.
    pub const fn status_only(status: S) -> Self {
        Self {
            status,
            notes: None,
        }
    }

    /// Change the status and replace the notes.
    pub fn with_notes(status: S, notes: impl Into<String>) -> Self {
        Self {
            status,
            notes: Some(notes.into()),
        }
    }

    /// The partial document to send to the store.
    #[must_use]
    pub fn to_fields(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert(fields::STATUS.to_owned(), Value::String(self.status.to_string()));
        if let Some(notes) = &self.notes {
            map.insert(fields::NOTES.to_owned(), Value::String(notes.clone()));
        }
        map
    }
}
