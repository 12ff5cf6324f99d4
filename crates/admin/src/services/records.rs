//! Vendor application and contact message access.
//!
//! Fetches raw documents from the record store and normalizes them into
//! `saasbay-core` records. Every write goes through [`StatusChange`], so only
//! status, notes and the server-assigned update time are ever sent back.

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::instrument;

use saasbay_core::metrics::Summary;
use saasbay_core::records::{StatusChange, fields};
use saasbay_core::{Application, ApplicationStatus, Contact, ContactStatus};

use crate::store::{Collection, Document, FieldFilter, OrderBy, RecordStore, StoreError};

/// Record access service.
///
/// Borrows the store for the duration of a request.
pub struct RecordService<'a> {
    store: &'a dyn RecordStore,
}

fn decode_all<T>(
    docs: Vec<Document>,
    decode: fn(Value) -> Result<T, serde_json::Error>,
) -> Result<Vec<T>, StoreError> {
    docs.into_iter()
        .map(|doc| decode(Value::Object(doc)).map_err(StoreError::from))
        .collect()
}

impl<'a> RecordService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn RecordStore) -> Self {
        Self { store }
    }

    // =========================================================================
    // Vendor applications
    // =========================================================================

    /// Every application, newest first.
    ///
    /// # Errors
    ///
    /// Returns the store error if the query fails.
    #[instrument(skip(self))]
    pub async fn applications(&self) -> Result<Vec<Application>, StoreError> {
        let docs = self
            .store
            .list(Collection::Applications, OrderBy::NEWEST_FIRST)
            .await?;
        decode_all(docs, Application::from_document)
    }

    /// Applications stored with exactly `status`, newest first.
    ///
    /// Documents without a status field are not returned even though they
    /// display as pending.
    ///
    /// # Errors
    ///
    /// Returns the store error if the query fails.
    #[instrument(skip(self))]
    pub async fn applications_with_status(
        &self,
        status: ApplicationStatus,
    ) -> Result<Vec<Application>, StoreError> {
        let filter = FieldFilter::Equals(fields::STATUS, Value::String(status.to_string()));
        let docs = self
            .store
            .list_where(Collection::Applications, filter, OrderBy::NEWEST_FIRST)
            .await?;
        decode_all(docs, Application::from_document)
    }

    /// Applications created at or after `since`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns the store error if the query fails.
    #[instrument(skip(self))]
    pub async fn applications_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<Application>, StoreError> {
        let docs = self
            .store
            .list_where(
                Collection::Applications,
                FieldFilter::created_since(since),
                OrderBy::OLDEST_FIRST,
            )
            .await?;
        decode_all(docs, Application::from_document)
    }

    /// One application, if it exists.
    ///
    /// # Errors
    ///
    /// Returns the store error if the read fails.
    #[instrument(skip(self))]
    pub async fn application(&self, id: &str) -> Result<Option<Application>, StoreError> {
        self.store
            .get(Collection::Applications, id)
            .await?
            .map(|doc| Application::from_document(Value::Object(doc)).map_err(StoreError::from))
            .transpose()
    }

    /// Write a new status (and optionally notes) to an application.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the application was deleted
    /// meanwhile, or the store error if the write fails.
    #[instrument(skip(self, change), fields(status = %change.status))]
    pub async fn update_application(
        &self,
        id: &str,
        change: &StatusChange<ApplicationStatus>,
    ) -> Result<(), StoreError> {
        self.store
            .update(Collection::Applications, id, change.to_fields())
            .await?;
        tracing::info!("Application status updated");
        Ok(())
    }

    /// Delete an application.
    ///
    /// # Errors
    ///
    /// Returns the store error if the delete fails.
    #[instrument(skip(self))]
    pub async fn delete_application(&self, id: &str) -> Result<(), StoreError> {
        self.store.delete(Collection::Applications, id).await?;
        tracing::info!("Application deleted");
        Ok(())
    }

    // =========================================================================
    // Contact messages
    // =========================================================================

    /// Every contact message, newest first.
    ///
    /// # Errors
    ///
    /// Returns the store error if the query fails.
    #[instrument(skip(self))]
    pub async fn contacts(&self) -> Result<Vec<Contact>, StoreError> {
        let docs = self
            .store
            .list(Collection::Contacts, OrderBy::NEWEST_FIRST)
            .await?;
        decode_all(docs, Contact::from_document)
    }

    /// Contact messages created at or after `since`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns the store error if the query fails.
    #[instrument(skip(self))]
    pub async fn contacts_since(&self, since: DateTime<Utc>) -> Result<Vec<Contact>, StoreError> {
        let docs = self
            .store
            .list_where(
                Collection::Contacts,
                FieldFilter::created_since(since),
                OrderBy::OLDEST_FIRST,
            )
            .await?;
        decode_all(docs, Contact::from_document)
    }

    /// One contact message, if it exists.
    ///
    /// # Errors
    ///
    /// Returns the store error if the read fails.
    #[instrument(skip(self))]
    pub async fn contact(&self, id: &str) -> Result<Option<Contact>, StoreError> {
        self.store
            .get(Collection::Contacts, id)
            .await?
            .map(|doc| Contact::from_document(Value::Object(doc)).map_err(StoreError::from))
            .transpose()
    }

    /// Write a new status (and optionally notes) to a contact message.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the message was deleted meanwhile,
    /// or the store error if the write fails.
    #[instrument(skip(self, change), fields(status = %change.status))]
    pub async fn update_contact(
        &self,
        id: &str,
        change: &StatusChange<ContactStatus>,
    ) -> Result<(), StoreError> {
        self.store
            .update(Collection::Contacts, id, change.to_fields())
            .await?;
        tracing::info!("Contact status updated");
        Ok(())
    }

    /// Delete a contact message.
    ///
    /// # Errors
    ///
    /// Returns the store error if the delete fails.
    #[instrument(skip(self))]
    pub async fn delete_contact(&self, id: &str) -> Result<(), StoreError> {
        self.store.delete(Collection::Contacts, id).await?;
        tracing::info!("Contact deleted");
        Ok(())
    }

    // =========================================================================
    // Summary
    // =========================================================================

    /// Dashboard summary counts over both collections.
    ///
    /// # Errors
    ///
    /// Returns the first store error if either query fails.
    #[instrument(skip(self))]
    pub async fn summary(&self, now: DateTime<Utc>) -> Result<Summary, StoreError> {
        let (applications, contacts) = tokio::try_join!(self.applications(), self.contacts())?;
        Ok(Summary::compute(&applications, &contacts, now))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    use super::*;
    use crate::store::MemoryStore;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0).unwrap()
    }

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        let t = |days: i64| (now() - Duration::days(days)).to_rfc3339();
        store
            .insert(
                Collection::Applications,
                "a1",
                json!({"name": "Asha", "status": "pending", "createdAt": t(1)}),
            )
            .await;
        store
            .insert(
                Collection::Applications,
                "a2",
                json!({"name": "Bala", "status": "approved", "createdAt": t(3)}),
            )
            .await;
        store
            .insert(
                Collection::Applications,
                "a3",
                json!({"name": "Chitra", "status": "approved", "createdAt": t(40)}),
            )
            .await;
        store
            .insert(
                Collection::Contacts,
                "c1",
                json!({"email": "x@y.in", "status": "new", "createdAt": t(2)}),
            )
            .await;
        store
            .insert(
                Collection::Contacts,
                "c2",
                json!({"name": "Dev", "status": "responded", "createdAt": t(10)}),
            )
            .await;
        store
    }

    #[tokio::test]
    async fn test_applications_newest_first_and_normalized() {
        let store = seeded().await;
        let service = RecordService::new(&store);
        let apps = service.applications().await.unwrap();
        let ids: Vec<_> = apps.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, ["a1", "a2", "a3"]);
        assert_eq!(apps[0].company_name, "");
    }

    #[tokio::test]
    async fn test_applications_with_status() {
        let store = seeded().await;
        let service = RecordService::new(&store);
        let approved = service
            .applications_with_status(ApplicationStatus::Approved)
            .await
            .unwrap();
        assert_eq!(approved.len(), 2);
        assert!(approved.iter().all(|a| a.status == ApplicationStatus::Approved));
    }

    #[tokio::test]
    async fn test_since_queries_are_oldest_first() {
        let store = seeded().await;
        let service = RecordService::new(&store);
        let apps = service
            .applications_since(now() - Duration::days(7))
            .await
            .unwrap();
        let ids: Vec<_> = apps.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, ["a2", "a1"]);

        let contacts = service
            .contacts_since(now() - Duration::days(7))
            .await
            .unwrap();
        assert_eq!(contacts.len(), 1);
    }

    #[tokio::test]
    async fn test_summary_matches_collections() {
        let store = seeded().await;
        let summary = RecordService::new(&store).summary(now()).await.unwrap();
        assert_eq!(summary.total_applications, 3);
        assert_eq!(summary.approved_applications, 2);
        assert_eq!(summary.conversion_rate, 67);
        assert_eq!(summary.this_week_applications, 2);
        assert_eq!(summary.total_contacts, 2);
        assert_eq!(summary.new_contacts, 1);
    }

    #[tokio::test]
    async fn test_status_change_keeps_notes_when_omitted() {
        let store = MemoryStore::new();
        store
            .insert(
                Collection::Contacts,
                "c1",
                json!({"status": "new", "notes": "called back"}),
            )
            .await;
        let service = RecordService::new(&store);

        service
            .update_contact("c1", &StatusChange::status_only(ContactStatus::Closed))
            .await
            .unwrap();
        let contact = service.contact("c1").await.unwrap().unwrap();
        assert_eq!(contact.status, ContactStatus::Closed);
        assert_eq!(contact.notes, "called back");
        assert!(contact.updated_at.is_some());

        service
            .update_contact("c1", &StatusChange::with_notes(ContactStatus::New, ""))
            .await
            .unwrap();
        let contact = service.contact("c1").await.unwrap().unwrap();
        assert_eq!(contact.notes, "");
    }

    #[tokio::test]
    async fn test_update_missing_record_is_not_found() {
        let store = MemoryStore::new();
        let err = RecordService::new(&store)
            .update_application(
                "ghost",
                &StatusChange::status_only(ApplicationStatus::Approved),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_then_get_is_none() {
        let store = seeded().await;
        let service = RecordService::new(&store);
        service.delete_application("a2").await.unwrap();
        assert!(service.application("a2").await.unwrap().is_none());
        assert_eq!(service.applications().await.unwrap().len(), 2);
    }
}
