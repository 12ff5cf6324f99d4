//! Platform settings load and save.
//!
//! The settings singleton lives at `settings/platform`. A missing document
//! reads as the defaults and stays missing until the first save.

use serde_json::Value;
use thiserror::Error;
use tracing::instrument;

use saasbay_core::{PlatformSettings, SettingsError};

use crate::store::{Collection, RecordStore, SETTINGS_DOC_ID, StoreError};

/// Errors saving settings.
#[derive(Debug, Error)]
pub enum SaveSettingsError {
    /// The submitted values are out of range.
    #[error(transparent)]
    Invalid(#[from] SettingsError),

    /// The settings could not be encoded.
    #[error("failed to encode settings: {0}")]
    Encode(#[from] serde_json::Error),

    /// The write failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Settings access service.
pub struct SettingsService<'a> {
    store: &'a dyn RecordStore,
}

impl<'a> SettingsService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn RecordStore) -> Self {
        Self { store }
    }

    /// The effective settings: stored values over the defaults.
    ///
    /// # Errors
    ///
    /// Returns the store error if the read fails or the document is not an
    /// object.
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<PlatformSettings, StoreError> {
        let document = self
            .store
            .get(Collection::Settings, SETTINGS_DOC_ID)
            .await?;
        if document.is_none() {
            tracing::debug!("No settings document, using defaults");
        }
        Ok(PlatformSettings::from_document(document.map(Value::Object))?)
    }

    /// Validate and merge `settings` into the stored document.
    ///
    /// # Errors
    ///
    /// Returns [`SaveSettingsError::Invalid`] without writing if validation
    /// fails, otherwise the encode or store error.
    #[instrument(skip(self, settings))]
    pub async fn save(&self, settings: &PlatformSettings) -> Result<(), SaveSettingsError> {
        settings.validate()?;
        let fields = settings.to_document()?;
        self.store
            .upsert_merge(Collection::Settings, SETTINGS_DOC_ID, fields)
            .await?;
        tracing::info!(
            commission_rate = settings.commission_rate,
            "Platform settings saved"
        );
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_missing_document_reads_defaults_without_writing() {
        let store = MemoryStore::new();
        let service = SettingsService::new(&store);
        let settings = service.load().await.unwrap();
        assert_eq!(settings, PlatformSettings::default());
        assert!(
            store
                .get(Collection::Settings, SETTINGS_DOC_ID)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_partial_document_is_merged_over_defaults() {
        let store = MemoryStore::new();
        store
            .insert(
                Collection::Settings,
                SETTINGS_DOC_ID,
                json!({"commissionRate": 20, "platformSettings": {"maintenanceMode": true}}),
            )
            .await;
        let settings = SettingsService::new(&store).load().await.unwrap();
        assert_eq!(settings.commission_rate, 20);
        assert!(settings.platform.maintenance_mode);
        assert_eq!(settings.platform.site_name, "SaaSBay");
    }

    #[tokio::test]
    async fn test_save_round_trips() {
        let store = MemoryStore::new();
        let service = SettingsService::new(&store);
        let mut settings = PlatformSettings::default();
        settings.commission_rate = 25;
        settings.email_notifications.weekly_reports = true;
        service.save(&settings).await.unwrap();

        let loaded = service.load().await.unwrap();
        assert_eq!(loaded.commission_rate, 25);
        assert!(loaded.email_notifications.weekly_reports);
    }

    #[tokio::test]
    async fn test_invalid_settings_are_not_written() {
        let store = MemoryStore::new();
        let mut settings = PlatformSettings::default();
        settings.platform.site_name = "   ".to_owned();
        let err = SettingsService::new(&store).save(&settings).await.unwrap_err();
        assert!(matches!(
            err,
            SaveSettingsError::Invalid(SettingsError::EmptySiteName)
        ));
        assert!(
            store
                .get(Collection::Settings, SETTINGS_DOC_ID)
                .await
                .unwrap()
                .is_none()
        );
    }
}
