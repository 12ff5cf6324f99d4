//! Application state shared across handlers.

use std::sync::Arc;

use crate::identity::IdentityGate;
use crate::services::{InFlight, RecordService, SettingsService};
use crate::store::RecordStore;

/// Application state shared across all handlers.
///
/// Holds the explicitly constructed backends; tests build it with the
/// in-memory store and the local identity gate.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    store: Arc<dyn RecordStore>,
    identity: Arc<dyn IdentityGate>,
    in_flight: InFlight,
}

impl AppState {
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>, identity: Arc<dyn IdentityGate>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                store,
                identity,
                in_flight: InFlight::new(),
            }),
        }
    }

    #[must_use]
    pub fn store(&self) -> &dyn RecordStore {
        self.inner.store.as_ref()
    }

    #[must_use]
    pub fn identity(&self) -> &dyn IdentityGate {
        self.inner.identity.as_ref()
    }

    #[must_use]
    pub fn in_flight(&self) -> &InFlight {
        &self.inner.in_flight
    }

    /// Record access bound to this state's store.
    #[must_use]
    pub fn records(&self) -> RecordService<'_> {
        RecordService::new(self.store())
    }

    /// Settings access bound to this state's store.
    #[must_use]
    pub fn settings(&self) -> SettingsService<'_> {
        SettingsService::new(self.store())
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("in_flight", &self.inner.in_flight)
            .finish_non_exhaustive()
    }
}
