//! Per-record mutation guard.
//!
//! At most one status change or delete may be in flight for a given record.
//! A second request for the same record is refused while the first holds
//! its [`InFlightGuard`].

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use crate::store::Collection;

/// Registry of records with a mutation in flight.
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    keys: Arc<Mutex<HashSet<String>>>,
}

impl InFlight {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `collection/id`, or `None` if it is already claimed.
    #[must_use]
    pub fn try_acquire(&self, collection: Collection, id: &str) -> Option<InFlightGuard> {
        let key = format!("{collection}/{id}");
        let inserted = self
            .keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.clone());
        inserted.then(|| InFlightGuard {
            keys: Arc::clone(&self.keys),
            key,
        })
    }
}

/// Releases its record when dropped.
#[derive(Debug)]
pub struct InFlightGuard {
    keys: Arc<Mutex<HashSet<String>>>,
    key: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_is_refused_until_release() {
        let registry = InFlight::new();
        let guard = registry.try_acquire(Collection::Applications, "a1").unwrap();
        assert!(registry.try_acquire(Collection::Applications, "a1").is_none());

        drop(guard);
        assert!(registry.try_acquire(Collection::Applications, "a1").is_some());
    }

    #[test]
    fn test_keys_are_scoped_by_collection() {
        let registry = InFlight::new();
        let _a = registry.try_acquire(Collection::Applications, "x").unwrap();
        assert!(registry.try_acquire(Collection::Contacts, "x").is_some());
    }
}
