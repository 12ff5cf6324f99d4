//! Push notification of identity session changes.
//!
//! A [`SessionWatch`] holds the latest session (or `None` when signed out).
//! Subscribers are called once with the current value as soon as they
//! subscribe, then again on every change. Dropping the returned
//! [`Subscription`] stops delivery.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::AuthSession;

/// Observable identity session state.
#[derive(Clone)]
pub struct SessionWatch {
    tx: Arc<watch::Sender<Option<AuthSession>>>,
}

impl Default for SessionWatch {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SessionWatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionWatch")
            .field("signed_in", &self.tx.borrow().is_some())
            .field("subscribers", &self.tx.receiver_count())
            .finish()
    }
}

impl SessionWatch {
    /// Create a watch in the signed-out state.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Record a session change and notify subscribers.
    pub fn publish(&self, session: Option<AuthSession>) {
        self.tx.send_replace(session);
    }

    /// The latest session.
    #[must_use]
    pub fn current(&self) -> Option<AuthSession> {
        self.tx.borrow().clone()
    }

    /// Call `callback` with the current session now and after every change.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(Option<&AuthSession>) + Send + Sync + 'static,
    {
        let mut rx = self.tx.subscribe();
        let current = rx.borrow_and_update().clone();
        callback(current.as_ref());

        let task = tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let session = rx.borrow_and_update().clone();
                callback(session.as_ref());
            }
        });
        Subscription { task }
    }
}

/// Handle to an active subscription. Unsubscribes on drop.
#[derive(Debug)]
pub struct Subscription {
    task: JoinHandle<()>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}
