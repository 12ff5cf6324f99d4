//! Operator sign-in, delegated to a hosted identity service.
//!
//! The dashboard never checks passwords itself. It forwards credentials to
//! an [`IdentityGate`] and keeps the returned [`AuthSession`] in the server
//! session. An expired identity session counts as signed out.
//!
//! # Implementations
//!
//! - [`ToolkitIdentity`] - Identity Toolkit REST (email/password accounts)
//! - [`LocalIdentity`] - one configured operator account, for local
//!   development and tests

pub mod local;
pub mod toolkit;
pub mod watch;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use saasbay_core::Email;

pub use local::LocalIdentity;
pub use toolkit::ToolkitIdentity;
pub use watch::{SessionWatch, Subscription};

/// Name shown for operators without a display name.
pub const DEFAULT_DISPLAY_NAME: &str = "Admin User";

/// A signed-in operator as reported by the identity service.
///
/// `Debug` redacts the tokens.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    /// Stable user ID assigned by the identity service.
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
    /// Short-lived ID token.
    pub id_token: String,
    /// Long-lived token used to obtain a fresh ID token.
    pub refresh_token: String,
    /// When `id_token` stops being accepted.
    pub expires_at: DateTime<Utc>,
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("uid", &self.uid)
            .field("email", &self.email)
            .field("display_name", &self.display_name)
            .field("id_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl AuthSession {
    /// Whether the ID token has expired at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Whether the ID token expires within `seconds` of `now`.
    #[must_use]
    pub fn expires_within(&self, now: DateTime<Utc>, seconds: i64) -> bool {
        now + chrono::Duration::seconds(seconds) >= self.expires_at
    }

    /// Display name, or "Admin User".
    #[must_use]
    pub fn name(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(DEFAULT_DISPLAY_NAME)
    }
}

/// Errors from the identity service.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Wrong email or password. The message is safe to show on the form.
    #[error("{0}")]
    InvalidCredentials(String),

    /// The request could not be sent or the response not read.
    #[error("identity service unreachable: {0}")]
    Http(#[from] reqwest::Error),

    /// The service refused the request for another reason.
    #[error("identity service rejected the request: {0}")]
    Rejected(String),

    /// The session can no longer be refreshed.
    #[error("session expired")]
    Expired,
}

/// Sign-in and session lifecycle.
pub trait IdentityGate: Send + Sync {
    /// Exchange credentials for a session.
    fn sign_in<'a>(
        &'a self,
        email: &'a Email,
        password: &'a SecretString,
    ) -> BoxFuture<'a, Result<AuthSession, IdentityError>>;

    /// End a session.
    fn sign_out<'a>(&'a self, session: &'a AuthSession) -> BoxFuture<'a, Result<(), IdentityError>>;

    /// Exchange the refresh token for a fresh ID token.
    fn refresh<'a>(
        &'a self,
        session: &'a AuthSession,
    ) -> BoxFuture<'a, Result<AuthSession, IdentityError>>;

    /// Observable of the most recent session change.
    fn watch(&self) -> SessionWatch;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn session() -> AuthSession {
        AuthSession {
            uid: "u1".to_owned(),
            email: "ops@saasbay.in".to_owned(),
            display_name: None,
            id_token: "id-token-value".to_owned(),
            refresh_token: "refresh-token-value".to_owned(),
            expires_at: Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_expiry() {
        let s = session();
        assert!(!s.is_expired(Utc.with_ymd_and_hms(2026, 1, 1, 11, 59, 59).unwrap()));
        assert!(s.is_expired(Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap()));
        assert!(s.expires_within(Utc.with_ymd_and_hms(2026, 1, 1, 11, 59, 30).unwrap(), 60));
    }

    #[test]
    fn test_default_name() {
        let mut s = session();
        assert_eq!(s.name(), DEFAULT_DISPLAY_NAME);
        s.display_name = Some("Priya".to_owned());
        assert_eq!(s.name(), "Priya");
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let debug = format!("{:?}", session());
        assert!(debug.contains("ops@saasbay.in"));
        assert!(!debug.contains("id-token-value"));
        assert!(!debug.contains("refresh-token-value"));
    }
}
