//! Single-account identity gate for local development and tests.
//!
//! Accepts exactly one configured email/password pair and issues random
//! opaque tokens. Nothing leaves the process.

use chrono::{Duration, Utc};
use futures::future::BoxFuture;
use secrecy::{ExposeSecret, SecretString};

use saasbay_core::Email;

use super::{AuthSession, IdentityError, IdentityGate, SessionWatch};
use crate::config::LocalAdminConfig;

/// Lifetime of issued sessions.
const SESSION_LIFETIME_HOURS: i64 = 1;

/// Identity gate holding one operator account.
pub struct LocalIdentity {
    email: Email,
    password: SecretString,
    display_name: Option<String>,
    watch: SessionWatch,
}

impl std::fmt::Debug for LocalIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalIdentity")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl LocalIdentity {
    #[must_use]
    pub fn new(email: Email, password: SecretString) -> Self {
        Self {
            email,
            password,
            display_name: None,
            watch: SessionWatch::new(),
        }
    }

    #[must_use]
    pub fn from_config(config: &LocalAdminConfig) -> Self {
        Self::new(config.email.clone(), config.password.clone())
    }

    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    fn uid(&self) -> String {
        format!("local:{}", self.email)
    }

    fn issue(&self) -> AuthSession {
        AuthSession {
            uid: self.uid(),
            email: self.email.to_string(),
            display_name: self.display_name.clone(),
            id_token: uuid::Uuid::new_v4().simple().to_string(),
            refresh_token: uuid::Uuid::new_v4().simple().to_string(),
            expires_at: Utc::now() + Duration::hours(SESSION_LIFETIME_HOURS),
        }
    }
}

/// Compare two byte strings without exiting early on the first mismatch.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

impl IdentityGate for LocalIdentity {
    fn sign_in<'a>(
        &'a self,
        email: &'a Email,
        password: &'a SecretString,
    ) -> BoxFuture<'a, Result<AuthSession, IdentityError>> {
        Box::pin(async move {
            let email_ok = email.as_str().eq_ignore_ascii_case(self.email.as_str());
            let password_ok = constant_time_eq(
                password.expose_secret().as_bytes(),
                self.password.expose_secret().as_bytes(),
            );
            if !(email_ok && password_ok) {
                tracing::warn!(email = %email, "Local sign-in refused");
                return Err(IdentityError::InvalidCredentials(
                    "Invalid email or password".to_owned(),
                ));
            }
            let session = self.issue();
            tracing::info!(uid = %session.uid, "Operator signed in");
            self.watch.publish(Some(session.clone()));
            Ok(session)
        })
    }

    fn sign_out<'a>(&'a self, session: &'a AuthSession) -> BoxFuture<'a, Result<(), IdentityError>> {
        Box::pin(async move {
            tracing::info!(uid = %session.uid, "Operator signed out");
            self.watch.publish(None);
            Ok(())
        })
    }

    fn refresh<'a>(
        &'a self,
        session: &'a AuthSession,
    ) -> BoxFuture<'a, Result<AuthSession, IdentityError>> {
        Box::pin(async move {
            if session.uid != self.uid() {
                return Err(IdentityError::Expired);
            }
            let refreshed = self.issue();
            self.watch.publish(Some(refreshed.clone()));
            Ok(refreshed)
        })
    }

    fn watch(&self) -> SessionWatch {
        self.watch.clone()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn gate() -> LocalIdentity {
        LocalIdentity::new(
            Email::parse("ops@saasbay.in").unwrap(),
            SecretString::from("k7#Qm2!vR9xL"),
        )
    }

    #[tokio::test]
    async fn test_sign_in_success_publishes_session() {
        let gate = gate();
        let email = Email::parse("OPS@saasbay.in").unwrap();
        let session = gate
            .sign_in(&email, &SecretString::from("k7#Qm2!vR9xL"))
            .await
            .unwrap();
        assert_eq!(session.email, "ops@saasbay.in");
        assert!(!session.is_expired(Utc::now()));
        assert_eq!(gate.watch().current().map(|s| s.uid), Some(session.uid));
    }

    #[tokio::test]
    async fn test_sign_in_wrong_password() {
        let gate = gate();
        let email = Email::parse("ops@saasbay.in").unwrap();
        let err = gate
            .sign_in(&email, &SecretString::from("wrong"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid email or password");
        assert!(gate.watch().current().is_none());
    }

    #[tokio::test]
    async fn test_sign_out_and_refresh() {
        let gate = gate();
        let email = Email::parse("ops@saasbay.in").unwrap();
        let session = gate
            .sign_in(&email, &SecretString::from("k7#Qm2!vR9xL"))
            .await
            .unwrap();

        let refreshed = gate.refresh(&session).await.unwrap();
        assert_ne!(refreshed.id_token, session.id_token);

        gate.sign_out(&refreshed).await.unwrap();
        assert!(gate.watch().current().is_none());

        let mut foreign = session;
        foreign.uid = "someone-else".to_owned();
        assert!(matches!(
            gate.refresh(&foreign).await,
            Err(IdentityError::Expired)
        ));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"ab"));
    }
}
