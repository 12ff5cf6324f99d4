//! Identity Toolkit (Firebase Authentication) REST client.
//!
//! Email/password sign-in goes through `accounts:signInWithPassword`; the
//! refresh token is exchanged at the Secure Token service. Both hosts can be
//! redirected to the Auth emulator.

use chrono::{Duration, Utc};
use futures::future::BoxFuture;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use saasbay_core::Email;

use super::{AuthSession, IdentityError, IdentityGate, SessionWatch};
use crate::config::ToolkitConfig;

const IDENTITY_TOOLKIT_HOST: &str = "https://identitytoolkit.googleapis.com";
const SECURE_TOKEN_HOST: &str = "https://securetoken.googleapis.com";

/// Token lifetime assumed when the service omits `expiresIn`.
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

/// Identity Toolkit client.
pub struct ToolkitIdentity {
    client: reqwest::Client,
    api_key: SecretString,
    sign_in_url: String,
    refresh_url: String,
    watch: SessionWatch,
}

impl std::fmt::Debug for ToolkitIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolkitIdentity")
            .field("sign_in_url", &self.sign_in_url)
            .field("refresh_url", &self.refresh_url)
            .field("api_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignInRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    email: String,
    #[serde(default)]
    display_name: Option<String>,
    id_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<String>,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    grant_type: &'static str,
    refresh_token: &'a str,
}

#[derive(Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<String>,
    user_id: String,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    error: ErrorDetail,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
}

fn expires_in(raw: Option<&str>) -> Duration {
    Duration::seconds(
        raw.and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_EXPIRES_IN_SECS),
    )
}

/// Map an Identity Toolkit error code to an error for the login form.
///
/// Codes look like `INVALID_PASSWORD` or `TOO_MANY_ATTEMPTS_TRY_LATER : detail`.
fn classify_error(code: &str) -> IdentityError {
    let code = code.split(" : ").next().unwrap_or(code).trim();
    match code {
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" | "INVALID_EMAIL" => {
            IdentityError::InvalidCredentials("Invalid email or password".to_owned())
        }
        "USER_DISABLED" => {
            IdentityError::InvalidCredentials("This account has been disabled".to_owned())
        }
        "TOO_MANY_ATTEMPTS_TRY_LATER" => IdentityError::InvalidCredentials(
            "Too many failed attempts. Try again later".to_owned(),
        ),
        "TOKEN_EXPIRED" | "INVALID_REFRESH_TOKEN" | "USER_NOT_FOUND" => IdentityError::Expired,
        other => IdentityError::Rejected(other.to_owned()),
    }
}

impl ToolkitIdentity {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &ToolkitConfig) -> Result<Self, IdentityError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        let (toolkit_host, token_host) = match &config.emulator_host {
            Some(host) => (
                format!("http://{host}/identitytoolkit.googleapis.com"),
                format!("http://{host}/securetoken.googleapis.com"),
            ),
            None => (
                IDENTITY_TOOLKIT_HOST.to_owned(),
                SECURE_TOKEN_HOST.to_owned(),
            ),
        };

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            sign_in_url: format!("{toolkit_host}/v1/accounts:signInWithPassword"),
            refresh_url: format!("{token_host}/v1/token"),
            watch: SessionWatch::new(),
        })
    }

    async fn error_from(response: reqwest::Response) -> IdentityError {
        let status = response.status();
        let body: ErrorResponse = response.json().await.unwrap_or_default();
        if body.error.message.is_empty() {
            IdentityError::Rejected(format!("HTTP {status}"))
        } else {
            classify_error(&body.error.message)
        }
    }

    #[instrument(skip(self, password), fields(email = %email))]
    async fn password_sign_in(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthSession, IdentityError> {
        let now = Utc::now();
        let response = self
            .client
            .post(&self.sign_in_url)
            .query(&[("key", self.api_key.expose_secret())])
            .json(&SignInRequest {
                email: email.as_str(),
                password: password.expose_secret(),
                return_secure_token: true,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let err = Self::error_from(response).await;
            tracing::warn!(error = %err, "Sign-in refused");
            return Err(err);
        }

        let body: SignInResponse = response.json().await?;
        let session = AuthSession {
            uid: body.local_id,
            email: body.email,
            display_name: body.display_name.filter(|n| !n.is_empty()),
            id_token: body.id_token,
            refresh_token: body.refresh_token,
            expires_at: now + expires_in(body.expires_in.as_deref()),
        };
        tracing::info!(uid = %session.uid, "Operator signed in");
        self.watch.publish(Some(session.clone()));
        Ok(session)
    }

    #[instrument(skip(self, session), fields(uid = %session.uid))]
    async fn exchange_refresh_token(
        &self,
        session: &AuthSession,
    ) -> Result<AuthSession, IdentityError> {
        let now = Utc::now();
        let response = self
            .client
            .post(&self.refresh_url)
            .query(&[("key", self.api_key.expose_secret())])
            .form(&RefreshRequest {
                grant_type: "refresh_token",
                refresh_token: &session.refresh_token,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let body: RefreshResponse = response.json().await?;
        let refreshed = AuthSession {
            uid: body.user_id,
            id_token: body.id_token,
            refresh_token: body.refresh_token,
            expires_at: now + expires_in(body.expires_in.as_deref()),
            ..session.clone()
        };
        tracing::debug!("ID token refreshed");
        self.watch.publish(Some(refreshed.clone()));
        Ok(refreshed)
    }
}

impl IdentityGate for ToolkitIdentity {
    fn sign_in<'a>(
        &'a self,
        email: &'a Email,
        password: &'a SecretString,
    ) -> BoxFuture<'a, Result<AuthSession, IdentityError>> {
        Box::pin(self.password_sign_in(email, password))
    }

    fn sign_out<'a>(&'a self, session: &'a AuthSession) -> BoxFuture<'a, Result<(), IdentityError>> {
        // ID tokens are stateless; signing out only forgets them.
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
        Box::pin(self.exchange_refresh_token(session))
    }

    fn watch(&self) -> SessionWatch {
        self.watch.clone()
    }
}
