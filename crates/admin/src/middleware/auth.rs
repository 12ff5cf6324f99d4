//! Authentication extractors for admin.
//!
//! The route gate is binary: a request either carries a live identity
//! session or it does not. There are no roles.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use tower_sessions::Session;

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::identity::AuthSession;
use crate::models::{CurrentAdmin, session_keys};
use crate::state::AppState;

/// Public login screen.
pub const LOGIN_PATH: &str = "/";

/// Refresh the identity session when it has less than this many seconds left.
const REFRESH_WINDOW_SECS: i64 = 5 * 60;

/// Extractor that requires a signed-in operator.
///
/// If nobody is signed in (or the identity session has expired), returns a
/// redirect to the login page for HTML requests, or 401 Unauthorized for
/// API requests.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAdminAuth(admin): RequireAdminAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", admin.name)
/// }
/// ```
pub struct RequireAdminAuth(pub CurrentAdmin);

/// Error returned when authentication is required but nobody is signed in.
#[derive(Debug)]
pub enum AdminAuthRejection {
    /// Redirect to login page (for HTML requests).
    RedirectToLogin,
    /// Unauthorized response (for API requests).
    Unauthorized,
}

impl IntoResponse for AdminAuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to(LOGIN_PATH).into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

/// Read the signed-in operator, treating an expired identity session as
/// signed out.
///
/// Sessions close to expiry are refreshed through the identity gate; a
/// failed refresh is logged and the current token kept until it expires.
async fn live_admin(session: &Session, state: &AppState) -> Option<CurrentAdmin> {
    let admin: CurrentAdmin = session
        .get(session_keys::CURRENT_ADMIN)
        .await
        .ok()
        .flatten()?;
    let auth: AuthSession = session
        .get(session_keys::AUTH_SESSION)
        .await
        .ok()
        .flatten()?;

    let now = Utc::now();
    if auth.is_expired(now) {
        tracing::info!(uid = %auth.uid, "Identity session expired");
        if let Err(e) = clear_current_admin(session).await {
            tracing::warn!(error = %e, "Failed to clear expired session");
        }
        return None;
    }

    if auth.expires_within(now, REFRESH_WINDOW_SECS) {
        match state.identity().refresh(&auth).await {
            Ok(refreshed) => {
                if let Err(e) = session.insert(session_keys::AUTH_SESSION, &refreshed).await {
                    tracing::warn!(error = %e, "Failed to store refreshed identity session");
                }
            }
            Err(e) => tracing::warn!(error = %e, "Identity session refresh failed"),
        }
    }

    Some(admin)
}

impl FromRequestParts<AppState> for RequireAdminAuth {
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let is_api = parts.uri.path().starts_with("/api/");
        let rejection = || {
            if is_api {
                AdminAuthRejection::Unauthorized
            } else {
                AdminAuthRejection::RedirectToLogin
            }
        };

        // Set by SessionManagerLayer
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or(AdminAuthRejection::Unauthorized)?;

        let admin = live_admin(&session, state).await.ok_or_else(rejection)?;

        tracing::Span::current().record("admin_uid", admin.uid.as_str());
        set_sentry_user(&admin.uid, &admin.email);
        Ok(Self(admin))
    }
}

/// Extractor that optionally gets the signed-in operator.
///
/// Unlike `RequireAdminAuth`, this does not reject the request if nobody is
/// signed in.
pub struct OptionalAdminAuth(pub Option<CurrentAdmin>);

impl FromRequestParts<AppState> for OptionalAdminAuth {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let admin = match parts.extensions.get::<Session>().cloned() {
            Some(session) => live_admin(&session, state).await,
            None => None,
        };
        Ok(Self(admin))
    }
}

/// Store a freshly signed-in operator in the session.
///
/// The session ID is cycled first so a pre-login session cannot be fixated.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_admin(
    session: &Session,
    auth: &AuthSession,
) -> Result<CurrentAdmin, tower_sessions::session::Error> {
    let admin = CurrentAdmin::from(auth);
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_ADMIN, &admin).await?;
    session.insert(session_keys::AUTH_SESSION, auth).await?;
    set_sentry_user(&admin.uid, &admin.email);
    Ok(admin)
}

/// The stored identity session, if any.
pub async fn current_auth_session(session: &Session) -> Option<AuthSession> {
    session
        .get(session_keys::AUTH_SESSION)
        .await
        .ok()
        .flatten()
}

/// Clear the signed-in operator from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_admin(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
        .await?;
    session
        .remove::<AuthSession>(session_keys::AUTH_SESSION)
        .await?;
    clear_sentry_user();
    Ok(())
}
