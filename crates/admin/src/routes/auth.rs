//! Authentication route handlers for admin.
//!
//! Email and password are forwarded to the identity service; the dashboard
//! never stores or checks passwords itself.

use askama::Template;
use axum::{
    Form, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use secrecy::SecretString;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use saasbay_core::Email;

use crate::error::AppError;
use crate::filters;
use crate::identity::IdentityError;
use crate::middleware::{
    LOGIN_PATH, OptionalAdminAuth, clear_current_admin, current_auth_session, set_current_admin,
};
use crate::state::AppState;

use super::render;

/// Where a signed-in operator lands.
pub const HOME_PATH: &str = "/admin";

/// Shown for any credential problem, so the form does not reveal which
/// part was wrong.
const INVALID_CREDENTIALS: &str = "Invalid email or password";

const SERVICE_UNAVAILABLE: &str = "Sign-in is unavailable right now. Try again shortly.";

/// Login page template.
#[derive(Template)]
#[template(path = "auth/login.html")]
struct LoginPageTemplate {
    email: String,
    error: Option<String>,
}

/// Login form.
#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl std::fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginForm")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(LOGIN_PATH, get(login_page))
        .route("/login", post(login))
        .route("/logout", post(logout))
}

/// Render the login page, or skip it when already signed in.
///
/// GET /
async fn login_page(OptionalAdminAuth(admin): OptionalAdminAuth) -> Result<Response, AppError> {
    if admin.is_some() {
        return Ok(Redirect::to(HOME_PATH).into_response());
    }
    let page = LoginPageTemplate {
        email: String::new(),
        error: None,
    };
    Ok(render(&page)?.into_response())
}

fn login_failed(status: StatusCode, email: String, message: &str) -> Result<Response, AppError> {
    let page = LoginPageTemplate {
        email,
        error: Some(message.to_owned()),
    };
    Ok((status, render(&page)?).into_response())
}

/// Sign in with email and password.
///
/// POST /login
#[instrument(skip(state, session, form), fields(email = %form.email))]
async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let Ok(email) = Email::parse(&form.email) else {
        return login_failed(StatusCode::UNAUTHORIZED, form.email, INVALID_CREDENTIALS);
    };
    let password = SecretString::from(form.password);

    match state.identity().sign_in(&email, &password).await {
        Ok(auth) => {
            let admin = set_current_admin(&session, &auth).await?;
            tracing::info!(uid = %admin.uid, "Operator signed in");
            Ok(Redirect::to(HOME_PATH).into_response())
        }
        Err(IdentityError::InvalidCredentials(message)) => {
            tracing::warn!("Sign-in rejected: {message}");
            login_failed(StatusCode::UNAUTHORIZED, form.email, &message)
        }
        Err(e @ (IdentityError::Rejected(_) | IdentityError::Expired)) => {
            tracing::warn!(error = %e, "Sign-in rejected");
            login_failed(StatusCode::UNAUTHORIZED, form.email, INVALID_CREDENTIALS)
        }
        Err(e @ IdentityError::Http(_)) => {
            AppError::from(e).report();
            login_failed(StatusCode::SERVICE_UNAVAILABLE, form.email, SERVICE_UNAVAILABLE)
        }
    }
}

/// Sign out and clear the session.
///
/// POST /logout
async fn logout(State(state): State<AppState>, session: Session) -> Redirect {
    if let Some(auth) = current_auth_session(&session).await
        && let Err(e) = state.identity().sign_out(&auth).await
    {
        tracing::warn!(error = %e, "Identity sign-out failed");
    }

    if let Err(e) = clear_current_admin(&session).await {
        tracing::error!(error = %e, "Failed to clear session");
    }
    if let Err(e) = session.flush().await {
        tracing::error!(error = %e, "Failed to flush session");
    }

    Redirect::to(LOGIN_PATH)
}
