//! Unified error handling for admin.

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

use saasbay_core::SettingsError;

use crate::identity::IdentityError;
use crate::services::SaveSettingsError;
use crate::store::StoreError;

/// Application-level error type for the admin panel.
#[derive(Debug, Error)]
pub enum AppError {
    /// Record store operation failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Identity service operation failed.
    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    /// Submitted settings are invalid.
    #[error("Invalid settings: {0}")]
    Settings(#[from] SettingsError),

    /// Another mutation for the same record is in flight.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<SaveSettingsError> for AppError {
    fn from(err: SaveSettingsError) -> Self {
        match err {
            SaveSettingsError::Invalid(e) => Self::Settings(e),
            SaveSettingsError::Store(e) => Self::Store(e),
            SaveSettingsError::Encode(e) => Self::Internal(e.to_string()),
        }
    }
}

impl From<tower_sessions::session::Error> for AppError {
    fn from(err: tower_sessions::session::Error) -> Self {
        Self::Internal(format!("session: {err}"))
    }
}

impl AppError {
    /// The HTTP status this error maps to.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Store(StoreError::NotFound { .. }) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Store(StoreError::Conflict(_)) | Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Store(_) | Self::Identity(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Settings(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Message safe to show to the operator.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Internal(_) => "Internal server error".to_string(),
            Self::Store(StoreError::NotFound { .. }) => "Record not found".to_string(),
            Self::Store(StoreError::Conflict(_)) => {
                "The record was changed by someone else. Refresh and try again.".to_string()
            }
            Self::Store(_) => "The record store could not be reached".to_string(),
            Self::Identity(_) => "The identity service could not be reached".to_string(),
            Self::Settings(e) => e.to_string(),
            _ => self.to_string(),
        }
    }

    /// Whether this error indicates a server-side fault worth reporting.
    #[must_use]
    pub fn is_server_fault(&self) -> bool {
        self.status().is_server_error()
    }

    /// Log the error, reporting server-side faults to Sentry.
    pub fn report(&self) {
        if self.is_server_fault() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        } else {
            tracing::warn!(error = %self, "Admin request rejected");
        }
    }
}

/// Static error page with a refresh link.
#[derive(Template)]
#[template(path = "error.html")]
struct ErrorPageTemplate {
    status: u16,
    reason: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.report();
        let status = self.status();
        let page = ErrorPageTemplate {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Error"),
            message: self.public_message(),
        };
        match page.render() {
            Ok(html) => (status, Html(html)).into_response(),
            Err(e) => {
                tracing::error!("Template render error: {e}");
                (status, self.public_message()).into_response()
            }
        }
    }
}

/// Set the Sentry user context from the signed-in operator.
pub fn set_sentry_user(uid: &str, email: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(uid.to_string()),
            email: Some(email.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Collection;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("application a1".to_string());
        assert_eq!(err.to_string(), "Not found: application a1");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Store(StoreError::NotFound {
                collection: Collection::Contacts,
                id: "c1".to_string(),
            })),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Conflict("busy".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Store(StoreError::Status {
                code: 503,
                message: "down".to_string(),
            })),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            get_status(AppError::Settings(SettingsError::EmptySiteName)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_public_message_hides_internals() {
        let err = AppError::Store(StoreError::Status {
            code: 500,
            message: "projects/saasbay secret detail".to_string(),
        });
        assert!(!err.public_message().contains("secret detail"));
        assert_eq!(
            AppError::Internal("db password wrong".to_string()).public_message(),
            "Internal server error"
        );
    }
}
