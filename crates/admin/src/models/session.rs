//! Session-related types for admin authentication.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use crate::identity::AuthSession;

/// Session-stored operator identity.
///
/// Minimal data stored in the session to identify the signed-in operator.
/// The identity service tokens are stored separately under
/// [`keys::AUTH_SESSION`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentAdmin {
    /// User ID assigned by the identity service.
    pub uid: String,
    /// Operator's email address.
    pub email: String,
    /// Display name ("Admin User" when the account has none).
    pub name: String,
}

impl From<&AuthSession> for CurrentAdmin {
    fn from(session: &AuthSession) -> Self {
        Self {
            uid: session.uid.clone(),
            email: session.email.clone(),
            name: session.name().to_owned(),
        }
    }
}

/// Session keys for admin authentication data.
pub mod keys {
    /// Key for storing the current signed-in operator.
    pub const CURRENT_ADMIN: &str = "current_admin";

    /// Key for the identity service session (tokens and expiry).
    pub const AUTH_SESSION: &str = "auth_session";
}
