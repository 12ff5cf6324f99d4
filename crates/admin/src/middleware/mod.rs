//! HTTP middleware stack for admin.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span with status and latency)
//! 3. Request ID (record in span, echo in response)
//! 4. Security headers (self-only CSP)
//! 5. Session layer (tower-sessions)
//! 6. Auth extractors on protected handlers

pub mod auth;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{
    AdminAuthRejection, LOGIN_PATH, OptionalAdminAuth, RequireAdminAuth, clear_current_admin,
    current_auth_session, set_current_admin,
};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::{create_session_layer, session_layer};
