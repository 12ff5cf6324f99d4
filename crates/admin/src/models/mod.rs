//! Session-held models for the admin.
//!
//! Records themselves are defined in `saasbay-core`; this module only holds
//! what the admin keeps in the server session between requests.

pub mod session;

pub use session::{CurrentAdmin, keys as session_keys};
