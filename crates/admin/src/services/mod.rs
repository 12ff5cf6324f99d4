//! Business logic services for admin.
//!
//! # Services
//!
//! - `records` - Vendor applications and contact messages
//! - `settings` - Platform settings singleton
//! - `in_flight` - One mutation per record at a time

pub mod in_flight;
pub mod records;
pub mod settings;

pub use in_flight::{InFlight, InFlightGuard};
pub use records::RecordService;
pub use settings::{SaveSettingsError, SettingsService};
