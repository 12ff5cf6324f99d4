//! SaaSBay Core - Shared types and dashboard metrics.
//!
//! This crate provides the types used across the SaaSBay admin components:
//! - `admin` - Server-rendered administration dashboard
//! - `cli` - Command-line tools for migrations and reporting
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! database access, no HTTP clients. Every function that depends on the
//! wall clock takes "now" as a parameter.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for document IDs, emails, and status enums
//! - [`records`] - Vendor applications and contact messages, with normalization
//! - [`settings`] - Platform settings singleton and its defaults
//! - [`metrics`] - Filtering, bucketing, time series, and summary counts

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod metrics;
pub mod records;
pub mod settings;
pub mod types;

pub use records::{Application, Contact, RawApplication, RawContact};
pub use settings::{EmailNotifications, PlatformFlags, PlatformSettings, SettingsError};
pub use types::*;
