//! Platform settings singleton.
//!
//! Stored as one document (`settings/platform`). When the document does not
//! exist, [`PlatformSettings::default`] is shown; it is written only on the
//! first save.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::records::lenient_string;
use crate::types::VendorPlan;

/// Highest commission percentage accepted.
pub const MAX_COMMISSION_RATE: u8 = 100;

/// Validation errors for settings submitted by an operator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    /// Commission is not an integer percentage.
    #[error("commission rate must be a whole number between 0 and {MAX_COMMISSION_RATE}")]
    InvalidCommission(String),

    /// Commission is a number but outside 0-100.
    #[error("commission rate must be between 0 and {MAX_COMMISSION_RATE}, got {0}")]
    CommissionOutOfRange(i64),

    /// Default plan is not one of the offered tiers.
    #[error("unknown vendor plan: {0}")]
    UnknownPlan(String),

    /// Site name is blank.
    #[error("site name is required")]
    EmptySiteName,
}

/// Which events send an email to the operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailNotifications {
    pub new_applications: bool,
    pub new_contacts: bool,
    pub status_updates: bool,
    pub weekly_reports: bool,
}

impl Default for EmailNotifications {
    fn default() -> Self {
        Self {
            new_applications: true,
            new_contacts: true,
            status_updates: true,
            weekly_reports: false,
        }
    }
}

/// Site-wide switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformFlags {
    pub site_name: String,
    pub maintenance_mode: bool,
    pub allow_registrations: bool,
    pub require_approval: bool,
}

impl Default for PlatformFlags {
    fn default() -> Self {
        Self {
            site_name: "SaaSBay".to_owned(),
            maintenance_mode: false,
            allow_registrations: true,
            require_approval: true,
        }
    }
}

/// The platform settings document.
///
/// Missing or unusable fields fall back to their defaults, so a partially
/// written document still loads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformSettings {
    /// Percentage taken from each vendor sale, 0-100.
    pub commission_rate: u8,
    pub default_vendor_plan: VendorPlan,
    pub auto_approve_vendors: bool,
    pub email_notifications: EmailNotifications,
    #[serde(rename = "platformSettings")]
    pub platform: PlatformFlags,
}

impl Default for PlatformSettings {
    fn default() -> Self {
        Self {
            commission_rate: 15,
            default_vendor_plan: VendorPlan::Free,
            auto_approve_vendors: false,
            email_notifications: EmailNotifications::default(),
            platform: PlatformFlags::default(),
        }
    }
}

impl PlatformSettings {
    /// Decode a stored document, substituting the default when absent.
    ///
    /// Each field that is missing or unusable (a `null` commission, an
    /// unknown plan) takes its default on its own.
    ///
    /// # Errors
    ///
    /// Returns an error only if the document is not a JSON object.
    pub fn from_document(document: Option<Value>) -> Result<Self, serde_json::Error> {
        document.map_or_else(
            || Ok(Self::default()),
            |doc| serde_json::from_value::<RawSettings>(doc).map(Self::from),
        )
    }

    /// Parse a commission rate typed into the settings form.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] if the input is not an integer in 0-100.
    pub fn parse_commission(input: &str) -> Result<u8, SettingsError> {
        let trimmed = input.trim();
        let value: i64 = trimmed
            .parse()
            .map_err(|_| SettingsError::InvalidCommission(trimmed.to_owned()))?;
        u8::try_from(value)
            .ok()
            .filter(|rate| *rate <= MAX_COMMISSION_RATE)
            .ok_or(SettingsError::CommissionOutOfRange(value))
    }

    /// Parse a plan chosen in the settings form.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::UnknownPlan`] for anything but the four tiers.
    pub fn parse_plan(input: &str) -> Result<VendorPlan, SettingsError> {
        VendorPlan::from_stored(input).ok_or_else(|| SettingsError::UnknownPlan(input.to_owned()))
    }

    /// Check invariants before saving.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.commission_rate > MAX_COMMISSION_RATE {
            return Err(SettingsError::CommissionOutOfRange(i64::from(
                self.commission_rate,
            )));
        }
        if self.platform.site_name.trim().is_empty() {
            return Err(SettingsError::EmptySiteName);
        }
        Ok(())
    }

    /// The document to merge into the store.
    ///
    /// # Errors
    ///
    /// Serialization of this struct cannot fail in practice; the error is
    /// surfaced rather than unwrapped.
    pub fn to_document(&self) -> Result<serde_json::Map<String, serde_json::Value>, serde_json::Error> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => Ok(map),
            other => Err(serde::ser::Error::custom(format!(
                "settings serialized to non-object: {other}"
            ))),
        }
    }
}

// =============================================================================
// Raw document
// =============================================================================

/// The settings document exactly as stored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawSettings {
    #[serde(deserialize_with = "lenient_commission")]
    commission_rate: Option<u8>,
    #[serde(deserialize_with = "lenient_string")]
    default_vendor_plan: Option<String>,
    #[serde(deserialize_with = "lenient_bool")]
    auto_approve_vendors: Option<bool>,
    #[serde(deserialize_with = "lenient_object")]
    email_notifications: Option<RawEmailNotifications>,
    #[serde(deserialize_with = "lenient_object")]
    platform_settings: Option<RawPlatformFlags>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawEmailNotifications {
    #[serde(deserialize_with = "lenient_bool")]
    new_applications: Option<bool>,
    #[serde(deserialize_with = "lenient_bool")]
    new_contacts: Option<bool>,
    #[serde(deserialize_with = "lenient_bool")]
    status_updates: Option<bool>,
    #[serde(deserialize_with = "lenient_bool")]
    weekly_reports: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawPlatformFlags {
    #[serde(deserialize_with = "lenient_string")]
    site_name: Option<String>,
    #[serde(deserialize_with = "lenient_bool")]
    maintenance_mode: Option<bool>,
    #[serde(deserialize_with = "lenient_bool")]
    allow_registrations: Option<bool>,
    #[serde(deserialize_with = "lenient_bool")]
    require_approval: Option<bool>,
}

/// Integer percentages in 0-100, as a number or a numeric string.
fn lenient_commission<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n
            .as_i64()
            .and_then(|v| u8::try_from(v).ok())
            .filter(|rate| *rate <= MAX_COMMISSION_RATE),
        Some(Value::String(s)) => PlatformSettings::parse_commission(&s).ok(),
        _ => None,
    })
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?
        .as_ref()
        .and_then(Value::as_bool))
}

/// A nested map; anything that is not an object is treated as absent.
fn lenient_object<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(value @ Value::Object(_)) => serde_json::from_value(value).ok(),
        _ => None,
    })
}

impl From<RawSettings> for PlatformSettings {
    fn from(raw: RawSettings) -> Self {
        let defaults = Self::default();
        let notify = raw.email_notifications.unwrap_or_default();
        let flags = raw.platform_settings.unwrap_or_default();
        Self {
            commission_rate: raw.commission_rate.unwrap_or(defaults.commission_rate),
            default_vendor_plan: raw
                .default_vendor_plan
                .as_deref()
                .and_then(VendorPlan::from_stored)
                .unwrap_or(defaults.default_vendor_plan),
            auto_approve_vendors: raw
                .auto_approve_vendors
                .unwrap_or(defaults.auto_approve_vendors),
            email_notifications: EmailNotifications {
                new_applications: notify
                    .new_applications
                    .unwrap_or(defaults.email_notifications.new_applications),
                new_contacts: notify
                    .new_contacts
                    .unwrap_or(defaults.email_notifications.new_contacts),
                status_updates: notify
                    .status_updates
                    .unwrap_or(defaults.email_notifications.status_updates),
                weekly_reports: notify
                    .weekly_reports
                    .unwrap_or(defaults.email_notifications.weekly_reports),
            },
            platform: PlatformFlags {
                site_name: flags
                    .site_name
                    .filter(|name| !name.trim().is_empty())
                    .unwrap_or(defaults.platform.site_name),
                maintenance_mode: flags
                    .maintenance_mode
                    .unwrap_or(defaults.platform.maintenance_mode),
                allow_registrations: flags
                    .allow_registrations
                    .unwrap_or(defaults.platform.allow_registrations),
                require_approval: flags
                    .require_approval
                    .unwrap_or(defaults.platform.require_approval),
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_default_when_absent() {
        let settings = PlatformSettings::from_document(None).unwrap();
        assert_eq!(settings.commission_rate, 15);
        assert_eq!(settings.default_vendor_plan, VendorPlan::Free);
        assert!(!settings.auto_approve_vendors);
        assert!(settings.email_notifications.new_contacts);
        assert!(!settings.email_notifications.weekly_reports);
        assert_eq!(settings.platform.site_name, "SaaSBay");
        assert!(settings.platform.require_approval);
    }

    #[test]
    fn test_partial_document_fills_defaults() {
        let settings = PlatformSettings::from_document(Some(json!({
            "commissionRate": 20,
            "platformSettings": { "maintenanceMode": true },
        })))
        .unwrap();
        assert_eq!(settings.commission_rate, 20);
        assert!(settings.platform.maintenance_mode);
        assert_eq!(settings.platform.site_name, "SaaSBay");
    }

    #[test]
    fn test_null_commission_falls_back_to_default() {
        let settings = PlatformSettings::from_document(Some(json!({
            "commissionRate": null,
            "defaultVendorPlan": "free",
            "autoApproveVendors": true,
        })))
        .unwrap();
        assert_eq!(settings.commission_rate, 15);
        assert!(settings.auto_approve_vendors);

        let settings =
            PlatformSettings::from_document(Some(json!({ "commissionRate": 250 }))).unwrap();
        assert_eq!(settings.commission_rate, 15);

        let settings =
            PlatformSettings::from_document(Some(json!({ "commissionRate": "12" }))).unwrap();
        assert_eq!(settings.commission_rate, 12);
    }

    #[test]
    fn test_stored_plan_ignores_case() {
        let settings = PlatformSettings::from_document(Some(json!({
            "commissionRate": 12,
            "defaultVendorPlan": "Pro",
        })))
        .unwrap();
        assert_eq!(settings.commission_rate, 12);
        assert_eq!(settings.default_vendor_plan, VendorPlan::Pro);

        let settings =
            PlatformSettings::from_document(Some(json!({ "defaultVendorPlan": "gold" }))).unwrap();
        assert_eq!(settings.default_vendor_plan, VendorPlan::Free);
    }

    #[test]
    fn test_malformed_nested_maps_use_defaults() {
        let settings = PlatformSettings::from_document(Some(json!({
            "emailNotifications": "yes",
            "platformSettings": { "siteName": "", "maintenanceMode": "on" },
        })))
        .unwrap();
        assert_eq!(settings.email_notifications, EmailNotifications::default());
        assert_eq!(settings.platform, PlatformFlags::default());
    }

    #[test]
    fn test_non_object_document_is_an_error() {
        assert!(PlatformSettings::from_document(Some(json!("platform"))).is_err());
    }

    #[test]
    fn test_wire_names() {
        let doc = PlatformSettings::default().to_document().unwrap();
        assert_eq!(doc["defaultVendorPlan"], json!("free"));
        assert_eq!(doc["emailNotifications"]["newApplications"], json!(true));
        assert_eq!(doc["platformSettings"]["allowRegistrations"], json!(true));
        assert_eq!(doc["autoApproveVendors"], json!(false));
    }

    #[test]
    fn test_parse_commission() {
        assert_eq!(PlatformSettings::parse_commission(" 0 ").unwrap(), 0);
        assert_eq!(PlatformSettings::parse_commission("100").unwrap(), 100);
        assert_eq!(
            PlatformSettings::parse_commission("101"),
            Err(SettingsError::CommissionOutOfRange(101))
        );
        assert_eq!(
            PlatformSettings::parse_commission("-1"),
            Err(SettingsError::CommissionOutOfRange(-1))
        );
        assert!(matches!(
            PlatformSettings::parse_commission("12.5"),
            Err(SettingsError::InvalidCommission(_))
        ));
    }

    #[test]
    fn test_validate_site_name() {
        let mut settings = PlatformSettings::default();
        settings.platform.site_name = "  ".to_owned();
        assert_eq!(settings.validate(), Err(SettingsError::EmptySiteName));
    }

    #[test]
    fn test_parse_plan() {
        assert_eq!(PlatformSettings::parse_plan("Enterprise").unwrap(), VendorPlan::Enterprise);
        assert!(PlatformSettings::parse_plan("gold").is_err());
    }
}
