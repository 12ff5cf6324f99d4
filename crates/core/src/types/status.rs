//! Enumerated values stored on records and settings.
//!
//! Every enum here is stored as a lowercase string in the record store and
//! rendered with a capitalized label in the dashboard.

use serde::{Deserialize, Serialize};

/// Error returned when a string is not one of an enum's stored values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: {value}")]
pub struct UnknownValue {
    /// Which enumeration was being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

/// Common surface of the stored enumerations, used for generic bucketing.
pub trait StoredEnum: Copy + Eq + 'static {
    /// Every value, in declaration order.
    const VALUES: &'static [Self];

    /// The lowercase stored value.
    fn key(self) -> &'static str;

    /// The capitalized display label.
    fn display_label(self) -> &'static str;
}

/// Define a string-backed enumeration.
///
/// Generates `ALL`, `as_str()`, `label()`, `Display`, `FromStr` and
/// [`StoredEnum`].
macro_rules! define_stored_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $( $(#[$vmeta:meta])* $variant:ident => ($stored:literal, $label:literal) ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every value, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The lowercase value stored in the record store.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $stored),+
                }
            }

            /// The capitalized label shown in tables and charts.
            #[must_use]
            pub const fn label(self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }
        }

        impl StoredEnum for $name {
            const VALUES: &'static [Self] = Self::ALL;

            fn key(self) -> &'static str {
                self.as_str()
            }

            fn display_label(self) -> &'static str {
                self.label()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = UnknownValue;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($stored => Ok(Self::$variant),)+
                    _ => Err(UnknownValue {
                        kind: $kind,
                        value: s.to_owned(),
                    }),
                }
            }
        }
    };
}

define_stored_enum! {
    /// Review state of a vendor application.
    #[derive(Default)]
    ApplicationStatus, "application status" {
        #[default]
        Pending => ("pending", "Pending"),
        Approved => ("approved", "Approved"),
        Rejected => ("rejected", "Rejected"),
        Onboarding => ("onboarding", "Onboarding"),
    }
}

define_stored_enum! {
    /// Handling state of a contact message.
    #[derive(Default)]
    ContactStatus, "contact status" {
        #[default]
        New => ("new", "New"),
        Responded => ("responded", "Responded"),
        Closed => ("closed", "Closed"),
    }
}

define_stored_enum! {
    /// Why a visitor got in touch.
    ContactIntent, "contact intent" {
        Customer => ("customer", "Customer"),
        Vendor => ("vendor", "Vendor"),
        Partner => ("partner", "Partner"),
        Support => ("support", "Support"),
    }
}

define_stored_enum! {
    /// Subscription plan offered to vendors.
    #[derive(Default)]
    VendorPlan, "vendor plan" {
        #[default]
        Free => ("free", "Free"),
        Basic => ("basic", "Basic"),
        Pro => ("pro", "Pro"),
        Enterprise => ("enterprise", "Enterprise"),
    }
}

impl ApplicationStatus {
    /// Normalize a stored value. Missing or unrecognized values are `Pending`.
    #[must_use]
    pub fn from_stored(value: Option<&str>) -> Self {
        value.and_then(|v| v.parse().ok()).unwrap_or(Self::Pending)
    }
}

impl ContactStatus {
    /// Normalize a stored value. Missing or unrecognized values are `New`.
    #[must_use]
    pub fn from_stored(value: Option<&str>) -> Self {
        value.and_then(|v| v.parse().ok()).unwrap_or(Self::New)
    }
}

impl ContactIntent {
    /// Intent shown for messages that did not state one.
    pub const DISPLAY_DEFAULT: Self = Self::Customer;

    /// Bucket label for messages without a recognized intent.
    pub const FALLBACK_KEY: &'static str = "other";

    /// Normalize a stored value. Missing or unrecognized values are `None`.
    #[must_use]
    pub fn from_stored(value: Option<&str>) -> Option<Self> {
        value.and_then(|v| v.parse().ok())
    }
}

impl VendorPlan {
    /// Normalize a free-text plan name, ignoring case and surrounding spaces.
    #[must_use]
    pub fn from_stored(value: &str) -> Option<Self> {
        value.trim().to_ascii_lowercase().parse().ok()
    }
}

/// A dropdown filter: either disabled ("all") or an exact value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice<T> {
    /// Filter disabled.
    All,
    /// Only records whose field equals this value.
    Only(T),
}

impl<T> Default for Choice<T> {
    fn default() -> Self {
        Self::All
    }
}

impl<T: Copy + PartialEq> Choice<T> {
    /// Whether a record value passes this filter.
    #[must_use]
    pub fn admits(&self, value: T) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => *wanted == value,
        }
    }

    /// Like [`Choice::admits`], for fields a record may leave unset.
    ///
    /// An unset field never matches an exact filter.
    #[must_use]
    pub fn admits_optional(&self, value: Option<T>) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => value == Some(*wanted),
        }
    }

    /// The selected value, if the filter is enabled.
    #[must_use]
    pub const fn selected(&self) -> Option<T> {
        match self {
            Self::All => None,
            Self::Only(value) => Some(*value),
        }
    }
}

impl<T: std::str::FromStr<Err = UnknownValue>> Choice<T> {
    /// Parse a query-string value. `None`, `""` and `"all"` disable the filter.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownValue`] if the input is neither "all" nor a stored value.
    pub fn parse(value: Option<&str>) -> Result<Self, UnknownValue> {
        match value.map(str::trim) {
            None | Some("" | "all") => Ok(Self::All),
            Some(v) => v.parse().map(Self::Only),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_application_status_from_stored_defaults_to_pending() {
        assert_eq!(ApplicationStatus::from_stored(None), ApplicationStatus::Pending);
        assert_eq!(
            ApplicationStatus::from_stored(Some("archived")),
            ApplicationStatus::Pending
        );
        assert_eq!(
            ApplicationStatus::from_stored(Some("onboarding")),
            ApplicationStatus::Onboarding
        );
    }

    #[test]
    fn test_contact_status_from_stored_defaults_to_new() {
        assert_eq!(ContactStatus::from_stored(None), ContactStatus::New);
        assert_eq!(ContactStatus::from_stored(Some("closed")), ContactStatus::Closed);
    }

    #[test]
    fn test_contact_intent_unset_when_unknown() {
        assert_eq!(ContactIntent::from_stored(Some("press")), None);
        assert_eq!(
            ContactIntent::from_stored(Some("partner")),
            Some(ContactIntent::Partner)
        );
    }

    #[test]
    fn test_vendor_plan_ignores_case() {
        assert_eq!(VendorPlan::from_stored(" Pro "), Some(VendorPlan::Pro));
        assert_eq!(VendorPlan::from_stored("platinum"), None);
    }

    #[test]
    fn test_defaults_match_normalization() {
        assert_eq!(ApplicationStatus::default(), ApplicationStatus::from_stored(None));
        assert_eq!(ContactStatus::default(), ContactStatus::from_stored(None));
        assert_eq!(VendorPlan::default(), VendorPlan::Free);
    }

    #[test]
    fn test_labels_and_display() {
        assert_eq!(ApplicationStatus::Onboarding.label(), "Onboarding");
        assert_eq!(ContactStatus::Responded.to_string(), "responded");
        assert_eq!(VendorPlan::ALL.len(), 4);
    }

    #[test]
    fn test_serde_uses_stored_values() {
        let json = serde_json::to_string(&ApplicationStatus::Approved).unwrap();
        assert_eq!(json, "\"approved\"");
        let intent: ContactIntent = serde_json::from_str("\"support\"").unwrap();
        assert_eq!(intent, ContactIntent::Support);
    }

    #[test]
    fn test_choice_parse() {
        assert_eq!(Choice::<ContactStatus>::parse(None).unwrap(), Choice::All);
        assert_eq!(Choice::<ContactStatus>::parse(Some("all")).unwrap(), Choice::All);
        assert_eq!(Choice::<ContactStatus>::parse(Some("")).unwrap(), Choice::All);
        assert_eq!(
            Choice::<ContactStatus>::parse(Some("closed")).unwrap(),
            Choice::Only(ContactStatus::Closed)
        );
        let err = Choice::<ContactStatus>::parse(Some("spam")).unwrap_err();
        assert_eq!(err.to_string(), "invalid contact status: spam");
    }

    #[test]
    fn test_choice_admits_optional_never_matches_unset() {
        let only = Choice::Only(ContactIntent::Customer);
        assert!(!only.admits_optional(None));
        assert!(only.admits_optional(Some(ContactIntent::Customer)));
        assert!(Choice::<ContactIntent>::All.admits_optional(None));
    }
}
