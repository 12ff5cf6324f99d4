//! Grouped counts for the charts.

use serde::Serialize;

use crate::records::{Application, Contact};
use crate::types::{ContactIntent, StoredEnum, VendorPlan};

/// Bucket key for values outside the enumerated set.
pub const FALLBACK_KEY: &str = ContactIntent::FALLBACK_KEY;

const FALLBACK_LABEL: &str = "Other";

/// One bar of a grouped-count chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bucket {
    /// Stored value, or "other".
    pub key: &'static str,
    /// Capitalized chart label.
    pub label: &'static str,
    pub count: usize,
}

/// Count values per enumerated variant.
///
/// Variants appear in declaration order with zero counts kept. `None`
/// values are collected into a trailing "other" bucket, present only when
/// it is non-empty.
fn tally<T: StoredEnum>(values: impl IntoIterator<Item = Option<T>>) -> Vec<Bucket> {
    let mut counts = vec![0usize; T::VALUES.len()];
    let mut other = 0usize;
    for value in values {
        match value.and_then(|v| T::VALUES.iter().position(|known| *known == v)) {
            Some(idx) => counts[idx] += 1,
            None => other += 1,
        }
    }

    let mut buckets: Vec<Bucket> = T::VALUES
        .iter()
        .zip(counts)
        .map(|(value, count)| Bucket {
            key: value.key(),
            label: value.display_label(),
            count,
        })
        .collect();
    if other > 0 {
        buckets.push(Bucket {
            key: FALLBACK_KEY,
            label: FALLBACK_LABEL,
            count: other,
        });
    }
    buckets
}

#[must_use]
pub fn application_status_buckets(apps: &[Application]) -> Vec<Bucket> {
    tally(apps.iter().map(|a| Some(a.status)))
}

#[must_use]
pub fn contact_status_buckets(contacts: &[Contact]) -> Vec<Bucket> {
    tally(contacts.iter().map(|c| Some(c.status)))
}

/// Contacts per intent; unset intents land in "other".
#[must_use]
pub fn contact_intent_buckets(contacts: &[Contact]) -> Vec<Bucket> {
    tally(contacts.iter().map(|c| c.intent))
}

/// Applications per requested plan; free-text plans land in "other".
#[must_use]
pub fn plan_buckets(apps: &[Application]) -> Vec<Bucket> {
    tally::<VendorPlan>(apps.iter().map(Application::plan_tier))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn contact(intent: Option<&str>) -> Contact {
        Contact::from_document(json!({ "id": "c", "intent": intent })).unwrap()
    }

    fn app(status: Option<&str>, plan: &str) -> Application {
        Application::from_document(json!({ "id": "a", "status": status, "plan": plan })).unwrap()
    }

    #[test]
    fn test_status_buckets_keep_zero_counts_in_order() {
        let apps = vec![app(Some("approved"), "free"), app(None, "free")];
        let buckets = application_status_buckets(&apps);
        let keys: Vec<_> = buckets.iter().map(|b| (b.key, b.count)).collect();
        assert_eq!(
            keys,
            [("pending", 1), ("approved", 1), ("rejected", 0), ("onboarding", 0)]
        );
        assert_eq!(buckets[1].label, "Approved");
    }

    #[test]
    fn test_intent_fallback_only_when_non_empty() {
        let with_other = contact_intent_buckets(&[contact(Some("vendor")), contact(None)]);
        let last = with_other.last().unwrap();
        assert_eq!((last.key, last.label, last.count), ("other", "Other", 1));

        let without = contact_intent_buckets(&[contact(Some("support"))]);
        assert!(without.iter().all(|b| b.key != FALLBACK_KEY));
        assert_eq!(without.len(), ContactIntent::ALL.len());
    }

    #[test]
    fn test_bucket_counts_sum_to_input() {
        let contacts = vec![contact(Some("customer")), contact(Some("press")), contact(None)];
        let total: usize = contact_intent_buckets(&contacts).iter().map(|b| b.count).sum();
        assert_eq!(total, contacts.len());
    }

    #[test]
    fn test_plan_buckets() {
        let apps = vec![
            app(None, "Pro"),
            app(None, "pro"),
            app(None, "enterprise"),
            app(None, "custom deal"),
        ];
        let buckets = plan_buckets(&apps);
        let pro = buckets.iter().find(|b| b.key == "pro").unwrap();
        assert_eq!(pro.count, 2);
        assert_eq!(buckets.last().unwrap().key, FALLBACK_KEY);
        assert_eq!(buckets.last().unwrap().count, 1);
    }

    #[test]
    fn test_buckets_are_idempotent() {
        let contacts = vec![contact(Some("partner")), contact(None)];
        assert_eq!(
            contact_status_buckets(&contacts),
            contact_status_buckets(&contacts)
        );
    }
}
