//! Search and dropdown filtering for the list screens.

use crate::records::{Application, Contact};
use crate::types::{ApplicationStatus, Choice, ContactIntent, ContactStatus};

/// Case-insensitive substring match over a set of fields.
///
/// An empty (or all-whitespace) needle matches everything.
fn matches_text<'a>(needle: &str, haystacks: impl IntoIterator<Item = &'a str>) -> bool {
    let needle = needle.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    haystacks
        .into_iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

/// Filters for the applications list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationFilter {
    /// Matched against name, company name and email.
    pub query: String,
    pub status: Choice<ApplicationStatus>,
}

impl ApplicationFilter {
    #[must_use]
    pub fn matches(&self, app: &Application) -> bool {
        self.status.admits(app.status)
            && matches_text(
                &self.query,
                [
                    app.name.as_str(),
                    app.company_name.as_str(),
                    app.email.as_str(),
                ],
            )
    }

    /// Keep matching records, preserving input order.
    #[must_use]
    pub fn apply<'a>(&self, apps: &'a [Application]) -> Vec<&'a Application> {
        apps.iter().filter(|app| self.matches(app)).collect()
    }

    /// Whether any condition is enabled.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.query.trim().is_empty() || self.status != Choice::All
    }
}

/// Filters for the contacts list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactFilter {
    /// Matched against name, email and message.
    pub query: String,
    pub status: Choice<ContactStatus>,
    /// Contacts without a recognized intent only pass "all".
    pub intent: Choice<ContactIntent>,
}

impl ContactFilter {
    #[must_use]
    pub fn matches(&self, contact: &Contact) -> bool {
        self.status.admits(contact.status)
            && self.intent.admits_optional(contact.intent)
            && matches_text(
                &self.query,
                [
                    contact.name.as_str(),
                    contact.email.as_str(),
                    contact.message.as_str(),
                ],
            )
    }

    /// Keep matching records, preserving input order.
    #[must_use]
    pub fn apply<'a>(&self, contacts: &'a [Contact]) -> Vec<&'a Contact> {
        contacts.iter().filter(|c| self.matches(c)).collect()
    }

    /// Whether any condition is enabled.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.query.trim().is_empty() || self.status != Choice::All || self.intent != Choice::All
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn app(id: &str, name: &str, company: &str, status: &str) -> Application {
        Application::from_document(json!({
            "id": id,
            "name": name,
            "companyName": company,
            "email": format!("{id}@example.com"),
            "status": status,
        }))
        .unwrap()
    }

    fn contact(id: &str, message: &str, intent: Option<&str>, status: &str) -> Contact {
        Contact::from_document(json!({
            "id": id,
            "email": format!("{id}@example.com"),
            "message": message,
            "intent": intent,
            "status": status,
        }))
        .unwrap()
    }

    fn sample_apps() -> Vec<Application> {
        vec![
            app("a1", "Asha", "Acme Tools", "pending"),
            app("a2", "Ben", "Bolt Labs", "approved"),
            app("a3", "Chen", "acme cloud", "rejected"),
            app("a4", "Dee", "Delta", "approved"),
        ]
    }

    #[test]
    fn test_default_filter_is_identity() {
        let apps = sample_apps();
        let kept = ApplicationFilter::default().apply(&apps);
        assert_eq!(kept.len(), apps.len());
        assert!(kept.iter().zip(&apps).all(|(a, b)| a.id == b.id));
        assert!(!ApplicationFilter::default().is_active());
    }

    #[test]
    fn test_status_filter_partitions_input() {
        let apps = sample_apps();
        for status in ApplicationStatus::ALL {
            let filter = ApplicationFilter {
                status: Choice::Only(*status),
                ..ApplicationFilter::default()
            };
            let kept = filter.apply(&apps);
            assert!(kept.iter().all(|a| a.status == *status));
            let rest = apps.iter().filter(|a| !filter.matches(a)).count();
            assert_eq!(kept.len() + rest, apps.len());
        }
    }

    #[test]
    fn test_search_is_case_insensitive_and_order_preserving() {
        let apps = sample_apps();
        let filter = ApplicationFilter {
            query: "ACME".to_owned(),
            ..ApplicationFilter::default()
        };
        let ids: Vec<_> = filter.apply(&apps).iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, ["a1", "a3"]);
    }

    #[test]
    fn test_search_matches_email() {
        let apps = sample_apps();
        let filter = ApplicationFilter {
            query: "a4@".to_owned(),
            ..ApplicationFilter::default()
        };
        assert_eq!(filter.apply(&apps).len(), 1);
    }

    #[test]
    fn test_combined_filters_are_conjunctive() {
        let apps = sample_apps();
        let filter = ApplicationFilter {
            query: "acme".to_owned(),
            status: Choice::Only(ApplicationStatus::Pending),
        };
        let ids: Vec<_> = filter.apply(&apps).iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, ["a1"]);
    }

    #[test]
    fn test_contact_filters() {
        let contacts = vec![
            contact("c1", "Need a refund", Some("customer"), "new"),
            contact("c2", "Partnership idea", Some("partner"), "responded"),
            contact("c3", "Hello", None, "new"),
        ];

        let by_intent = ContactFilter {
            intent: Choice::Only(ContactIntent::Customer),
            ..ContactFilter::default()
        };
        let ids: Vec<_> = by_intent.apply(&contacts).iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["c1"]);

        let by_message = ContactFilter {
            query: "partner".to_owned(),
            status: Choice::Only(ContactStatus::Responded),
            ..ContactFilter::default()
        };
        assert_eq!(by_message.apply(&contacts).len(), 1);
        assert!(by_message.is_active());

        assert_eq!(ContactFilter::default().apply(&contacts).len(), 3);
    }
}
