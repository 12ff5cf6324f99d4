//! Call-to-action banners on the dashboard.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::summary::Summary;
use crate::records::Application;

/// Pending applications above this count raise a warning.
pub const PENDING_THRESHOLD: usize = 5;

/// New contacts above this count raise an info banner.
pub const NEW_CONTACTS_THRESHOLD: usize = 3;

/// At most this many alerts are shown.
pub const MAX_ALERTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Warning,
    Info,
    Success,
}

impl AlertLevel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Info => "info",
            Self::Success => "success",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alert {
    pub level: AlertLevel,
    pub message: String,
    /// Button text.
    pub action: &'static str,
    /// Where the button leads.
    pub href: &'static str,
}

/// Build the dashboard alerts, most urgent first.
#[must_use]
pub fn dashboard_alerts(
    summary: &Summary,
    applications: &[Application],
    now: DateTime<Utc>,
) -> Vec<Alert> {
    let mut alerts = Vec::new();

    if summary.pending_applications > PENDING_THRESHOLD {
        alerts.push(Alert {
            level: AlertLevel::Warning,
            message: format!(
                "{} vendor applications need review",
                summary.pending_applications
            ),
            action: "Review Applications",
            href: "/admin/applications?status=pending",
        });
    }

    if summary.new_contacts > NEW_CONTACTS_THRESHOLD {
        alerts.push(Alert {
            level: AlertLevel::Info,
            message: format!("{} new contact messages", summary.new_contacts),
            action: "View Contacts",
            href: "/admin/contacts?status=new",
        });
    }

    let today = now.date_naive();
    let received_today = applications
        .iter()
        .filter(|a| a.created_at.is_some_and(|ts| ts.date_naive() == today))
        .count();
    if received_today > 0 {
        alerts.push(Alert {
            level: AlertLevel::Success,
            message: format!("{received_today} new applications received today"),
            action: "View Details",
            href: "/admin/applications",
        });
    }

    alerts.truncate(MAX_ALERTS);
    alerts
}
