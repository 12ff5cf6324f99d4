//! Headline counts for the dashboard and analytics screens.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::records::{Application, Contact};
use crate::types::{ApplicationStatus, ContactStatus};

/// Window for the "this week" counter.
const WEEK_DAYS: i64 = 7;

/// Percentage of applications that were approved, rounded half up.
///
/// Returns 0 when there are no applications.
#[must_use]
pub const fn conversion_rate(total: usize, approved: usize) -> usize {
    if total == 0 {
        return 0;
    }
    (200 * approved + total) / (2 * total)
}

/// Dashboard headline numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_applications: usize,
    pub pending_applications: usize,
    pub approved_applications: usize,
    pub rejected_applications: usize,
    pub onboarding_applications: usize,
    /// Applications created within the last seven days.
    pub this_week_applications: usize,
    pub total_contacts: usize,
    pub new_contacts: usize,
    pub responded_contacts: usize,
    pub closed_contacts: usize,
    /// Approved share of all applications, as a whole percentage.
    pub conversion_rate: usize,
}

impl Summary {
    #[must_use]
    pub fn compute(apps: &[Application], contacts: &[Contact], now: DateTime<Utc>) -> Self {
        let apps_with = |status: ApplicationStatus| apps.iter().filter(|a| a.status == status).count();
        let contacts_with =
            |status: ContactStatus| contacts.iter().filter(|c| c.status == status).count();

        let week_ago = now - Duration::days(WEEK_DAYS);
        let approved = apps_with(ApplicationStatus::Approved);

        Self {
            total_applications: apps.len(),
            pending_applications: apps_with(ApplicationStatus::Pending),
            approved_applications: approved,
            rejected_applications: apps_with(ApplicationStatus::Rejected),
            onboarding_applications: apps_with(ApplicationStatus::Onboarding),
            this_week_applications: apps
                .iter()
                .filter(|a| a.created_at.is_some_and(|ts| ts > week_ago))
                .count(),
            total_contacts: contacts.len(),
            new_contacts: contacts_with(ContactStatus::New),
            responded_contacts: contacts_with(ContactStatus::Responded),
            closed_contacts: contacts_with(ContactStatus::Closed),
            conversion_rate: conversion_rate(apps.len(), approved),
        }
    }
}
