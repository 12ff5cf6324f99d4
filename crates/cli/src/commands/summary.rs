//! Operator summary report.
//!
//! Prints the same numbers as the dashboard and analytics screens:
//! headline counts over every record, grouped counts over the chosen
//! window, the six-month trend, and the pending review queue.

use chrono::Utc;

use saasbay_admin::config::StoreBackend;
use saasbay_admin::open_store;
use saasbay_admin::services::RecordService;
use saasbay_core::ApplicationStatus;
use saasbay_core::metrics::{
    Bucket, Summary, TimeRange, application_status_buckets, contact_intent_buckets,
    contact_status_buckets, monthly_trend, plan_buckets, time_ago,
};

use super::CommandError;

fn log_buckets(chart: &str, buckets: &[Bucket]) {
    for bucket in buckets {
        tracing::info!(chart, key = bucket.key, label = bucket.label, count = bucket.count);
    }
}

/// Fetch from the configured store and log the report.
///
/// # Errors
///
/// Returns `CommandError` if the store cannot be opened or a query fails.
pub async fn print(range: TimeRange) -> Result<(), CommandError> {
    let store = open_store(&StoreBackend::from_env()?)?;
    let records = RecordService::new(store.as_ref());
    let now = Utc::now();
    let cutoff = range.cutoff(now);

    let (applications, contacts) = tokio::try_join!(records.applications(), records.contacts())?;
    let (recent_apps, recent_contacts) = tokio::try_join!(
        records.applications_since(cutoff),
        records.contacts_since(cutoff)
    )?;

    let summary = Summary::compute(&applications, &contacts, now);
    tracing::info!(
        total_applications = summary.total_applications,
        pending = summary.pending_applications,
        approved = summary.approved_applications,
        rejected = summary.rejected_applications,
        onboarding = summary.onboarding_applications,
        this_week = summary.this_week_applications,
        "Applications"
    );
    tracing::info!(
        total_contacts = summary.total_contacts,
        new = summary.new_contacts,
        responded = summary.responded_contacts,
        closed = summary.closed_contacts,
        "Contact messages"
    );
    tracing::info!(conversion_rate = summary.conversion_rate, "Conversion rate (%)");

    tracing::info!(
        range = %range,
        applications = recent_apps.len(),
        contacts = recent_contacts.len(),
        "Window: {}",
        range.label()
    );
    log_buckets("application_status", &application_status_buckets(&recent_apps));
    log_buckets("vendor_plan", &plan_buckets(&recent_apps));
    log_buckets("contact_intent", &contact_intent_buckets(&recent_contacts));
    log_buckets("contact_status", &contact_status_buckets(&recent_contacts));

    let trend = monthly_trend(
        applications.iter().map(|a| a.created_at),
        contacts.iter().map(|c| c.created_at),
        now,
    );
    for point in trend {
        tracing::info!(
            month = point.month,
            applications = point.applications,
            contacts = point.contacts,
            "Monthly trend"
        );
    }

    let pending = records
        .applications_with_status(ApplicationStatus::Pending)
        .await?;
    for app in &pending {
        tracing::info!(
            id = %app.id,
            company = %app.company_name,
            email = %app.email,
            submitted = %time_ago(app.created_at, now),
            "Pending review"
        );
    }
    if pending.is_empty() {
        tracing::info!("No applications awaiting review");
    }

    Ok(())
}
