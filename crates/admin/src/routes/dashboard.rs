//! Dashboard route handler.

use askama::Template;
use axum::{Router, extract::State, response::Html, routing::get};
use chrono::{DateTime, Utc};
use tracing::instrument;

use saasbay_core::metrics::{Alert, Summary, dashboard_alerts, most_recent, time_ago};
use saasbay_core::{Application, Contact};

use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::models::CurrentAdmin;
use crate::state::AppState;

use super::render;

/// How many recent records each dashboard panel lists.
const RECENT_LIMIT: usize = 5;

/// Signed-in operator as shown in the page header.
#[derive(Debug, Clone)]
pub struct AdminUserView {
    pub name: String,
    pub email: String,
}

impl From<&CurrentAdmin> for AdminUserView {
    fn from(admin: &CurrentAdmin) -> Self {
        Self {
            name: admin.name.clone(),
            email: admin.email.clone(),
        }
    }
}

/// Recent application row.
#[derive(Debug, Clone)]
pub struct RecentApplicationView {
    pub id: String,
    pub name: String,
    pub company_name: String,
    pub status: &'static str,
    pub status_label: &'static str,
    pub age: String,
}

impl RecentApplicationView {
    fn new(app: &Application, now: DateTime<Utc>) -> Self {
        Self {
            id: app.id.to_string(),
            name: app.name.clone(),
            company_name: app.company_name.clone(),
            status: app.status.as_str(),
            status_label: app.status.label(),
            age: time_ago(app.created_at, now),
        }
    }
}

/// Recent contact row.
#[derive(Debug, Clone)]
pub struct RecentContactView {
    pub id: String,
    pub name: String,
    pub preview: String,
    pub status: &'static str,
    pub status_label: &'static str,
    pub age: String,
}

impl RecentContactView {
    fn new(contact: &Contact, now: DateTime<Utc>) -> Self {
        Self {
            id: contact.id.to_string(),
            name: contact.display_name().to_owned(),
            preview: contact.message_preview(),
            status: contact.status.as_str(),
            status_label: contact.status.label(),
            age: time_ago(contact.created_at, now),
        }
    }
}

/// Dashboard template.
#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub summary: Summary,
    pub alerts: Vec<Alert>,
    pub recent_applications: Vec<RecentApplicationView>,
    pub recent_contacts: Vec<RecentContactView>,
}

impl DashboardTemplate {
    fn build(
        admin: &CurrentAdmin,
        applications: &[Application],
        contacts: &[Contact],
        now: DateTime<Utc>,
    ) -> Self {
        let summary = Summary::compute(applications, contacts, now);
        let alerts = dashboard_alerts(&summary, applications, now);
        let recent_applications = most_recent(applications, |a| a.created_at, RECENT_LIMIT)
            .iter()
            .map(|a| RecentApplicationView::new(a, now))
            .collect();
        let recent_contacts = most_recent(contacts, |c| c.created_at, RECENT_LIMIT)
            .iter()
            .map(|c| RecentContactView::new(c, now))
            .collect();

        Self {
            admin_user: AdminUserView::from(admin),
            current_path: "/admin".to_string(),
            summary,
            alerts,
            recent_applications,
            recent_contacts,
        }
    }
}

/// Build the dashboard router.
pub fn router() -> Router<AppState> {
    Router::new().route("/admin", get(dashboard))
}

/// Dashboard page handler.
///
/// GET /admin
#[instrument(skip(admin, state))]
pub async fn dashboard(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
) -> Result<Html<String>, AppError> {
    let records = state.records();
    let (applications, contacts) = tokio::try_join!(records.applications(), records.contacts())?;

    render(&DashboardTemplate::build(
        &admin,
        &applications,
        &contacts,
        Utc::now(),
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 20, 9, 0, 0).unwrap()
    }

    fn admin() -> CurrentAdmin {
        CurrentAdmin {
            uid: "u1".to_string(),
            email: "ops@saasbay.in".to_string(),
            name: "Ops".to_string(),
        }
    }

    #[test]
    fn test_dashboard_lists_five_newest() {
        let apps: Vec<Application> = (0..7)
            .map(|i| {
                Application::from_document(json!({
                    "id": format!("a{i}"),
                    "createdAt": (now() - Duration::hours(i)).to_rfc3339(),
                }))
                .unwrap()
            })
            .collect();

        let page = DashboardTemplate::build(&admin(), &apps, &[], now());
        let ids: Vec<_> = page
            .recent_applications
            .iter()
            .map(|a| a.id.as_str())
            .collect();
        assert_eq!(ids, ["a0", "a1", "a2", "a3", "a4"]);
        assert_eq!(page.recent_applications[1].age, "1h ago");
        assert_eq!(page.summary.pending_applications, 7);
        assert_eq!(page.alerts.len(), 2);
    }
}
