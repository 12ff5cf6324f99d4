//! Vendor application screens.
//!
//! List with search and status filter, detail with a status/notes form,
//! quick approve/reject for pending applications, and delete behind a
//! confirmation page.

use askama::Template;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::instrument;

use saasbay_core::metrics::{ApplicationFilter, Summary, date_time_label, short_date};
use saasbay_core::records::{MISSING_DATE, StatusChange};
use saasbay_core::{Application, ApplicationStatus, Choice};

use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::state::AppState;
use crate::store::Collection;

use super::dashboard::AdminUserView;
use super::{Flash, SelectOption, flash, render, select_options, with_banner};

const LIST_PATH: &str = "/admin/applications";

// =============================================================================
// Views
// =============================================================================

/// Application row in the list.
#[derive(Debug, Clone)]
pub struct ApplicationRow {
    pub id: String,
    pub name: String,
    pub company_name: String,
    pub email: String,
    pub plan: String,
    pub category: String,
    pub status: &'static str,
    pub status_label: &'static str,
    pub submitted: String,
    pub is_pending: bool,
}

impl From<&Application> for ApplicationRow {
    fn from(app: &Application) -> Self {
        Self {
            id: app.id.to_string(),
            name: app.name.clone(),
            company_name: app.company_name.clone(),
            email: app.email.clone(),
            plan: app.plan.clone(),
            category: app.category.clone(),
            status: app.status.as_str(),
            status_label: app.status.label(),
            submitted: app
                .created_at
                .map_or_else(|| MISSING_DATE.to_owned(), short_date),
            is_pending: app.status == ApplicationStatus::Pending,
        }
    }
}

impl ApplicationRow {
    /// Detail page URL.
    #[must_use]
    pub fn href(&self) -> String {
        format!("{LIST_PATH}/{}", self.id)
    }
}

/// Every field of one application.
#[derive(Debug, Clone)]
pub struct ApplicationDetail {
    pub id: String,
    pub name: String,
    pub email: String,
    pub contact_number: String,
    pub designation: String,
    pub company_name: String,
    pub category: String,
    pub plan: String,
    pub tax_id: String,
    pub notes: String,
    pub status: &'static str,
    pub status_label: &'static str,
    pub created: String,
    pub updated: String,
}

impl From<&Application> for ApplicationDetail {
    fn from(app: &Application) -> Self {
        Self {
            id: app.id.to_string(),
            name: app.name.clone(),
            email: app.email.clone(),
            contact_number: app.contact_number.clone(),
            designation: app.designation.clone(),
            company_name: app.company_name.clone(),
            category: app.category.clone(),
            plan: app.plan.clone(),
            tax_id: app.tax_id.clone(),
            notes: app.notes.clone(),
            status: app.status.as_str(),
            status_label: app.status.label(),
            created: date_time_label(app.created_at),
            updated: date_time_label(app.updated_at),
        }
    }
}

/// Applications list template.
#[derive(Template)]
#[template(path = "applications/index.html")]
pub struct ApplicationsTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub summary: Summary,
    pub applications: Vec<ApplicationRow>,
    pub total: usize,
    pub query: String,
    pub status_options: Vec<SelectOption>,
    pub filter_active: bool,
    pub flash: Flash,
}

/// Application detail template.
#[derive(Template)]
#[template(path = "applications/show.html")]
pub struct ApplicationDetailTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub application: ApplicationDetail,
    pub status_options: Vec<SelectOption>,
}

/// Delete confirmation template.
#[derive(Template)]
#[template(path = "applications/delete.html")]
pub struct DeleteApplicationTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub application: ApplicationRow,
}

// =============================================================================
// Query and form types
// =============================================================================

/// List query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub q: Option<String>,
    pub status: Option<String>,
    pub success: Option<String>,
    pub error: Option<String>,
}

impl ListQuery {
    /// The filter to apply. Unknown status values disable the status filter.
    fn filter(&self) -> ApplicationFilter {
        let status = Choice::parse(self.status.as_deref()).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Ignoring status filter");
            Choice::All
        });
        ApplicationFilter {
            query: self.q.clone().unwrap_or_default(),
            status,
        }
    }
}

/// Detail form: status plus notes.
#[derive(Debug, Deserialize)]
pub struct UpdateForm {
    pub status: String,
    #[serde(default)]
    pub notes: String,
}

/// Quick action form: status only.
#[derive(Debug, Deserialize)]
pub struct QuickStatusForm {
    pub status: String,
}

/// Delete form, only valid when sent from the confirmation page.
#[derive(Debug, Default, Deserialize)]
pub struct DeleteForm {
    pub confirm: Option<String>,
}

impl DeleteForm {
    pub(crate) fn is_confirmed(&self) -> bool {
        self.confirm.as_deref() == Some("yes")
    }
}

// =============================================================================
// Router
// =============================================================================

/// Build the applications router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(LIST_PATH, get(list))
        .route("/admin/applications/{id}", get(show).post(update))
        .route(
            "/admin/applications/{id}/status",
            axum::routing::post(quick_status),
        )
        .route(
            "/admin/applications/{id}/delete",
            get(confirm_delete).post(delete),
        )
}

// =============================================================================
// Handlers
// =============================================================================

fn build_list(
    admin: &AdminUserView,
    applications: &[Application],
    summary: Summary,
    query: &ListQuery,
) -> ApplicationsTemplate {
    let filter = query.filter();
    let rows = filter
        .apply(applications)
        .into_iter()
        .map(ApplicationRow::from)
        .collect();

    ApplicationsTemplate {
        admin_user: admin.clone(),
        current_path: LIST_PATH.to_string(),
        summary,
        applications: rows,
        total: applications.len(),
        query: filter.query.clone(),
        status_options: select_options(filter.status.selected()),
        filter_active: filter.is_active(),
        flash: Flash::from_codes(query.success.as_deref(), query.error.as_deref()),
    }
}

/// Applications list.
///
/// GET /admin/applications
#[instrument(skip(admin, state))]
async fn list(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Html<String>, AppError> {
    let records = state.records();
    let (applications, summary) =
        tokio::try_join!(records.applications(), records.summary(Utc::now()))?;

    render(&build_list(
        &AdminUserView::from(&admin),
        &applications,
        summary,
        &query,
    ))
}

async fn load(state: &AppState, id: &str) -> Result<Application, AppError> {
    state
        .records()
        .application(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("application {id}")))
}

/// Application detail.
///
/// GET /admin/applications/{id}
#[instrument(skip(admin, state))]
async fn show(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let app = load(&state, &id).await?;

    render(&ApplicationDetailTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: LIST_PATH.to_string(),
        status_options: select_options(Some(app.status)),
        application: ApplicationDetail::from(&app),
    })
}

/// Write a status change, holding the record's in-flight slot.
///
/// Returns the redirect back to the list with the outcome banner.
async fn apply_change(
    state: &AppState,
    id: &str,
    change: &StatusChange<ApplicationStatus>,
) -> Result<Redirect, AppError> {
    let _guard = state
        .in_flight()
        .try_acquire(Collection::Applications, id)
        .ok_or_else(|| AppError::Conflict(format!("application {id} is already being updated")))?;

    match state.records().update_application(id, change).await {
        Ok(()) => Ok(Redirect::to(&with_banner(LIST_PATH, "success", flash::UPDATED))),
        Err(e) => {
            AppError::from(e).report();
            Ok(Redirect::to(&with_banner(
                LIST_PATH,
                "error",
                flash::UPDATE_FAILED,
            )))
        }
    }
}

fn parse_status(input: &str) -> Option<ApplicationStatus> {
    input
        .trim()
        .parse()
        .map_err(|e| tracing::warn!(error = %e, "Rejected status change"))
        .ok()
}

fn invalid_status() -> Redirect {
    Redirect::to(&with_banner(LIST_PATH, "error", flash::INVALID_STATUS))
}

/// Update status and notes from the detail form.
///
/// POST /admin/applications/{id}
#[instrument(skip(_admin, state, form))]
async fn update(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<UpdateForm>,
) -> Result<Redirect, AppError> {
    let Some(status) = parse_status(&form.status) else {
        return Ok(invalid_status());
    };
    apply_change(&state, &id, &StatusChange::with_notes(status, form.notes)).await
}

/// Quick approve/reject from the list. Notes are left as stored.
///
/// POST /admin/applications/{id}/status
#[instrument(skip(_admin, state, form))]
async fn quick_status(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<QuickStatusForm>,
) -> Result<Redirect, AppError> {
    let Some(status) = parse_status(&form.status) else {
        return Ok(invalid_status());
    };
    apply_change(&state, &id, &StatusChange::status_only(status)).await
}

/// Delete confirmation page.
///
/// GET /admin/applications/{id}/delete
#[instrument(skip(admin, state))]
async fn confirm_delete(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let app = load(&state, &id).await?;

    render(&DeleteApplicationTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: LIST_PATH.to_string(),
        application: ApplicationRow::from(&app),
    })
}

/// Delete after confirmation.
///
/// POST /admin/applications/{id}/delete
#[instrument(skip(_admin, state, form))]
async fn delete(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<DeleteForm>,
) -> Result<Response, AppError> {
    if !form.is_confirmed() {
        return Ok(Redirect::to(&format!("{LIST_PATH}/{id}/delete")).into_response());
    }

    let _guard = state
        .in_flight()
        .try_acquire(Collection::Applications, &id)
        .ok_or_else(|| AppError::Conflict(format!("application {id} is already being updated")))?;

    let code = match state.records().delete_application(&id).await {
        Ok(()) => ("success", flash::DELETED),
        Err(e) => {
            AppError::from(e).report();
            ("error", flash::DELETE_FAILED)
        }
    };
    Ok(Redirect::to(&with_banner(LIST_PATH, code.0, code.1)).into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn admin() -> AdminUserView {
        AdminUserView {
            name: "Ops".to_string(),
            email: "ops@saasbay.in".to_string(),
        }
    }

    fn apps() -> Vec<Application> {
        [
            json!({"id": "a1", "name": "Asha", "companyName": "Kirana Co", "status": "pending"}),
            json!({"id": "a2", "name": "Bala", "email": "bala@kirana.in", "status": "approved"}),
            json!({"id": "a3", "name": "Chitra", "status": "rejected",
                   "createdAt": Utc.with_ymd_and_hms(2026, 2, 3, 0, 0, 0).unwrap().to_rfc3339()}),
        ]
        .into_iter()
        .map(|doc| Application::from_document(doc).unwrap())
        .collect()
    }

    #[test]
    fn test_list_without_filters_shows_everything() {
        let page = build_list(&admin(), &apps(), Summary::default(), &ListQuery::default());
        assert_eq!(page.applications.len(), 3);
        assert!(!page.filter_active);
        assert!(page.applications[0].is_pending);
        assert_eq!(page.applications[0].submitted, "N/A");
        assert_eq!(page.applications[2].submitted, "2/3/2026");
    }

    #[test]
    fn test_list_filters_by_search_and_status() {
        let query = ListQuery {
            q: Some("KIRANA".to_string()),
            status: Some("approved".to_string()),
            ..ListQuery::default()
        };
        let page = build_list(&admin(), &apps(), Summary::default(), &query);
        let ids: Vec<_> = page.applications.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, ["a2"]);
        assert!(page.filter_active);
        assert_eq!(page.total, 3);
    }

    #[test]
    fn test_unknown_status_filter_is_ignored() {
        let query = ListQuery {
            status: Some("archived".to_string()),
            ..ListQuery::default()
        };
        let page = build_list(&admin(), &apps(), Summary::default(), &query);
        assert_eq!(page.applications.len(), 3);
    }

    #[test]
    fn test_delete_form_requires_confirm() {
        assert!(!DeleteForm::default().is_confirmed());
        assert!(
            DeleteForm {
                confirm: Some("yes".to_string())
            }
            .is_confirmed()
        );
    }

    #[test]
    fn test_parse_status() {
        assert_eq!(parse_status(" onboarding "), Some(ApplicationStatus::Onboarding));
        assert_eq!(parse_status("archived"), None);
    }
}
