//! Contact message screens.
//!
//! Same shape as the applications screens, with an intent filter and
//! per-status counters computed from the fetched messages.

use askama::Template;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::instrument;

use saasbay_core::metrics::{ContactFilter, Summary, date_time_label, time_ago};
use saasbay_core::records::StatusChange;
use saasbay_core::{Choice, Contact, ContactIntent, ContactStatus};

use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::state::AppState;
use crate::store::Collection;

use super::applications::DeleteForm;
use super::dashboard::AdminUserView;
use super::{Flash, SelectOption, flash, render, select_options, with_banner};

const LIST_PATH: &str = "/admin/contacts";

// =============================================================================
// Views
// =============================================================================

/// A status the operator can move a message to.
#[derive(Debug, Clone)]
pub struct StatusAction {
    pub value: &'static str,
    pub label: &'static str,
}

/// Contact row in the list.
#[derive(Debug, Clone)]
pub struct ContactRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub preview: String,
    pub intent: &'static str,
    pub intent_label: &'static str,
    pub status: &'static str,
    pub status_label: &'static str,
    pub received: String,
    /// Quick actions: every status other than the current one.
    pub actions: Vec<StatusAction>,
}

impl ContactRow {
    fn new(contact: &Contact, now: DateTime<Utc>) -> Self {
        let intent = contact.display_intent();
        Self {
            id: contact.id.to_string(),
            name: contact.display_name().to_owned(),
            email: contact.email.clone(),
            preview: contact.message_preview(),
            intent: intent.as_str(),
            intent_label: intent.label(),
            status: contact.status.as_str(),
            status_label: contact.status.label(),
            received: time_ago(contact.created_at, now),
            actions: ContactStatus::ALL
                .iter()
                .filter(|s| **s != contact.status)
                .map(|s| StatusAction {
                    value: s.as_str(),
                    label: s.label(),
                })
                .collect(),
        }
    }

    /// Detail page URL.
    #[must_use]
    pub fn href(&self) -> String {
        format!("{LIST_PATH}/{}", self.id)
    }
}

/// Every field of one message.
#[derive(Debug, Clone)]
pub struct ContactDetail {
    pub id: String,
    pub name: String,
    pub email: String,
    pub message: String,
    pub intent_label: &'static str,
    pub status: &'static str,
    pub status_label: &'static str,
    pub notes: String,
    pub created: String,
    pub updated: String,
}

impl From<&Contact> for ContactDetail {
    fn from(contact: &Contact) -> Self {
        Self {
            id: contact.id.to_string(),
            name: contact.display_name().to_owned(),
            email: contact.email.clone(),
            message: contact.message.clone(),
            intent_label: contact.display_intent().label(),
            status: contact.status.as_str(),
            status_label: contact.status.label(),
            notes: contact.notes.clone(),
            created: date_time_label(contact.created_at),
            updated: date_time_label(contact.updated_at),
        }
    }
}

/// Contacts list template.
#[derive(Template)]
#[template(path = "contacts/index.html")]
pub struct ContactsTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub stats: Summary,
    pub contacts: Vec<ContactRow>,
    pub total: usize,
    pub query: String,
    pub status_options: Vec<SelectOption>,
    pub intent_options: Vec<SelectOption>,
    pub filter_active: bool,
    pub flash: Flash,
}

/// Contact detail template.
#[derive(Template)]
#[template(path = "contacts/show.html")]
pub struct ContactDetailTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub contact: ContactDetail,
    pub status_options: Vec<SelectOption>,
}

/// Delete confirmation template.
#[derive(Template)]
#[template(path = "contacts/delete.html")]
pub struct DeleteContactTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub contact: ContactRow,
}

// =============================================================================
// Query and form types
// =============================================================================

/// List query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub q: Option<String>,
    pub status: Option<String>,
    pub intent: Option<String>,
    pub success: Option<String>,
    pub error: Option<String>,
}

impl ListQuery {
    /// The filter to apply. Unknown dropdown values disable that dropdown.
    fn filter(&self) -> ContactFilter {
        let status = Choice::parse(self.status.as_deref()).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Ignoring status filter");
            Choice::All
        });
        let intent = Choice::parse(self.intent.as_deref()).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Ignoring intent filter");
            Choice::All
        });
        ContactFilter {
            query: self.q.clone().unwrap_or_default(),
            status,
            intent,
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

// =============================================================================
// Router
// =============================================================================

/// Build the contacts router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(LIST_PATH, get(list))
        .route("/admin/contacts/{id}", get(show).post(update))
        .route("/admin/contacts/{id}/status", post(quick_status))
        .route("/admin/contacts/{id}/delete", get(confirm_delete).post(delete))
}

// =============================================================================
// Handlers
// =============================================================================

fn build_list(
    admin: &AdminUserView,
    contacts: &[Contact],
    query: &ListQuery,
    now: DateTime<Utc>,
) -> ContactsTemplate {
    let filter = query.filter();
    let rows = filter
        .apply(contacts)
        .into_iter()
        .map(|c| ContactRow::new(c, now))
        .collect();

    ContactsTemplate {
        admin_user: admin.clone(),
        current_path: LIST_PATH.to_string(),
        stats: Summary::compute(&[], contacts, now),
        contacts: rows,
        total: contacts.len(),
        query: filter.query.clone(),
        status_options: select_options(filter.status.selected()),
        intent_options: select_options::<ContactIntent>(filter.intent.selected()),
        filter_active: filter.is_active(),
        flash: Flash::from_codes(query.success.as_deref(), query.error.as_deref()),
    }
}

/// Contacts list.
///
/// GET /admin/contacts
#[instrument(skip(admin, state))]
async fn list(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Html<String>, AppError> {
    let contacts = state.records().contacts().await?;

    render(&build_list(
        &AdminUserView::from(&admin),
        &contacts,
        &query,
        Utc::now(),
    ))
}

async fn load(state: &AppState, id: &str) -> Result<Contact, AppError> {
    state
        .records()
        .contact(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("contact {id}")))
}

/// Contact detail.
///
/// GET /admin/contacts/{id}
#[instrument(skip(admin, state))]
async fn show(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let contact = load(&state, &id).await?;

    render(&ContactDetailTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: LIST_PATH.to_string(),
        status_options: select_options(Some(contact.status)),
        contact: ContactDetail::from(&contact),
    })
}

async fn apply_change(
    state: &AppState,
    id: &str,
    change: &StatusChange<ContactStatus>,
) -> Result<Redirect, AppError> {
    let _guard = state
        .in_flight()
        .try_acquire(Collection::Contacts, id)
        .ok_or_else(|| AppError::Conflict(format!("contact {id} is already being updated")))?;

    match state.records().update_contact(id, change).await {
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

fn parse_status(input: &str) -> Option<ContactStatus> {
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
/// POST /admin/contacts/{id}
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

/// Quick status change from the list. Notes are left as stored.
///
/// POST /admin/contacts/{id}/status
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
/// GET /admin/contacts/{id}/delete
#[instrument(skip(admin, state))]
async fn confirm_delete(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let contact = load(&state, &id).await?;

    render(&DeleteContactTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: LIST_PATH.to_string(),
        contact: ContactRow::new(&contact, Utc::now()),
    })
}

/// Delete after confirmation.
///
/// POST /admin/contacts/{id}/delete
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
        .try_acquire(Collection::Contacts, &id)
        .ok_or_else(|| AppError::Conflict(format!("contact {id} is already being updated")))?;

    let (key, code) = match state.records().delete_contact(&id).await {
        Ok(()) => ("success", flash::DELETED),
        Err(e) => {
            AppError::from(e).report();
            ("error", flash::DELETE_FAILED)
        }
    };
    Ok(Redirect::to(&with_banner(LIST_PATH, key, code)).into_response())
}
