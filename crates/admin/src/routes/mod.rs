//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                             - Liveness
//! GET  /health/ready                       - Readiness (settings document reachable)
//!
//! # Auth
//! GET  /                                   - Login page
//! POST /login                              - Sign in
//! POST /logout                             - Sign out
//!
//! # Dashboard
//! GET  /admin                              - Stats, recent records, alerts
//!
//! # Vendor applications
//! GET  /admin/applications                 - List (?q=&status=&success=&error=)
//! GET  /admin/applications/{id}            - Detail with status/notes form
//! POST /admin/applications/{id}            - Update status and notes
//! POST /admin/applications/{id}/status     - Quick status change
//! GET  /admin/applications/{id}/delete     - Delete confirmation
//! POST /admin/applications/{id}/delete     - Delete
//!
//! # Contact messages (same shape, plus &intent=)
//! GET  /admin/contacts ...
//!
//! # Analytics
//! GET  /admin/analytics                    - Charts (?range=&tab=)
//! GET  /api/analytics                      - Chart data as JSON
//!
//! # Settings
//! GET  /admin/settings                     - Settings form
//! POST /admin/settings                     - Save settings
//! ```
//!
//! Every screen refetches its data on each request. Mutations redirect back
//! to the list, which shows a banner chosen by the `success` or `error`
//! query parameter.

use askama::Template;
use axum::{Router, response::Html};
use serde::Deserialize;

use saasbay_core::StoredEnum;

use crate::error::AppError;
use crate::state::AppState;

pub mod analytics;
pub mod applications;
pub mod auth;
pub mod contacts;
pub mod dashboard;
pub mod health;
pub mod settings;

/// Build the admin router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(dashboard::router())
        .merge(applications::router())
        .merge(contacts::router())
        .merge(analytics::router())
        .merge(settings::router())
}

/// Render a template, turning render failures into a 500.
pub(crate) fn render<T: Template>(template: &T) -> Result<Html<String>, AppError> {
    template.render().map(Html).map_err(|e| {
        tracing::error!("Template render error: {e}");
        AppError::Internal(format!("template: {e}"))
    })
}

// =============================================================================
// Banners
// =============================================================================

/// `?success=` and `?error=` codes set by mutation redirects.
#[derive(Debug, Default, Deserialize)]
pub struct FlashQuery {
    pub success: Option<String>,
    pub error: Option<String>,
}

/// Banner texts resolved from [`FlashQuery`].
///
/// Only known codes produce a banner, so the query string cannot inject text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flash {
    pub success: Option<&'static str>,
    pub error: Option<&'static str>,
}

impl Flash {
    #[must_use]
    pub fn from_codes(success: Option<&str>, error: Option<&str>) -> Self {
        Self {
            success: success.and_then(flash::success_message),
            error: error.and_then(flash::error_message),
        }
    }
}

impl From<&FlashQuery> for Flash {
    fn from(query: &FlashQuery) -> Self {
        Self::from_codes(query.success.as_deref(), query.error.as_deref())
    }
}

/// Banner codes.
pub mod flash {
    pub const UPDATED: &str = "updated";
    pub const DELETED: &str = "deleted";
    pub const SAVED: &str = "saved";

    pub const UPDATE_FAILED: &str = "update";
    pub const DELETE_FAILED: &str = "delete";
    pub const SAVE_FAILED: &str = "save";
    pub const INVALID_STATUS: &str = "status";

    #[must_use]
    pub fn success_message(code: &str) -> Option<&'static str> {
        match code {
            UPDATED => Some("Status updated."),
            DELETED => Some("Record deleted."),
            SAVED => Some("Settings saved."),
            _ => None,
        }
    }

    #[must_use]
    pub fn error_message(code: &str) -> Option<&'static str> {
        match code {
            UPDATE_FAILED => Some("The update failed. The record was not changed."),
            DELETE_FAILED => Some("The delete failed. The record was not removed."),
            SAVE_FAILED => Some("Settings could not be saved. Nothing was changed."),
            INVALID_STATUS => Some("That status is not recognized."),
            _ => None,
        }
    }
}

// =============================================================================
// Shared view helpers
// =============================================================================

/// One `<option>` of a dropdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// Options for every value of a stored enum, marking `selected`.
#[must_use]
pub fn select_options<T: StoredEnum>(selected: Option<T>) -> Vec<SelectOption> {
    T::VALUES
        .iter()
        .map(|value| SelectOption {
            value: value.key(),
            label: value.display_label(),
            selected: selected == Some(*value),
        })
        .collect()
}

/// One bar of a server-rendered chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarView {
    pub label: String,
    pub count: usize,
    /// Largest count in the chart; the bar is drawn relative to it.
    pub max: usize,
}

/// Scale a list of `(label, count)` pairs against their largest count.
#[must_use]
pub fn bars(points: impl IntoIterator<Item = (String, usize)>) -> Vec<BarView> {
    let points: Vec<(String, usize)> = points.into_iter().collect();
    let max = points.iter().map(|(_, c)| *c).max().unwrap_or(0).max(1);
    points
        .into_iter()
        .map(|(label, count)| BarView { label, count, max })
        .collect()
}

/// Redirect target for a list screen with a banner code.
#[must_use]
pub fn with_banner(path: &str, key: &str, code: &str) -> String {
    format!("{path}?{key}={code}")
}

#[cfg(test)]
mod tests {
    use saasbay_core::ApplicationStatus;

    use super::*;

    #[test]
    fn test_flash_only_known_codes() {
        let flash = Flash::from_codes(Some(flash::UPDATED), Some("<script>"));
        assert_eq!(flash.success, Some("Status updated."));
        assert_eq!(flash.error, None);
    }

    #[test]
    fn test_select_options_marks_selected() {
        let options = select_options(Some(ApplicationStatus::Approved));
        assert_eq!(options.len(), 4);
        assert_eq!(
            options.iter().filter(|o| o.selected).map(|o| o.value).collect::<Vec<_>>(),
            ["approved"]
        );
    }

    #[test]
    fn test_bars_scale_to_max() {
        let chart = bars([("a".to_string(), 2), ("b".to_string(), 5)]);
        assert!(chart.iter().all(|b| b.max == 5));

        let empty = bars([("a".to_string(), 0)]);
        assert_eq!(empty[0].max, 1);
    }
}
