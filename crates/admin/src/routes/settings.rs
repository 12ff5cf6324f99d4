//! Platform settings routes.
//!
//! The form always shows effective settings: the stored document, or the
//! defaults when nothing has been saved yet. Saving merges into the stored
//! document.

use askama::Template;
use axum::{
    Form, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use serde::Deserialize;
use tracing::instrument;

use saasbay_core::{
    EmailNotifications, PlatformFlags, PlatformSettings, SettingsError, VendorPlan,
};

use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::services::SaveSettingsError;
use crate::state::AppState;

use super::dashboard::AdminUserView;
use super::{Flash, FlashQuery, SelectOption, flash, render, select_options, with_banner};

const SETTINGS_PATH: &str = "/admin/settings";

/// Values shown in the settings form.
///
/// Kept as submitted text so a rejected form is shown back unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsView {
    pub commission_rate: String,
    pub default_vendor_plan: String,
    pub auto_approve_vendors: bool,
    pub notify_new_applications: bool,
    pub notify_new_contacts: bool,
    pub notify_status_updates: bool,
    pub notify_weekly_reports: bool,
    pub site_name: String,
    pub maintenance_mode: bool,
    pub allow_registrations: bool,
    pub require_approval: bool,
}

impl From<&PlatformSettings> for SettingsView {
    fn from(settings: &PlatformSettings) -> Self {
        Self {
            commission_rate: settings.commission_rate.to_string(),
            default_vendor_plan: settings.default_vendor_plan.as_str().to_string(),
            auto_approve_vendors: settings.auto_approve_vendors,
            notify_new_applications: settings.email_notifications.new_applications,
            notify_new_contacts: settings.email_notifications.new_contacts,
            notify_status_updates: settings.email_notifications.status_updates,
            notify_weekly_reports: settings.email_notifications.weekly_reports,
            site_name: settings.platform.site_name.clone(),
            maintenance_mode: settings.platform.maintenance_mode,
            allow_registrations: settings.platform.allow_registrations,
            require_approval: settings.platform.require_approval,
        }
    }
}

/// Settings form body. Unchecked checkboxes are absent.
#[derive(Debug, Default, Deserialize)]
pub struct SettingsForm {
    #[serde(default)]
    pub commission_rate: String,
    #[serde(default)]
    pub default_vendor_plan: String,
    pub auto_approve_vendors: Option<String>,
    pub notify_new_applications: Option<String>,
    pub notify_new_contacts: Option<String>,
    pub notify_status_updates: Option<String>,
    pub notify_weekly_reports: Option<String>,
    #[serde(default)]
    pub site_name: String,
    pub maintenance_mode: Option<String>,
    pub allow_registrations: Option<String>,
    pub require_approval: Option<String>,
}

impl From<&SettingsForm> for SettingsView {
    fn from(form: &SettingsForm) -> Self {
        Self {
            commission_rate: form.commission_rate.clone(),
            default_vendor_plan: form.default_vendor_plan.clone(),
            auto_approve_vendors: form.auto_approve_vendors.is_some(),
            notify_new_applications: form.notify_new_applications.is_some(),
            notify_new_contacts: form.notify_new_contacts.is_some(),
            notify_status_updates: form.notify_status_updates.is_some(),
            notify_weekly_reports: form.notify_weekly_reports.is_some(),
            site_name: form.site_name.clone(),
            maintenance_mode: form.maintenance_mode.is_some(),
            allow_registrations: form.allow_registrations.is_some(),
            require_approval: form.require_approval.is_some(),
        }
    }
}

impl SettingsForm {
    /// Parse the submitted form into settings.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field.
    pub fn parse(&self) -> Result<PlatformSettings, SettingsError> {
        let settings = PlatformSettings {
            commission_rate: PlatformSettings::parse_commission(&self.commission_rate)?,
            default_vendor_plan: PlatformSettings::parse_plan(&self.default_vendor_plan)?,
            auto_approve_vendors: self.auto_approve_vendors.is_some(),
            email_notifications: EmailNotifications {
                new_applications: self.notify_new_applications.is_some(),
                new_contacts: self.notify_new_contacts.is_some(),
                status_updates: self.notify_status_updates.is_some(),
                weekly_reports: self.notify_weekly_reports.is_some(),
            },
            platform: PlatformFlags {
                site_name: self.site_name.trim().to_string(),
                maintenance_mode: self.maintenance_mode.is_some(),
                allow_registrations: self.allow_registrations.is_some(),
                require_approval: self.require_approval.is_some(),
            },
        };
        settings.validate()?;
        Ok(settings)
    }
}

/// Settings page template.
#[derive(Template)]
#[template(path = "settings.html")]
pub struct SettingsTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub settings: SettingsView,
    pub plan_options: Vec<SelectOption>,
    pub flash: Flash,
    /// Validation message for a rejected form.
    pub invalid: Option<String>,
}

impl SettingsTemplate {
    fn new(admin: &AdminUserView, settings: SettingsView, flash: Flash) -> Self {
        let plan = VendorPlan::from_stored(&settings.default_vendor_plan);
        Self {
            admin_user: admin.clone(),
            current_path: SETTINGS_PATH.to_string(),
            plan_options: select_options(plan),
            settings,
            flash,
            invalid: None,
        }
    }
}

/// Build the settings router.
pub fn router() -> Router<AppState> {
    Router::new().route(SETTINGS_PATH, get(settings_page).post(save_settings))
}

/// Settings form.
///
/// GET /admin/settings
#[instrument(skip(admin, state))]
async fn settings_page(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Query(query): Query<FlashQuery>,
) -> Result<Html<String>, AppError> {
    let settings = state.settings().load().await?;

    render(&SettingsTemplate::new(
        &AdminUserView::from(&admin),
        SettingsView::from(&settings),
        Flash::from(&query),
    ))
}

/// Validate and save settings.
///
/// POST /admin/settings
#[instrument(skip(admin, state, form))]
async fn save_settings(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Form(form): Form<SettingsForm>,
) -> Result<Response, AppError> {
    let settings = match form.parse() {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!(error = %e, "Rejected settings form");
            let mut page = SettingsTemplate::new(
                &AdminUserView::from(&admin),
                SettingsView::from(&form),
                Flash::default(),
            );
            page.invalid = Some(e.to_string());
            return Ok((StatusCode::BAD_REQUEST, render(&page)?).into_response());
        }
    };

    let redirect = match state.settings().save(&settings).await {
        Ok(()) => {
            tracing::info!(uid = %admin.uid, "Platform settings saved");
            with_banner(SETTINGS_PATH, "success", flash::SAVED)
        }
        Err(SaveSettingsError::Invalid(e)) => return Err(AppError::Settings(e)),
        Err(e) => {
            AppError::from(e).report();
            with_banner(SETTINGS_PATH, "error", flash::SAVE_FAILED)
        }
    };
    Ok(Redirect::to(&redirect).into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn valid_form() -> SettingsForm {
        SettingsForm {
            commission_rate: " 12 ".to_string(),
            default_vendor_plan: "Pro".to_string(),
            notify_new_contacts: Some("on".to_string()),
            site_name: "  SaaSBay India ".to_string(),
            require_approval: Some("on".to_string()),
            ..SettingsForm::default()
        }
    }

    #[test]
    fn test_parse_valid_form() {
        let settings = valid_form().parse().unwrap();
        assert_eq!(settings.commission_rate, 12);
        assert_eq!(settings.default_vendor_plan, VendorPlan::Pro);
        assert!(!settings.auto_approve_vendors);
        assert!(settings.email_notifications.new_contacts);
        assert!(!settings.email_notifications.new_applications);
        assert_eq!(settings.platform.site_name, "SaaSBay India");
        assert!(settings.platform.require_approval);
    }

    #[test]
    fn test_parse_rejects_bad_commission_and_blank_name() {
        let form = SettingsForm {
            commission_rate: "150".to_string(),
            ..valid_form()
        };
        assert_eq!(
            form.parse().unwrap_err(),
            SettingsError::CommissionOutOfRange(150)
        );

        let form = SettingsForm {
            site_name: "   ".to_string(),
            ..valid_form()
        };
        assert_eq!(form.parse().unwrap_err(), SettingsError::EmptySiteName);
    }

    #[test]
    fn test_view_round_trips_defaults() {
        let view = SettingsView::from(&PlatformSettings::default());
        assert_eq!(view.commission_rate, "15");
        assert_eq!(view.default_vendor_plan, "free");
        assert!(view.allow_registrations);
        assert!(!view.notify_weekly_reports);
    }
}
