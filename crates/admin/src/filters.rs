//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Placeholder for record fields left blank.
pub const BLANK: &str = "Not provided";

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Shows "Not provided" for blank values.
///
/// Usage in templates: `{{ application.tax_id|or_blank }}`
#[askama::filter_fn]
pub fn or_blank(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let text = value.to_string();
    if text.trim().is_empty() {
        Ok(BLANK.to_string())
    } else {
        Ok(text)
    }
}
