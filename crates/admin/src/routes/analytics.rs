//! Analytics screen and its JSON endpoint.
//!
//! Charts cover records created inside the selected window. The headline
//! summary always covers every record.

use askama::Template;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use saasbay_core::metrics::{
    Bucket, DailyCount, MonthlyPoint, Summary, TimeRange, application_status_buckets,
    contact_intent_buckets, contact_status_buckets, daily_series, monthly_trend, plan_buckets,
};
use saasbay_core::{Application, Contact};

use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::state::AppState;

use super::dashboard::AdminUserView;
use super::{BarView, bars, render};

/// Analytics tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Overview,
    Applications,
    Contacts,
    Trends,
}

impl Tab {
    pub const ALL: [Self; 4] = [
        Self::Overview,
        Self::Applications,
        Self::Contacts,
        Self::Trends,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Overview => "overview",
            Self::Applications => "applications",
            Self::Contacts => "contacts",
            Self::Trends => "trends",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Overview => "Overview",
            Self::Applications => "Applications",
            Self::Contacts => "Contacts",
            Self::Trends => "Trends",
        }
    }

    /// Parse a query value; anything unknown shows the overview.
    #[must_use]
    pub fn parse(value: Option<&str>) -> Self {
        value
            .and_then(|v| Self::ALL.into_iter().find(|tab| tab.as_str() == v.trim()))
            .unwrap_or_default()
    }
}

/// Chart data for one time window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsData {
    pub range: &'static str,
    pub summary: Summary,
    pub daily_applications: Vec<DailyCount>,
    pub applications_by_status: Vec<Bucket>,
    pub vendors_by_plan: Vec<Bucket>,
    pub contacts_by_intent: Vec<Bucket>,
    pub contacts_by_status: Vec<Bucket>,
    pub monthly_trends: Vec<MonthlyPoint>,
}

impl AnalyticsData {
    /// Build every chart from records already limited to the window.
    #[must_use]
    pub fn build(
        range: TimeRange,
        applications: &[Application],
        contacts: &[Contact],
        summary: Summary,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            range: range.as_str(),
            summary,
            daily_applications: daily_series(applications.iter().map(|a| a.created_at)),
            applications_by_status: application_status_buckets(applications),
            vendors_by_plan: plan_buckets(applications),
            contacts_by_intent: contact_intent_buckets(contacts),
            contacts_by_status: contact_status_buckets(contacts),
            monthly_trends: monthly_trend(
                applications.iter().map(|a| a.created_at),
                contacts.iter().map(|c| c.created_at),
                now,
            ),
        }
    }
}

/// Fetch the window and the summary concurrently and build the charts.
async fn load(state: &AppState, range: TimeRange) -> Result<AnalyticsData, AppError> {
    let now = Utc::now();
    let cutoff = range.cutoff(now);
    let records = state.records();

    let (applications, contacts, summary) = tokio::try_join!(
        records.applications_since(cutoff),
        records.contacts_since(cutoff),
        records.summary(now),
    )?;

    Ok(AnalyticsData::build(
        range,
        &applications,
        &contacts,
        summary,
        now,
    ))
}

/// Query parameters for both endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct AnalyticsQuery {
    pub range: Option<String>,
    pub tab: Option<String>,
}

impl AnalyticsQuery {
    /// Selected window; unknown values fall back to 30 days.
    fn range(&self) -> TimeRange {
        self.range
            .as_deref()
            .and_then(|r| r.parse().ok())
            .unwrap_or_default()
    }
}

/// Range dropdown option.
#[derive(Debug, Clone)]
pub struct RangeOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// Tab link.
#[derive(Debug, Clone)]
pub struct TabLink {
    pub value: &'static str,
    pub label: &'static str,
    pub active: bool,
}

/// One month of the trend chart, both series scaled together.
#[derive(Debug, Clone)]
pub struct TrendRow {
    pub month: &'static str,
    pub applications: usize,
    pub contacts: usize,
    pub max: usize,
}

/// A titled bar chart.
#[derive(Debug, Clone)]
pub struct ChartView {
    pub title: &'static str,
    pub bars: Vec<BarView>,
}

/// Analytics page template.
#[derive(Template)]
#[template(path = "analytics.html")]
pub struct AnalyticsTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub range: &'static str,
    pub range_label: &'static str,
    pub ranges: Vec<RangeOption>,
    pub tab: &'static str,
    pub tabs: Vec<TabLink>,
    pub summary: Summary,
    pub show_trends: bool,
    pub trends: Vec<TrendRow>,
    /// Bar charts for the selected tab.
    pub charts: Vec<ChartView>,
}

fn bucket_chart(title: &'static str, buckets: &[Bucket]) -> ChartView {
    ChartView {
        title,
        bars: bars(buckets.iter().map(|b| (b.label.to_string(), b.count))),
    }
}

impl Tab {
    /// Bar charts shown on this tab.
    fn charts(self, data: &AnalyticsData) -> Vec<ChartView> {
        match self {
            Self::Overview => vec![
                bucket_chart("Vendors by plan", &data.vendors_by_plan),
                bucket_chart("Applications by status", &data.applications_by_status),
            ],
            Self::Applications => vec![
                bucket_chart("Applications by status", &data.applications_by_status),
                ChartView {
                    title: "Daily applications",
                    bars: bars(
                        data.daily_applications
                            .iter()
                            .map(|d| (d.label.clone(), d.count)),
                    ),
                },
            ],
            Self::Contacts => vec![
                bucket_chart("Contacts by intent", &data.contacts_by_intent),
                bucket_chart("Contacts by status", &data.contacts_by_status),
            ],
            Self::Trends => Vec::new(),
        }
    }

    const fn shows_trends(self) -> bool {
        matches!(self, Self::Overview | Self::Trends)
    }
}

impl AnalyticsTemplate {
    fn build(admin: AdminUserView, range: TimeRange, tab: Tab, data: &AnalyticsData) -> Self {
        let trend_max = data
            .monthly_trends
            .iter()
            .map(|p| p.applications.max(p.contacts))
            .max()
            .unwrap_or(0)
            .max(1);

        Self {
            admin_user: admin,
            current_path: "/admin/analytics".to_string(),
            range: range.as_str(),
            range_label: range.label(),
            ranges: TimeRange::ALL
                .into_iter()
                .map(|r| RangeOption {
                    value: r.as_str(),
                    label: r.label(),
                    selected: r == range,
                })
                .collect(),
            tab: tab.as_str(),
            tabs: Tab::ALL
                .into_iter()
                .map(|t| TabLink {
                    value: t.as_str(),
                    label: t.label(),
                    active: t == tab,
                })
                .collect(),
            summary: data.summary.clone(),
            show_trends: tab.shows_trends(),
            trends: data
                .monthly_trends
                .iter()
                .map(|p| TrendRow {
                    month: p.month,
                    applications: p.applications,
                    contacts: p.contacts,
                    max: trend_max,
                })
                .collect(),
            charts: tab.charts(data),
        }
    }
}

/// Build the analytics router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/analytics", get(analytics_page))
        .route("/api/analytics", get(analytics_json))
}

/// Analytics page.
///
/// GET /admin/analytics
#[instrument(skip(admin, state))]
async fn analytics_page(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Html<String>, AppError> {
    let range = query.range();
    let data = load(&state, range).await?;

    render(&AnalyticsTemplate::build(
        AdminUserView::from(&admin),
        range,
        Tab::parse(query.tab.as_deref()),
        &data,
    ))
}

/// Error response for API endpoints.
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    status: StatusCode,
    pub error: String,
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        err.report();
        Self {
            status: err.status(),
            error: err.public_message(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// Chart data as JSON.
///
/// GET /api/analytics
#[instrument(skip(_admin, state))]
async fn analytics_json(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<AnalyticsData>, ApiError> {
    Ok(Json(load(&state, query.range()).await?))
}
