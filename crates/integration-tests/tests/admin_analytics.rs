//! Integration tests for the dashboard, analytics and settings screens.

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use saasbay_admin::store::{Collection, SETTINGS_DOC_ID};
use saasbay_core::VendorPlan;
use saasbay_integration_tests::{TestApp, body_json, body_text, location};
use serde_json::json;

/// Three applications (pending, approved, approved) and two messages
/// (new, responded).
async fn marketplace() -> (TestApp, String) {
    let app = TestApp::new();
    let now = Utc::now();
    let day = |n: i64| (now - Duration::days(n)).to_rfc3339();

    app.add_application(
        "a1",
        json!({"companyName": "Acme", "status": "pending", "plan": "free", "createdAt": day(1)}),
    )
    .await;
    app.add_application(
        "a2",
        json!({"companyName": "Birch", "status": "approved", "plan": "pro", "createdAt": day(3)}),
    )
    .await;
    app.add_application(
        "a3",
        json!({"companyName": "Cedar", "status": "approved", "plan": "Pro", "createdAt": day(60)}),
    )
    .await;
    app.add_contact(
        "c1",
        json!({"name": "Meera", "intent": "vendor", "status": "new", "createdAt": day(2)}),
    )
    .await;
    app.add_contact(
        "c2",
        json!({"name": "Dev", "intent": "support", "status": "responded", "createdAt": day(10)}),
    )
    .await;

    let cookie = app.login().await;
    (app, cookie)
}

// =============================================================================
// Summary
// =============================================================================

#[tokio::test]
async fn test_summary_end_to_end() {
    let (app, cookie) = marketplace().await;

    let response = app.get("/api/analytics?range=30d", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let data = body_json(response).await;

    let summary = &data["summary"];
    assert_eq!(summary["totalApplications"], 3);
    assert_eq!(summary["approvedApplications"], 2);
    assert_eq!(summary["pendingApplications"], 1);
    assert_eq!(summary["conversionRate"], 67);
    assert_eq!(summary["totalContacts"], 2);
    assert_eq!(summary["newContacts"], 1);
    assert_eq!(summary["thisWeekApplications"], 2);
    assert_eq!(data["range"], "30d");
}

#[tokio::test]
async fn test_charts_cover_selected_window() {
    let (app, cookie) = marketplace().await;

    let data = body_json(app.get("/api/analytics?range=7d", Some(&cookie)).await).await;
    let statuses = data["applicationsByStatus"].as_array().unwrap();
    let count = |key: &str| {
        statuses
            .iter()
            .find(|b| b["key"] == key)
            .map_or(0, |b| b["count"].as_u64().unwrap())
    };
    assert_eq!(count("pending"), 1);
    assert_eq!(count("approved"), 1);

    // Summary still covers every record
    assert_eq!(data["summary"]["totalApplications"], 3);

    let data = body_json(app.get("/api/analytics?range=90d", Some(&cookie)).await).await;
    let plans = data["vendorsByPlan"].as_array().unwrap();
    let pro = plans.iter().find(|b| b["key"] == "pro").unwrap();
    assert_eq!(pro["count"], 2);
}

#[tokio::test]
async fn test_unknown_range_falls_back_to_thirty_days() {
    let (app, cookie) = marketplace().await;
    let data = body_json(app.get("/api/analytics?range=forever", Some(&cookie)).await).await;
    assert_eq!(data["range"], "30d");
}

#[tokio::test]
async fn test_dashboard_shows_counts() {
    let (app, cookie) = marketplace().await;

    let response = app.get("/admin", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("67%"));
    assert!(body.contains("Acme"));
    assert!(body.contains("Meera"));
    // One pending application is under the review alert threshold
    assert!(!body.contains("need review"));
}

#[tokio::test]
async fn test_analytics_tabs_render() {
    let (app, cookie) = marketplace().await;

    for tab in ["overview", "applications", "contacts", "trends"] {
        let path = format!("/admin/analytics?range=90d&tab={tab}");
        let response = app.get(&path, Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::OK, "{tab}");
        let body = body_text(response).await;
        assert!(body.contains("Last 3 months"), "{tab}");
    }
}

// =============================================================================
// Settings
// =============================================================================

#[tokio::test]
async fn test_settings_default_then_save() {
    let (app, cookie) = marketplace().await;

    let body = body_text(app.get("/admin/settings", Some(&cookie)).await).await;
    assert!(body.contains("value=\"15\""));

    let form = "commission_rate=12&default_vendor_plan=basic&site_name=SaaSBay+India\
                &notify_new_contacts=on&require_approval=on";
    let response = app.post_form("/admin/settings", form, Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/admin/settings?success=saved"));

    let settings = app.state.settings().load().await.unwrap();
    assert_eq!(settings.commission_rate, 12);
    assert_eq!(settings.platform.site_name, "SaaSBay India");
    assert!(!settings.auto_approve_vendors);

    let body = body_text(
        app.get("/admin/settings?success=saved", Some(&cookie))
            .await,
    )
    .await;
    assert!(body.contains("Settings saved."));
    assert!(body.contains("SaaSBay India"));
}

#[tokio::test]
async fn test_settings_rejects_out_of_range_commission() {
    let (app, cookie) = marketplace().await;

    let form = "commission_rate=140&default_vendor_plan=free&site_name=SaaSBay";
    let response = app.post_form("/admin/settings", form, Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_text(response).await;
    assert!(body.contains("value=\"140\""));

    let settings = app.state.settings().load().await.unwrap();
    assert_eq!(settings.commission_rate, 15);
}

#[tokio::test]
async fn test_settings_save_failure_shows_banner() {
    let (app, cookie) = marketplace().await;
    app.store.set_fail_writes(true);

    let form = "commission_rate=10&default_vendor_plan=free&site_name=SaaSBay";
    let response = app.post_form("/admin/settings", form, Some(&cookie)).await;
    assert_eq!(location(&response), Some("/admin/settings?error=save"));
}

#[tokio::test]
async fn test_settings_with_unusable_fields_still_render() {
    let (app, cookie) = marketplace().await;
    app.store
        .insert(
            Collection::Settings,
            SETTINGS_DOC_ID,
            json!({"commissionRate": null, "defaultVendorPlan": "free"}),
        )
        .await;

    let response = app.get("/admin/settings", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("value=\"15\""));

    app.store
        .insert(
            Collection::Settings,
            SETTINGS_DOC_ID,
            json!({"commissionRate": 12, "defaultVendorPlan": "Pro"}),
        )
        .await;

    let response = app.get("/admin/settings", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("value=\"12\""));

    let settings = app.state.settings().load().await.unwrap();
    assert_eq!(settings.default_vendor_plan, VendorPlan::Pro);
}
