//! Integration tests for SaaSBay Admin.
//!
//! Drives the full admin router in-process: in-memory record store,
//! in-memory sessions and a local operator account. No network or
//! database is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p saasbay-integration-tests
//! ```

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header};
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;

use saasbay_admin::build_router;
use saasbay_admin::identity::LocalIdentity;
use saasbay_admin::middleware::session_layer;
use saasbay_admin::state::AppState;
use saasbay_admin::store::{Collection, MemoryStore};
use saasbay_core::Email;

/// Operator account accepted by the test identity service.
pub const OPERATOR_EMAIL: &str = "ops@saasbay.in";
pub const OPERATOR_PASSWORD: &str = "correct horse battery staple";

const BODY_LIMIT: usize = 1024 * 1024;

/// The admin router over in-memory backends.
pub struct TestApp {
    pub store: MemoryStore,
    pub state: AppState,
    router: Router,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    #[must_use]
    pub fn new() -> Self {
        let store = MemoryStore::new();
        let identity = LocalIdentity::new(
            Email::parse(OPERATOR_EMAIL).unwrap(),
            SecretString::from(OPERATOR_PASSWORD),
        )
        .with_display_name("Ops Team");
        let state = AppState::new(Arc::new(store.clone()), Arc::new(identity));
        let sessions = session_layer(tower_sessions::MemoryStore::default(), false);
        let router = build_router(state.clone(), sessions);
        Self {
            store,
            state,
            router,
        }
    }

    /// Insert a vendor application document.
    pub async fn add_application(&self, id: &str, fields: Value) {
        self.store
            .insert(Collection::Applications, id, fields)
            .await;
    }

    /// Insert a contact message document.
    pub async fn add_contact(&self, id: &str, fields: Value) {
        self.store.insert(Collection::Contacts, id, fields).await;
    }

    /// Send a request through the router.
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, path: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().method("GET").uri(path);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(&self, path: &str, form: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(form.to_owned())).unwrap())
            .await
    }

    /// Sign in as the operator and return the session cookie.
    pub async fn login(&self) -> String {
        let form = format!(
            "email={}&password={}",
            OPERATOR_EMAIL.replace('@', "%40"),
            OPERATOR_PASSWORD.replace(' ', "+")
        );
        let response = self.post_form("/login", &form, None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), Some("/admin"));
        session_cookie(&response).expect("login sets a session cookie")
    }
}

/// The `name=value` pair of the first `Set-Cookie` header.
#[must_use]
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)?
        .to_str()
        .ok()?
        .split(';')
        .next()
        .map(str::to_owned)
}

/// The `Location` header of a redirect.
#[must_use]
pub fn location(response: &Response<Body>) -> Option<&str> {
    response.headers().get(header::LOCATION)?.to_str().ok()
}

/// Read the whole body as UTF-8.
pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), BODY_LIMIT)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Read the whole body as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), BODY_LIMIT)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
