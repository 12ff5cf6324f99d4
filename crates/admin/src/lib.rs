//! SaaSBay Admin library.
//!
//! This crate provides the admin panel as a library, allowing the binary,
//! the CLI and the integration tests to share one router.
//!
//! # Security
//!
//! This crate can read and modify every vendor application and contact
//! message, and rewrite platform settings. Every page except sign-in sits
//! behind an operator session.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod identity;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;

use std::sync::Arc;

use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tower_sessions::{SessionManagerLayer, SessionStore};
use tracing::Span;

use config::{IdentityBackend, StoreBackend};
use identity::{IdentityError, IdentityGate, LocalIdentity, ToolkitIdentity};
use middleware::{request_id_middleware, security_headers_middleware};
use state::AppState;
use store::memory::SeedError;
use store::{FirestoreStore, MemoryStore, RecordStore, StoreError};

/// Directory served under `/static`, relative to the workspace root.
pub const STATIC_DIR: &str = "crates/admin/static";

/// Errors opening the configured backends.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("record store: {0}")]
    Store(#[from] StoreError),
    #[error("seed data: {0}")]
    Seed(#[from] SeedError),
    #[error("identity service: {0}")]
    Identity(#[from] IdentityError),
}

/// Open the configured record store.
///
/// # Errors
///
/// Returns `StartupError` if the Firestore client cannot be built or the
/// seed file cannot be read.
pub fn open_store(backend: &StoreBackend) -> Result<Arc<dyn RecordStore>, StartupError> {
    let store: Arc<dyn RecordStore> = match backend {
        StoreBackend::Firestore(config) => {
            tracing::info!(project = %config.project_id, "Using Firestore record store");
            Arc::new(FirestoreStore::new(config)?)
        }
        StoreBackend::Memory {
            seed_file: Some(path),
        } => {
            tracing::info!(seed = %path.display(), "Using in-memory record store");
            Arc::new(MemoryStore::from_seed_file(path)?)
        }
        StoreBackend::Memory { seed_file: None } => {
            tracing::warn!("Using empty in-memory record store");
            Arc::new(MemoryStore::new())
        }
    };
    Ok(store)
}

/// Open the configured identity service.
///
/// # Errors
///
/// Returns `StartupError` if the Identity Toolkit client cannot be built.
pub fn open_identity(backend: &IdentityBackend) -> Result<Arc<dyn IdentityGate>, StartupError> {
    let identity: Arc<dyn IdentityGate> = match backend {
        IdentityBackend::Toolkit(config) => Arc::new(ToolkitIdentity::new(config)?),
        IdentityBackend::Local(config) => {
            tracing::warn!(email = %config.email, "Using local operator account");
            Arc::new(LocalIdentity::from_config(config))
        }
    };
    Ok(identity)
}

/// Build the admin router with its middleware stack.
///
/// Layers run outermost first: tracing, request ID, security headers,
/// then the session. Sentry layers are added by the binary.
pub fn build_router<S>(state: AppState, session_layer: SessionManagerLayer<S>) -> Router
where
    S: SessionStore + Clone,
{
    Router::new()
        .merge(routes::routes())
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(session_layer)
        .layer(axum::middleware::from_fn(security_headers_middleware))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri().path(),
                        request_id = tracing::field::Empty,
                        admin_uid = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}
