//! HTTP trigger surface: a health probe and a token-gated sync endpoint.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use subtle::ConstantTimeEq;

use crate::Config;
use crate::runner::{execute_sync, render_report};

/// Shared state for the HTTP surface.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/sync", get(trigger_sync))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct SyncParams {
    token: Option<String>,
    #[serde(default)]
    days_back: u32,
}

/// GET /healthz
async fn healthz() -> Response {
    (StatusCode::OK, "OK").into_response()
}

/// GET /sync?token=...&days_back=N
///
/// Runs one sync pass and answers with the same plain-text lines the CLI
/// prints.
async fn trigger_sync(
    State(state): State<AppState>,
    Query(params): Query<SyncParams>,
) -> Response {
    if !token_matches(params.token.as_deref(), &state.config.shared_secret) {
        return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
    }

    match execute_sync(&state.config, params.days_back).await {
        Ok(report) => (
            StatusCode::OK,
            render_report(&report, &state.config.jira_host),
        )
            .into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("sync failed: {err:#}"),
        )
            .into_response(),
    }
}

/// Compares the query token against the shared secret in constant time.
///
/// An unset secret never authorizes.
fn token_matches(provided: Option<&str>, secret: &str) -> bool {
    if secret.is_empty() {
        return false;
    }
    let Some(provided) = provided else {
        return false;
    };
    provided.as_bytes().ct_eq(secret.as_bytes()).into()
}
