//! Liveness endpoint

use axum::{routing::get, Router};

/// GET /healthz - never touches the store
async fn healthz() -> &'static str {
    "ok"
}

/// Health routes
pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/healthz", get(healthz))
}
