//! Customer listing page

use std::sync::Arc;

use axum::{extract::State, response::Html, routing::get, Router};
use tracing::warn;

use crate::db::CustomerRepo;
use crate::http::extractors::CallerDeadline;
use crate::http::server::AppState;
use crate::render::{render_page, ViewModel};

/// GET / - list customers
///
/// Always answers 200: a failed listing is shown inside the page.
async fn index(
    State(state): State<Arc<AppState>>,
    CallerDeadline(ctx): CallerDeadline,
) -> Html<String> {
    let outcome = CustomerRepo::new(&state.pool).page(ctx).await;
    if let Err(e) = &outcome {
        warn!(error = %e, deadline_exceeded = e.is_deadline_exceeded(), "customer listing failed");
    }

    Html(render_page(&ViewModel::from_outcome(outcome)))
}

/// Index routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/", get(index))
}
