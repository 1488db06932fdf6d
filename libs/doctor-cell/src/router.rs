use std::sync::Arc;

use axum::{routing::get, Router};

use shared_state::AppState;

use crate::handlers;

/// Public route for the landing page; no authentication required.
pub fn user_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/doctors", get(handlers::list_doctors))
        .with_state(state)
}
