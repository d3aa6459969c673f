pub mod auth;
pub mod config;
pub mod core;
pub mod goals;

use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::core::shared::state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(goals::configure_okr_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
