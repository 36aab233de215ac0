//! API routes module

pub mod interactions;
pub mod oauth;

use std::sync::Arc;

use crate::api::state::AppState;
use axum::Router;

type SharedState = Arc<AppState>;

/// Create the combined API router
pub fn router() -> Router<SharedState> {
    Router::new()
        // Discord interactions endpoint
        .nest("/interactions", interactions::router())
        // Google OAuth consent and callback
        .nest("/oauth", oauth::router())
}
