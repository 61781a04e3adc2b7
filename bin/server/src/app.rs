//! HTTP routing.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, patch, post},
};
use tower_http::trace::TraceLayer;

use crate::auth::{self, AppState};
use crate::user;

/// Builds the API router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/login", post(auth::login))
        .route("/api/register", post(auth::register))
        .route("/api/refreshtoken", post(auth::refresh_token))
        .route("/api/users", get(user::list_users))
        .route(
            "/api/users/{id}",
            get(user::get_user).delete(user::delete_user),
        )
        .route("/api/users/{id}/role", patch(user::update_role))
        .route("/api/users/{id}/ban", patch(user::update_ban))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
