//! Admin API module
//!
//! Everything here sits behind [`crate::auth::require_admin`] on top of the
//! global auth middleware.

mod handler;

use axum::{
    Router, middleware,
    routing::{get, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/admin", admin_routes())
}

fn admin_routes() -> Router<ServerState> {
    Router::new()
        .route("/users", get(handler::list_users))
        .route("/users/{id}/status", put(handler::set_user_status))
        .route("/users/{id}/kyc", put(handler::set_user_kyc))
        .route("/analytics", get(handler::analytics))
        .layer(middleware::from_fn(crate::auth::require_admin))
}
