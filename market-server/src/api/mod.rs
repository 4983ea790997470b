//! API route modules
//!
//! One module per resource, each with a `router()` and a `handler` file.
//! Every handler returns the `{success, data}` envelope from
//! [`crate::utils::error`]; errors map onto status codes in `AppError`.

use axum::Router;
use axum::middleware as axum_middleware;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::core::ServerState;

pub mod admin;
pub mod auth;
pub mod cart;
pub mod certifications;
pub mod chat;
pub mod cows;
pub mod health;
pub mod inventory;
pub mod notifications;
pub mod orders;
pub mod products;
pub mod subscriptions;

// Re-export common types for handlers
pub use crate::utils::{AppResponse, AppResult, ok, ok_with_message};

/// All routes, no middleware and no state
pub fn build_router() -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(products::router())
        .merge(cart::router())
        .merge(orders::router())
        .merge(subscriptions::router())
        .merge(inventory::router())
        .merge(notifications::router())
        .merge(certifications::router())
        .merge(cows::router())
        .merge(admin::router())
        .merge(chat::router())
}

/// Fully configured application: routes plus middleware stack
pub fn build_app(state: &ServerState) -> Router<ServerState> {
    build_router()
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            crate::auth::require_auth,
        ))
}
