//! Inventory API module
//!
//! Farmer-facing stock management on top of the append-only ledger.

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/inventory", inventory_routes())
}

fn inventory_routes() -> Router<ServerState> {
    Router::new()
        .route("/adjust", post(handler::adjust))
        .route("/history/{product_id}", get(handler::history))
        .route("/expiring", get(handler::expiring))
        .route("/reorder-suggestions", get(handler::reorder_suggestions))
        .route("/analytics/{product_id}", get(handler::analytics))
}
