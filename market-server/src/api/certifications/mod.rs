//! Certification API module

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/certifications", certification_routes())
}

fn certification_routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::create))
        .route("/product/{product_id}", get(handler::get_for_product))
        .route("/{id}/verify", put(handler::verify))
}
