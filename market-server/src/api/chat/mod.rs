//! Chatbot API module

mod handler;

use axum::{
    Router,
    routing::{delete, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/chat", chat_routes())
}

fn chat_routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::ask))
        .route("/history", delete(handler::clear_history))
}
