//! Chatbot API handlers

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::utils::{AppError, AppResponse, AppResult, ok, ok_with_message};

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub reply: String,
}

/// POST /api/chat
pub async fn ask(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(req): Json<ChatRequest>,
) -> AppResult<Json<AppResponse<ChatReply>>> {
    let message = req.message.trim();
    if message.is_empty() {
        return Err(AppError::validation("Message must not be empty"));
    }
    if message.len() > 2000 {
        return Err(AppError::validation("Message is too long"));
    }

    let reply = state.chat.answer(&current.id, message).await?;
    Ok(ok(ChatReply { reply }))
}

/// DELETE /api/chat/history
pub async fn clear_history(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<Json<AppResponse<()>>> {
    state.chat.clear_history(&current.id);
    Ok(ok_with_message((), "Chat history cleared"))
}
