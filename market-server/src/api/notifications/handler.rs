//! Notification API handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::Notification;
use crate::utils::{AppError, AppResponse, AppResult, ok, ok_with_message};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub unread: bool,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// GET /api/notifications
pub async fn list(
    State(state): State<ServerState>,
    current: CurrentUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<AppResponse<Vec<Notification>>>> {
    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let notifications = state
        .notifications
        .list_by_user(&current.id, query.unread, limit)
        .await?;
    Ok(ok(notifications))
}

async fn owned_notification(
    state: &ServerState,
    current: &CurrentUser,
    id: &str,
) -> AppResult<Notification> {
    let notification = state
        .notifications
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Notification {id} not found")))?;
    if notification.user != current.id {
        return Err(AppError::forbidden("Not your notification"));
    }
    Ok(notification)
}

/// PUT /api/notifications/{id}/read
pub async fn mark_read(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<Notification>>> {
    let mut notification = owned_notification(&state, &current, &id).await?;
    notification.mark_read();
    let notification = state.notifications.update(&notification).await?;
    Ok(ok(notification))
}

/// PUT /api/notifications/read-all
pub async fn mark_all_read(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<Json<AppResponse<()>>> {
    state.notifications.mark_all_read(&current.id).await?;
    Ok(ok_with_message((), "All notifications marked read"))
}

/// DELETE /api/notifications/{id}
pub async fn delete(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<()>>> {
    let notification = owned_notification(&state, &current, &id).await?;
    state.notifications.delete(&notification.id_string()).await?;
    Ok(ok_with_message((), "Notification deleted"))
}
