//! Cow listing API handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use validator::Validate;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{Cow, CowCreate, CowUpdate};
use crate::db::repository::CowFilter;
use crate::utils::{AppError, AppResponse, AppResult, ok, ok_with_message};

/// GET /api/cows
pub async fn list(
    State(state): State<ServerState>,
    Query(filter): Query<CowFilter>,
) -> AppResult<Json<AppResponse<Vec<Cow>>>> {
    let cows = state.cows.list(&filter).await?;
    Ok(ok(cows))
}

/// GET /api/cows/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<Cow>>> {
    let cow = state
        .cows
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Listing {id} not found")))?;
    Ok(ok(cow))
}

/// POST /api/cows - farmer or trader
pub async fn create(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(req): Json<CowCreate>,
) -> AppResult<Json<AppResponse<Cow>>> {
    if !current.is_seller() {
        return Err(AppError::forbidden("Only farmers and traders can list cattle"));
    }
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let cow = state.cows.create(req.into_cow(current.id.clone())).await?;
    tracing::info!(cow = %cow.id_string(), seller = %current.id, "Cattle listed");
    Ok(ok(cow))
}

/// PUT /api/cows/{id} - owner or admin
pub async fn update(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<CowUpdate>,
) -> AppResult<Json<AppResponse<Cow>>> {
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let mut cow = state
        .cows
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Listing {id} not found")))?;
    if cow.seller != current.id && !current.is_admin() {
        return Err(AppError::forbidden("Not your listing"));
    }

    req.apply(&mut cow);
    let cow = state.cows.update(&cow).await?;
    Ok(ok(cow))
}

/// DELETE /api/cows/{id} - owner or admin
pub async fn delete(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<()>>> {
    let cow = state
        .cows
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Listing {id} not found")))?;
    if cow.seller != current.id && !current.is_admin() {
        return Err(AppError::forbidden("Not your listing"));
    }

    state.cows.delete(&id).await?;
    Ok(ok_with_message((), "Listing deleted"))
}
