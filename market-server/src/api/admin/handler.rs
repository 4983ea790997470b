//! Admin API handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use crate::core::ServerState;
use crate::db::models::{KycStatus, UserPublic, UserRole};
use crate::utils::{AppResponse, AppResult, ok, ok_with_message};

#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    #[serde(default)]
    pub role: Option<UserRole>,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// GET /api/admin/users
pub async fn list_users(
    State(state): State<ServerState>,
    Query(query): Query<UserListQuery>,
) -> AppResult<Json<AppResponse<Vec<UserPublic>>>> {
    let limit = query.limit.unwrap_or(100).clamp(1, 500);
    let users = state.users.list(query.role, limit).await?;
    Ok(ok(users.into_iter().map(UserPublic::from).collect()))
}

#[derive(Debug, Deserialize)]
pub struct UserStatusRequest {
    pub is_active: bool,
}

/// PUT /api/admin/users/{id}/status - activate or deactivate an account
pub async fn set_user_status(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(req): Json<UserStatusRequest>,
) -> AppResult<Json<AppResponse<UserPublic>>> {
    let user = state.users.set_active(&id, req.is_active).await?;
    tracing::info!(user = %id, is_active = req.is_active, "Account status changed");
    Ok(ok(user.into()))
}

#[derive(Debug, Deserialize)]
pub struct UserKycRequest {
    pub kyc_status: KycStatus,
}

/// PUT /api/admin/users/{id}/kyc - KYC verdict
pub async fn set_user_kyc(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(req): Json<UserKycRequest>,
) -> AppResult<Json<AppResponse<UserPublic>>> {
    let user = state.users.set_kyc_status(&id, req.kyc_status).await?;
    Ok(ok_with_message(user.into(), "KYC status updated"))
}

#[derive(Debug, Serialize)]
pub struct PlatformAnalytics {
    pub total_users: usize,
    pub total_products: usize,
    pub total_orders: usize,
    pub total_cows: usize,
    pub active_subscriptions: usize,
    pub total_revenue: f64,
}

/// GET /api/admin/analytics - platform-wide counts
pub async fn analytics(
    State(state): State<ServerState>,
) -> AppResult<Json<AppResponse<PlatformAnalytics>>> {
    Ok(ok(PlatformAnalytics {
        total_users: state.users.count().await?,
        total_products: state.products.count().await?,
        total_orders: state.orders.count().await?,
        total_cows: state.cows.count().await?,
        active_subscriptions: state.subscriptions.count_active().await?,
        total_revenue: state.orders.total_revenue().await?,
    }))
}
