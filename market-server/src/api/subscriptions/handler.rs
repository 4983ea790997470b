//! Subscription API handlers

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::Utc;
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{
    DeliveryTime, ShippingAddress, Subscription, SubscriptionPayment, SubscriptionStatus,
};
use crate::utils::time::parse_date;
use crate::utils::{AppError, AppResponse, AppResult, ok};

#[derive(Debug, Deserialize)]
pub struct SubscriptionCreateRequest {
    pub product_id: String,
    pub quantity: i64,
    pub delivery_time: DeliveryTime,
    /// "YYYY-MM-DD"
    pub start_date: String,
    /// "YYYY-MM-DD", open-ended when absent
    #[serde(default)]
    pub end_date: Option<String>,
    pub shipping_address: ShippingAddress,
    pub payment_method: SubscriptionPayment,
}

/// POST /api/subscriptions
///
/// `price_per_delivery` is frozen at `product.price × quantity`;
/// `next_delivery_date` starts at `start_date`.
pub async fn create(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(req): Json<SubscriptionCreateRequest>,
) -> AppResult<Json<AppResponse<Subscription>>> {
    if req.quantity < 1 {
        return Err(AppError::validation("Quantity must be at least 1"));
    }
    let start = parse_date(&req.start_date)?;
    if let Some(end) = &req.end_date {
        let end = parse_date(end)?;
        if end < start {
            return Err(AppError::validation("end_date is before start_date"));
        }
    }

    let product = state
        .products
        .find_by_id(&req.product_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Product {} not found", req.product_id)))?;
    if !product.is_purchasable(req.quantity) {
        return Err(AppError::insufficient_stock(format!(
            "{} cannot cover {} {} per day right now",
            product.name, req.quantity, product.unit
        )));
    }

    let subscription = state
        .subscriptions
        .create(Subscription {
            id: None,
            subscriber: current.id.clone(),
            product: product.id_string(),
            seller: product.seller.clone(),
            quantity: req.quantity,
            delivery_time: req.delivery_time,
            start_date: req.start_date.clone(),
            end_date: req.end_date,
            status: SubscriptionStatus::Active,
            shipping_address: req.shipping_address,
            price_per_delivery: product.price * req.quantity as f64,
            payment_method: req.payment_method,
            next_delivery_date: req.start_date,
            last_delivery_date: None,
            delivery_count: 0,
            created_at: Utc::now(),
        })
        .await?;

    tracing::info!(
        subscription = %subscription.id_string(),
        subscriber = %current.id,
        "Subscription created"
    );
    Ok(ok(subscription))
}

/// GET /api/subscriptions
pub async fn list(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<Json<AppResponse<Vec<Subscription>>>> {
    let subscriptions = state.subscriptions.list_by_subscriber(&current.id).await?;
    Ok(ok(subscriptions))
}

/// GET /api/subscriptions/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<Subscription>>> {
    let subscription = state
        .subscriptions
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Subscription {id} not found")))?;
    if subscription.subscriber != current.id && !current.is_admin() {
        return Err(AppError::forbidden("Not your subscription"));
    }
    Ok(ok(subscription))
}

#[derive(Debug, Deserialize)]
pub struct SubscriptionStatusRequest {
    /// paused | active | cancelled
    pub status: SubscriptionStatus,
}

/// PUT /api/subscriptions/{id}/status
///
/// Owner-only pause/resume/cancel. Completed and cancelled subscriptions
/// are final.
pub async fn set_status(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<SubscriptionStatusRequest>,
) -> AppResult<Json<AppResponse<Subscription>>> {
    let mut subscription = state
        .subscriptions
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Subscription {id} not found")))?;

    if subscription.subscriber != current.id && !current.is_admin() {
        return Err(AppError::forbidden("Not your subscription"));
    }
    if matches!(
        subscription.status,
        SubscriptionStatus::Cancelled | SubscriptionStatus::Completed
    ) {
        return Err(AppError::state_conflict(
            "Subscription has already ended",
        ));
    }
    if req.status == SubscriptionStatus::Completed {
        return Err(AppError::validation(
            "Completion happens automatically at end_date",
        ));
    }

    subscription.status = req.status;
    let subscription = state.subscriptions.update(&subscription).await?;
    Ok(ok(subscription))
}
