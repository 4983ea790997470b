//! Order API handlers

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{DeliveryStatus, Order, PaymentStatus};
use crate::orders::OrderRequest;
use crate::services::GatewayOrder;
use crate::utils::{AppError, AppResponse, AppResult, ok, ok_with_message};

/// POST /api/orders
pub async fn create(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(req): Json<OrderRequest>,
) -> AppResult<Json<AppResponse<Order>>> {
    let order = state.order_service.create(&current.id, req).await?;

    // Confirmation mail is best effort
    if let Ok(Some(user)) = state.users.find_by_id(&current.id).await {
        state.email.send_order_confirmation(&user.email, &order);
    }
    Ok(ok(order))
}

/// GET /api/orders - the caller's orders, newest first
pub async fn list(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<Json<AppResponse<Vec<Order>>>> {
    let orders = if current.is_seller() {
        state.orders.list_by_seller(&current.id, 100).await?
    } else {
        state.orders.list_by_buyer(&current.id, 100).await?
    };
    Ok(ok(orders))
}

/// GET /api/orders/{id} - buyer, item seller or admin
pub async fn get_by_id(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<Order>>> {
    let order = state
        .orders
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {id} not found")))?;

    if order.buyer != current.id && !order.has_seller(&current.id) && !current.is_admin() {
        return Err(AppError::forbidden("Not your order"));
    }
    Ok(ok(order))
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: DeliveryStatus,
    #[serde(default)]
    pub note: Option<String>,
}

/// PUT /api/orders/{id}/status - item seller or admin
pub async fn set_status(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<StatusRequest>,
) -> AppResult<Json<AppResponse<Order>>> {
    let order = state
        .orders
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {id} not found")))?;

    if !order.has_seller(&current.id) && !current.is_admin() {
        return Err(AppError::forbidden("Only the seller can update delivery status"));
    }

    let order = state
        .order_service
        .set_delivery_status(&id, req.status, req.note)
        .await?;
    Ok(ok(order))
}

#[derive(Debug, Deserialize, Default)]
pub struct CancelRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

/// PUT /api/orders/{id}/cancel - buyer or admin
pub async fn cancel(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<CancelRequest>,
) -> AppResult<Json<AppResponse<Order>>> {
    let order = state
        .orders
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {id} not found")))?;

    if order.buyer != current.id && !current.is_admin() {
        return Err(AppError::forbidden("Only the buyer can cancel this order"));
    }

    let order = state.order_service.cancel(&id, req.reason).await?;
    Ok(ok(order))
}

#[derive(Debug, Deserialize)]
pub struct PaymentOrderRequest {
    pub order_id: String,
}

#[derive(Debug, Serialize)]
pub struct PaymentOrderResponse {
    pub key_id: String,
    #[serde(flatten)]
    pub gateway_order: GatewayOrder,
}

/// POST /api/orders/payment/order
///
/// Registers the order with the payment gateway and stores the gateway
/// order id for later verification.
pub async fn create_payment_order(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(req): Json<PaymentOrderRequest>,
) -> AppResult<Json<AppResponse<PaymentOrderResponse>>> {
    let mut order = state
        .orders
        .find_by_id(&req.order_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {} not found", req.order_id)))?;

    if order.buyer != current.id {
        return Err(AppError::forbidden("Not your order"));
    }
    if order.payment_status == PaymentStatus::Completed {
        return Err(AppError::state_conflict("Order is already paid"));
    }

    let gateway_order = state.payment.create_gateway_order(order.total_amount)?;
    order.payment.gateway_order_id = Some(gateway_order.order_id.clone());
    state.orders.update(&order).await?;

    Ok(ok(PaymentOrderResponse {
        key_id: state.payment.key_id().to_string(),
        gateway_order,
    }))
}

#[derive(Debug, Deserialize)]
pub struct VerifyPaymentRequest {
    pub gateway_order_id: String,
    pub gateway_payment_id: String,
    pub signature: String,
}

/// POST /api/orders/payment/verify
///
/// Constant-time HMAC check over `"{order_id}|{payment_id}"`; a valid
/// signature completes the payment.
pub async fn verify_payment(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(req): Json<VerifyPaymentRequest>,
) -> AppResult<Json<AppResponse<Order>>> {
    if !state.payment.verify_signature(
        &req.gateway_order_id,
        &req.gateway_payment_id,
        &req.signature,
    ) {
        return Err(AppError::validation("Payment signature verification failed"));
    }

    let mut order = state
        .orders
        .find_by_gateway_order(&req.gateway_order_id)
        .await?
        .ok_or_else(|| {
            AppError::not_found(format!(
                "No order for gateway order {}",
                req.gateway_order_id
            ))
        })?;

    if order.buyer != current.id {
        return Err(AppError::forbidden("Not your order"));
    }

    order.payment.gateway_payment_id = Some(req.gateway_payment_id);
    order.payment.signature = Some(req.signature);
    order.payment.paid_at = Some(Utc::now());
    order.payment_status = PaymentStatus::Completed;

    let order = state.orders.update(&order).await?;
    tracing::info!(order = %order.id_string(), "Payment verified");
    Ok(ok_with_message(order, "Payment verified"))
}
