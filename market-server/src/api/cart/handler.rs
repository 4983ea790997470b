//! Cart API handlers
//!
//! The cart is a per-user singleton created on first access. Lines snapshot
//! price, unit and name at add time; totals are recomputed on every
//! mutation.

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::Utc;
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{Cart, CartItem};
use crate::utils::{AppError, AppResponse, AppResult, ok};

/// GET /api/cart
pub async fn get_cart(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<Json<AppResponse<Cart>>> {
    let cart = state.carts.find_or_create(&current.id).await?;
    Ok(ok(cart))
}

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: String,
    pub quantity: i64,
}

/// POST /api/cart/items
///
/// Stock-checked against the merged quantity, so adding 3 to an existing
/// line of 4 needs 7 in stock.
pub async fn add_item(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(req): Json<AddItemRequest>,
) -> AppResult<Json<AppResponse<Cart>>> {
    if req.quantity < 1 {
        return Err(AppError::validation("Quantity must be at least 1"));
    }

    let product = state
        .products
        .find_by_id(&req.product_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Product {} not found", req.product_id)))?;

    let mut cart = state.carts.find_or_create(&current.id).await?;
    let existing = cart
        .items
        .iter()
        .find(|i| i.product == product.id_string())
        .map(|i| i.quantity)
        .unwrap_or(0);

    if !product.is_purchasable(existing + req.quantity) {
        return Err(AppError::insufficient_stock(format!(
            "Only {} {} of {} available",
            product.stock, product.unit, product.name
        )));
    }

    cart.add_item(CartItem {
        product: product.id_string(),
        quantity: req.quantity,
        price_snapshot: product.price,
        unit_snapshot: product.unit,
        name_snapshot: product.name,
        added_at: Utc::now(),
    });

    let cart = state.carts.update(&cart).await?;
    Ok(ok(cart))
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: i64,
}

/// PUT /api/cart/items/{product_id}
pub async fn update_item(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(product_id): Path<String>,
    Json(req): Json<UpdateItemRequest>,
) -> AppResult<Json<AppResponse<Cart>>> {
    if req.quantity < 1 {
        return Err(AppError::validation("Quantity must be at least 1"));
    }

    let product = state
        .products
        .find_by_id(&product_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Product {product_id} not found")))?;
    if !product.is_purchasable(req.quantity) {
        return Err(AppError::insufficient_stock(format!(
            "Only {} {} of {} available",
            product.stock, product.unit, product.name
        )));
    }

    let mut cart = state.carts.find_or_create(&current.id).await?;
    if !cart.update_quantity(&product.id_string(), req.quantity) {
        return Err(AppError::not_found("Product is not in the cart"));
    }

    let cart = state.carts.update(&cart).await?;
    Ok(ok(cart))
}

/// DELETE /api/cart/items/{product_id}
pub async fn remove_item(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(product_id): Path<String>,
) -> AppResult<Json<AppResponse<Cart>>> {
    let mut cart = state.carts.find_or_create(&current.id).await?;
    if !cart.remove_item(&product_id) {
        return Err(AppError::not_found("Product is not in the cart"));
    }
    let cart = state.carts.update(&cart).await?;
    Ok(ok(cart))
}

/// DELETE /api/cart
pub async fn clear(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<Json<AppResponse<Cart>>> {
    let mut cart = state.carts.find_or_create(&current.id).await?;
    cart.clear();
    let cart = state.carts.update(&cart).await?;
    Ok(ok(cart))
}
