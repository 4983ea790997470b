//! Product API handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::Utc;
use serde::Deserialize;
use validator::Validate;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{
    Product, ProductCreate, ProductUpdate, Rating, RelatedModel, StockChangeKind,
};
use crate::db::repository::ProductFilter;
use crate::inventory::StockChange;
use crate::utils::{AppError, AppResponse, AppResult, ok, ok_with_message};

/// GET /api/products
pub async fn list(
    State(state): State<ServerState>,
    Query(filter): Query<ProductFilter>,
) -> AppResult<Json<AppResponse<Vec<Product>>>> {
    let products = state.products.list(&filter).await?;
    Ok(ok(products))
}

/// GET /api/products/featured
pub async fn featured(
    State(state): State<ServerState>,
) -> AppResult<Json<AppResponse<Vec<Product>>>> {
    let products = state.products.featured(8).await?;
    Ok(ok(products))
}

/// GET /api/products/mine - the seller's own listings, any status
pub async fn list_mine(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<Json<AppResponse<Vec<Product>>>> {
    if !current.is_seller() && !current.is_admin() {
        return Err(AppError::forbidden("Seller account required"));
    }
    let products = state.products.list_by_seller(&current.id).await?;
    Ok(ok(products))
}

/// GET /api/products/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<Product>>> {
    let product = state
        .products
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Product {id} not found")))?;
    Ok(ok(product))
}

/// POST /api/products
///
/// Farmer only. A non-zero `initial_stock` goes through the ledger as an
/// opening `purchase` entry.
pub async fn create(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(req): Json<ProductCreate>,
) -> AppResult<Json<AppResponse<Product>>> {
    if !current.is_seller() {
        return Err(AppError::forbidden("Only sellers can list products"));
    }
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let initial_stock = req.initial_stock;
    let product = state.products.create(req.into_product(current.id.clone())).await?;

    if initial_stock > 0 {
        state
            .ledger
            .apply(
                StockChange::new(
                    product.id_string(),
                    StockChangeKind::Purchase,
                    initial_stock,
                )
                .with_reason("Opening stock")
                .attributed_to(product.id_string(), RelatedModel::Manual)
                .performed_by(current.id.clone()),
            )
            .await?;
    }

    // Re-read so the response carries the opening stock level
    let product = state
        .products
        .find_by_id(&product.id_string())
        .await?
        .ok_or_else(|| AppError::internal("Product vanished after creation"))?;

    tracing::info!(product = %product.id_string(), seller = %current.id, "Product listed");
    Ok(ok(product))
}

/// PUT /api/products/{id} - owner or admin
pub async fn update(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<ProductUpdate>,
) -> AppResult<Json<AppResponse<Product>>> {
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let mut product = state
        .products
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Product {id} not found")))?;

    if product.seller != current.id && !current.is_admin() {
        return Err(AppError::forbidden("Not your product"));
    }
    // Moderation state is admin territory
    if req.status.is_some() && !current.is_admin() {
        return Err(AppError::forbidden("Only admins can change listing status"));
    }

    req.apply(&mut product);
    let product = state.products.update(&product).await?;
    Ok(ok(product))
}

/// DELETE /api/products/{id} - owner or admin
pub async fn delete(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<()>>> {
    let product = state
        .products
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Product {id} not found")))?;

    if product.seller != current.id && !current.is_admin() {
        return Err(AppError::forbidden("Not your product"));
    }

    state.products.delete(&id).await?;
    Ok(ok_with_message((), "Product deleted"))
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub rating: u8,
    #[serde(default)]
    pub comment: Option<String>,
}

/// POST /api/products/{id}/reviews
///
/// One review per user; the embedded average is recomputed on write.
pub async fn add_review(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<ReviewRequest>,
) -> AppResult<Json<AppResponse<Product>>> {
    if !(1..=5).contains(&req.rating) {
        return Err(AppError::validation("Rating must be between 1 and 5"));
    }

    let mut product = state
        .products
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Product {id} not found")))?;

    if product.seller == current.id {
        return Err(AppError::forbidden("You cannot review your own product"));
    }
    if product.ratings.iter().any(|r| r.user == current.id) {
        return Err(AppError::conflict("You have already reviewed this product"));
    }

    product.ratings.push(Rating {
        user: current.id,
        rating: req.rating,
        comment: req.comment,
        created_at: Utc::now(),
    });
    product.recompute_rating();

    let product = state.products.update(&product).await?;
    Ok(ok(product))
}
