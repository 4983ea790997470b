//! Inventory API handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{Batch, Product, RelatedModel, StockChangeKind, StockEntry};
use crate::db::repository::HistoryFilter;
use crate::inventory::StockChange;
use crate::inventory::analytics::{ProductAnalytics, ReorderSuggestion};
use crate::utils::{AppError, AppResponse, AppResult, ok};

/// Load a product and check the caller may manage its stock
async fn owned_product(
    state: &ServerState,
    current: &CurrentUser,
    product_id: &str,
) -> AppResult<Product> {
    let product = state
        .products
        .find_by_id(product_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Product {product_id} not found")))?;
    if product.seller != current.id && !current.is_admin() {
        return Err(AppError::forbidden("Not your product"));
    }
    Ok(product)
}

#[derive(Debug, Deserialize)]
pub struct AdjustRequest {
    pub product_id: String,
    pub kind: StockChangeKind,
    /// Magnitude; sign is imposed by `kind` except for adjustments
    pub quantity: i64,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub batch: Option<Batch>,
}

/// POST /api/inventory/adjust
pub async fn adjust(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(req): Json<AdjustRequest>,
) -> AppResult<Json<AppResponse<StockEntry>>> {
    if req.quantity == 0 {
        return Err(AppError::validation("Quantity must be non-zero"));
    }
    let product = owned_product(&state, &current, &req.product_id).await?;

    let mut change = StockChange::new(product.id_string(), req.kind, req.quantity)
        .attributed_to(product.id_string(), RelatedModel::Manual)
        .performed_by(current.id);
    if let Some(reason) = req.reason {
        change = change.with_reason(reason);
    }
    if let Some(batch) = req.batch {
        change = change.with_batch(batch);
    }
    change.notes = req.notes;

    let entry = state.ledger.apply(change).await?;
    Ok(ok(entry))
}

/// GET /api/inventory/history/{product_id}
pub async fn history(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(product_id): Path<String>,
    Query(filter): Query<HistoryFilter>,
) -> AppResult<Json<AppResponse<Vec<StockEntry>>>> {
    let product = owned_product(&state, &current, &product_id).await?;
    let entries = state
        .stock_entries
        .history(&product.id_string(), &filter)
        .await?;
    Ok(ok(entries))
}

#[derive(Debug, Deserialize)]
pub struct ExpiringQuery {
    /// Days ahead to look, default 7
    #[serde(default)]
    pub days: Option<i64>,
}

/// GET /api/inventory/expiring
pub async fn expiring(
    State(state): State<ServerState>,
    current: CurrentUser,
    Query(query): Query<ExpiringQuery>,
) -> AppResult<Json<AppResponse<Vec<StockEntry>>>> {
    if !current.is_seller() && !current.is_admin() {
        return Err(AppError::forbidden("Seller account required"));
    }
    let days = query.days.unwrap_or(7).clamp(1, 90);
    let entries = state.analytics.expiring_batches(&current.id, days).await?;
    Ok(ok(entries))
}

/// GET /api/inventory/reorder-suggestions
pub async fn reorder_suggestions(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<Json<AppResponse<Vec<ReorderSuggestion>>>> {
    if !current.is_seller() && !current.is_admin() {
        return Err(AppError::forbidden("Seller account required"));
    }
    let suggestions = state.analytics.reorder_suggestions(&current.id).await?;
    Ok(ok(suggestions))
}

/// GET /api/inventory/analytics/{product_id}
pub async fn analytics(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(product_id): Path<String>,
) -> AppResult<Json<AppResponse<ProductAnalytics>>> {
    let product = owned_product(&state, &current, &product_id).await?;
    let analytics = state.analytics.product_analytics(&product.id_string()).await?;
    Ok(ok(analytics))
}
