//! Certification API handlers

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::Utc;
use serde::Deserialize;
use validator::Validate;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{Certification, CertificationCreate, VerificationStatus};
use crate::utils::{AppError, AppResponse, AppResult, ok};

/// POST /api/certifications - farmer submits documents for one product
pub async fn create(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(req): Json<CertificationCreate>,
) -> AppResult<Json<AppResponse<Certification>>> {
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;
    if req.fat_test_report.is_none() && req.lab_certification.is_none() {
        return Err(AppError::validation("At least one document is required"));
    }

    let product = state
        .products
        .find_by_id(&req.product_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Product {} not found", req.product_id)))?;
    if product.seller != current.id {
        return Err(AppError::forbidden("Not your product"));
    }

    let certification = state
        .certifications
        .create(req.into_certification(current.id))
        .await?;

    // Link the product to its latest submission
    let mut product = product;
    product.certification = Some(certification.id_string());
    state.products.update(&product).await?;

    Ok(ok(certification))
}

/// GET /api/certifications/product/{product_id} - latest submission
pub async fn get_for_product(
    State(state): State<ServerState>,
    Path(product_id): Path<String>,
) -> AppResult<Json<AppResponse<Certification>>> {
    let certification = state
        .certifications
        .find_by_product(&product_id)
        .await?
        .ok_or_else(|| {
            AppError::not_found(format!("No certification for product {product_id}"))
        })?;
    Ok(ok(certification))
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub approve: bool,
    #[serde(default)]
    pub rejection_reason: Option<String>,
    #[serde(default)]
    pub premium_pricing_enabled: bool,
}

/// PUT /api/certifications/{id}/verify - admin verdict
///
/// Approval marks the product `is_verified`.
pub async fn verify(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<VerifyRequest>,
) -> AppResult<Json<AppResponse<Certification>>> {
    if !current.is_admin() {
        return Err(AppError::forbidden("Admin access required"));
    }

    let mut certification = state
        .certifications
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Certification {id} not found")))?;

    if certification.verification_status != VerificationStatus::Pending {
        return Err(AppError::state_conflict("Certification already reviewed"));
    }

    certification.verified_by = Some(current.id);
    certification.verification_date = Some(Utc::now());
    if req.approve {
        certification.verification_status = VerificationStatus::Approved;
        certification.premium_pricing_enabled = req.premium_pricing_enabled;
    } else {
        certification.verification_status = VerificationStatus::Rejected;
        certification.rejection_reason = req.rejection_reason;
    }

    let certification = state.certifications.update(&certification).await?;

    if certification.verification_status == VerificationStatus::Approved
        && let Some(mut product) = state.products.find_by_id(&certification.product).await?
    {
        product.is_verified = true;
        state.products.update(&product).await?;
    }

    Ok(ok(certification))
}
