//! Auth API handlers

use axum::{Json, extract::State};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::auth::{hash_password, verify_password};
use crate::core::ServerState;
use crate::db::models::{Address, KycDocument, KycStatus, User, UserPublic, UserRole};
use crate::utils::validation::{validate_email, validate_password, validate_required_text};
use crate::utils::{AppError, AppResponse, AppResult, ok, ok_with_message};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: UserRole,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserPublic,
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<ServerState>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<Json<AppResponse<AuthResponse>>> {
    validate_required_text(&req.name, "name", 100)?;
    validate_email(&req.email)?;
    validate_password(&req.password)?;
    if req.role == UserRole::Admin {
        return Err(AppError::forbidden("Admin accounts cannot self-register"));
    }

    let password_hash = hash_password(&req.password)?;
    let mut user = User::new(req.name, req.email, password_hash, req.role);
    user.phone = req.phone;
    user.address = req.address;
    if let Some(language) = req.language {
        user.language = language;
    }

    let user = state.users.create(user).await?;
    let token = state
        .jwt_service
        .generate_token(&user.id_string(), &user.name, user.role)
        .map_err(|e| AppError::internal(format!("Token generation failed: {e}")))?;

    tracing::info!(user = %user.id_string(), role = %user.role.as_str(), "User registered");
    Ok(ok(AuthResponse {
        token,
        user: user.into(),
    }))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<ServerState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<AppResponse<AuthResponse>>> {
    let user = state
        .users
        .find_by_email(&req.email)
        .await?
        .ok_or_else(AppError::invalid_credentials)?;

    if !verify_password(&req.password, &user.password_hash) {
        return Err(AppError::invalid_credentials());
    }
    if !user.is_active {
        return Err(AppError::forbidden("Account is deactivated"));
    }

    let token = state
        .jwt_service
        .generate_token(&user.id_string(), &user.name, user.role)
        .map_err(|e| AppError::internal(format!("Token generation failed: {e}")))?;

    Ok(ok(AuthResponse {
        token,
        user: user.into(),
    }))
}

/// GET /api/auth/profile
pub async fn profile(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<AppResponse<UserPublic>>> {
    let user = state
        .users
        .find_by_id(&user.id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    Ok(ok(user.into()))
}

#[derive(Debug, Deserialize)]
pub struct ProfileUpdateRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<Address>,
    pub language: Option<String>,
}

/// PUT /api/auth/profile
pub async fn update_profile(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(req): Json<ProfileUpdateRequest>,
) -> AppResult<Json<AppResponse<UserPublic>>> {
    let mut user = state
        .users
        .find_by_id(&current.id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    if let Some(name) = req.name {
        validate_required_text(&name, "name", 100)?;
        user.name = name;
    }
    if let Some(phone) = req.phone {
        user.phone = Some(phone);
    }
    if let Some(address) = req.address {
        user.address = Some(address);
    }
    if let Some(language) = req.language {
        user.language = language;
    }

    let user = state.users.update(&user).await?;
    Ok(ok(user.into()))
}

#[derive(Debug, Deserialize)]
pub struct KycRequest {
    pub documents: Vec<KycDocumentRequest>,
}

#[derive(Debug, Deserialize)]
pub struct KycDocumentRequest {
    pub doc_type: String,
    pub url: String,
}

/// POST /api/auth/kyc
///
/// Sellers submit document URLs; the status moves to `pending` until an
/// admin verdict.
pub async fn submit_kyc(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(req): Json<KycRequest>,
) -> AppResult<Json<AppResponse<UserPublic>>> {
    if req.documents.is_empty() {
        return Err(AppError::validation("At least one document is required"));
    }

    let mut user = state
        .users
        .find_by_id(&current.id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    if user.kyc_status == KycStatus::Verified {
        return Err(AppError::state_conflict("KYC is already verified"));
    }

    user.kyc_documents = req
        .documents
        .into_iter()
        .map(|d| KycDocument {
            doc_type: d.doc_type,
            url: d.url,
            uploaded_at: Utc::now(),
        })
        .collect();
    user.kyc_status = KycStatus::Pending;

    let user = state.users.update(&user).await?;
    Ok(ok_with_message(user.into(), "KYC documents submitted"))
}
