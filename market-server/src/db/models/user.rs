use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use super::serde_helpers;

/// Account role, decides which routes and resources a user may touch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Farmer,
    Consumer,
    Trader,
    Admin,
}

impl UserRole {
    pub fn is_seller(&self) -> bool {
        matches!(self, UserRole::Farmer | UserRole::Trader)
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Farmer => "farmer",
            UserRole::Consumer => "consumer",
            UserRole::Trader => "trader",
            UserRole::Admin => "admin",
        }
    }
}

/// KYC verification progress for seller accounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KycStatus {
    NotSubmitted,
    Pending,
    Verified,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KycDocument {
    pub doc_type: String,
    pub url: String,
    pub uploaded_at: DateTime<Utc>,
}

/// Postal address stored on the account
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub pincode: String,
    #[serde(default)]
    pub country: String,
}

/// User record as stored in the database
///
/// `password_hash` stays inside the db layer; API responses go through
/// [`UserPublic`] which never carries it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<Address>,
    /// Preferred notification language (ISO 639-1)
    #[serde(default = "default_language")]
    pub language: String,
    pub kyc_status: KycStatus,
    #[serde(default)]
    pub kyc_documents: Vec<KycDocument>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

fn default_language() -> String {
    "en".to_string()
}

impl User {
    pub fn new(name: String, email: String, password_hash: String, role: UserRole) -> Self {
        Self {
            id: None,
            name,
            email,
            password_hash,
            role,
            phone: None,
            address: None,
            language: default_language(),
            kyc_status: KycStatus::NotSubmitted,
            kyc_documents: Vec::new(),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    pub fn id_string(&self) -> String {
        self.id.as_ref().map(|id| id.to_string()).unwrap_or_default()
    }
}

/// User view safe to return from the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPublic {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub phone: Option<String>,
    pub address: Option<Address>,
    pub language: String,
    pub kyc_status: KycStatus,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserPublic {
    fn from(user: User) -> Self {
        Self {
            id: user.id_string(),
            name: user.name,
            email: user.email,
            role: user.role,
            phone: user.phone,
            address: user.address,
            language: user.language,
            kyc_status: user.kyc_status,
            is_active: user.is_active,
            created_at: user.created_at,
        }
    }
}
