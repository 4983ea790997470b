use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;
use validator::Validate;

use super::serde_helpers;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Pending,
    Approved,
    Rejected,
}

/// Quality certification attached to a product
///
/// Approval marks the product `is_verified` and may unlock premium pricing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Certification {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    /// Product id (`product:key`)
    pub product: String,
    /// Submitting farmer user id (`user:key`)
    pub farmer: String,
    #[serde(default)]
    pub fat_test_report: Option<String>,
    #[serde(default)]
    pub lab_certification: Option<String>,
    pub verification_status: VerificationStatus,
    /// Admin user id that verified (`user:key`)
    #[serde(default)]
    pub verified_by: Option<String>,
    #[serde(default)]
    pub verification_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub rejection_reason: Option<String>,
    pub premium_pricing_enabled: bool,
    pub created_at: DateTime<Utc>,
}

impl Certification {
    pub fn id_string(&self) -> String {
        self.id.as_ref().map(|id| id.to_string()).unwrap_or_default()
    }
}

/// Submission payload
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CertificationCreate {
    pub product_id: String,
    #[validate(url)]
    pub fat_test_report: Option<String>,
    #[validate(url)]
    pub lab_certification: Option<String>,
}

impl CertificationCreate {
    pub fn into_certification(self, farmer: String) -> Certification {
        Certification {
            id: None,
            product: self.product_id,
            farmer,
            fat_test_report: self.fat_test_report,
            lab_certification: self.lab_certification,
            verification_status: VerificationStatus::Pending,
            verified_by: None,
            verification_date: None,
            rejection_reason: None,
            premium_pricing_enabled: false,
            created_at: Utc::now(),
        }
    }
}
