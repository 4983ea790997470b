//! Payment gateway integration
//!
//! Gateway order creation and HMAC-SHA256 signature verification. The
//! gateway signs `"{order_id}|{payment_id}"` with the shared key secret;
//! verification runs through `ring::hmac::verify`, which compares in
//! constant time.

use ring::hmac;
use serde::Serialize;
use uuid::Uuid;

use crate::utils::{AppError, AppResult};

/// Order registered with the payment gateway
#[derive(Debug, Clone, Serialize)]
pub struct GatewayOrder {
    pub order_id: String,
    /// Amount in paise
    pub amount: i64,
    pub currency: String,
}

#[derive(Clone)]
pub struct PaymentService {
    key_id: String,
    key: hmac::Key,
}

impl PaymentService {
    pub fn new(key_id: impl Into<String>, key_secret: &str) -> Self {
        Self {
            key_id: key_id.into(),
            key: hmac::Key::new(hmac::HMAC_SHA256, key_secret.as_bytes()),
        }
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Register an order with the gateway
    pub fn create_gateway_order(&self, amount_rupees: f64) -> AppResult<GatewayOrder> {
        if amount_rupees <= 0.0 {
            return Err(AppError::validation("Amount must be positive"));
        }
        Ok(GatewayOrder {
            order_id: format!("order_{}", Uuid::new_v4().simple()),
            amount: (amount_rupees * 100.0).round() as i64,
            currency: "INR".to_string(),
        })
    }

    /// Hex signature over `"{order_id}|{payment_id}"`
    pub fn sign(&self, order_id: &str, payment_id: &str) -> String {
        let tag = hmac::sign(&self.key, format!("{order_id}|{payment_id}").as_bytes());
        hex::encode(tag.as_ref())
    }

    /// Constant-time verification of a gateway signature
    pub fn verify_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> bool {
        let Ok(provided) = hex::decode(signature) else {
            return false;
        };
        hmac::verify(
            &self.key,
            format!("{order_id}|{payment_id}").as_bytes(),
            &provided,
        )
        .is_ok()
    }
}
