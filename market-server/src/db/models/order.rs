use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use super::serde_helpers;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cod,
    Online,
    Upi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

/// Delivery lifecycle
///
/// `Delivered` and `Cancelled` are terminal: no transition leaves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Pending,
    Confirmed,
    Processing,
    Dispatched,
    InTransit,
    Delivered,
    Cancelled,
}

impl DeliveryStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DeliveryStatus::Delivered | DeliveryStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Pending => "pending",
            DeliveryStatus::Confirmed => "confirmed",
            DeliveryStatus::Processing => "processing",
            DeliveryStatus::Dispatched => "dispatched",
            DeliveryStatus::InTransit => "in_transit",
            DeliveryStatus::Delivered => "delivered",
            DeliveryStatus::Cancelled => "cancelled",
        }
    }
}

/// Order line with seller-side values frozen at purchase time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    /// Product id (`product:key`)
    pub product: String,
    /// Snapshot of the product name at purchase time
    pub name: String,
    /// Snapshot of the unit price at purchase time
    pub price: f64,
    pub unit: String,
    /// Seller user id snapshot (`user:key`)
    pub seller: String,
    pub quantity: i64,
}

impl OrderItem {
    pub fn line_total(&self) -> f64 {
        self.price * self.quantity as f64
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub street: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentInfo {
    #[serde(default)]
    pub gateway_order_id: Option<String>,
    #[serde(default)]
    pub gateway_payment_id: Option<String>,
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
}

/// Append-only delivery status trail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusEntry {
    pub status: DeliveryStatus,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackingInfo {
    #[serde(default)]
    pub carrier: Option<String>,
    #[serde(default)]
    pub tracking_number: Option<String>,
    #[serde(default)]
    pub estimated_delivery: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    /// Buyer user id (`user:key`)
    pub buyer: String,
    pub items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub payment: PaymentInfo,
    pub payment_status: PaymentStatus,
    pub items_price: f64,
    pub tax_price: f64,
    pub shipping_price: f64,
    pub total_amount: f64,
    pub delivery_status: DeliveryStatus,
    pub status_history: Vec<StatusEntry>,
    #[serde(default)]
    pub tracking: Option<TrackingInfo>,
    /// Subscription id when the order was materialized by the scheduler
    #[serde(default)]
    pub subscription: Option<String>,
    #[serde(default)]
    pub delivered_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cancelled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn id_string(&self) -> String {
        self.id.as_ref().map(|id| id.to_string()).unwrap_or_default()
    }

    /// True when `user_id` sells at least one line of this order
    pub fn has_seller(&self, user_id: &str) -> bool {
        self.items.iter().any(|item| item.seller == user_id)
    }

    pub fn push_status(&mut self, status: DeliveryStatus, note: Option<String>) {
        self.status_history.push(StatusEntry {
            status,
            timestamp: Utc::now(),
            note,
        });
        self.delivery_status = status;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses() {
        assert!(DeliveryStatus::Delivered.is_terminal());
        assert!(DeliveryStatus::Cancelled.is_terminal());
        assert!(!DeliveryStatus::Pending.is_terminal());
        assert!(!DeliveryStatus::InTransit.is_terminal());
    }

    #[test]
    fn push_status_appends_and_updates() {
        let mut order = Order {
            id: None,
            buyer: "user:b".into(),
            items: vec![],
            shipping_address: ShippingAddress {
                street: "1 Farm Rd".into(),
                city: "Pune".into(),
                state: "MH".into(),
                pincode: "411001".into(),
                phone: None,
            },
            payment_method: PaymentMethod::Cod,
            payment: PaymentInfo::default(),
            payment_status: PaymentStatus::Pending,
            items_price: 0.0,
            tax_price: 0.0,
            shipping_price: 0.0,
            total_amount: 0.0,
            delivery_status: DeliveryStatus::Pending,
            status_history: vec![],
            tracking: None,
            subscription: None,
            delivered_at: None,
            cancelled_at: None,
            cancellation_reason: None,
            created_at: Utc::now(),
        };
        order.push_status(DeliveryStatus::Confirmed, Some("confirmed by seller".into()));
        assert_eq!(order.delivery_status, DeliveryStatus::Confirmed);
        assert_eq!(order.status_history.len(), 1);
    }

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(DeliveryStatus::InTransit).unwrap(),
            serde_json::json!("in_transit")
        );
    }
}
