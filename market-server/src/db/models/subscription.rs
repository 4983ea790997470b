use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use super::order::ShippingAddress;
use super::serde_helpers;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryTime {
    Morning,
    Evening,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Paused,
    Cancelled,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionPayment {
    Cod,
    Prepaid,
}

/// Recurring daily delivery of a single product
///
/// Calendar fields are `YYYY-MM-DD` strings so SurrealQL string comparison
/// orders them correctly. Only `Active` subscriptions are picked up by the
/// scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    /// Subscriber user id (`user:key`)
    pub subscriber: String,
    /// Product id (`product:key`)
    pub product: String,
    /// Seller user id snapshot (`user:key`)
    pub seller: String,
    pub quantity: i64,
    pub delivery_time: DeliveryTime,
    /// "YYYY-MM-DD"
    pub start_date: String,
    /// "YYYY-MM-DD", open-ended when absent
    #[serde(default)]
    pub end_date: Option<String>,
    pub status: SubscriptionStatus,
    pub shipping_address: ShippingAddress,
    /// Total charged per materialized delivery
    pub price_per_delivery: f64,
    pub payment_method: SubscriptionPayment,
    /// "YYYY-MM-DD", next day the scheduler should deliver
    pub next_delivery_date: String,
    #[serde(default)]
    pub last_delivery_date: Option<String>,
    pub delivery_count: u32,
    pub created_at: DateTime<Utc>,
}

impl Subscription {
    pub fn id_string(&self) -> String {
        self.id.as_ref().map(|id| id.to_string()).unwrap_or_default()
    }

    /// Advance `next_delivery_date` by exactly one day
    ///
    /// An unparseable date leaves the field untouched; the scheduler logs
    /// and skips such rows rather than looping on them.
    pub fn advance_next_delivery(&mut self) {
        if let Ok(date) = self.next_delivery_date.parse::<NaiveDate>()
            && let Some(next) = date.succ_opt()
        {
            self.next_delivery_date = next.format("%Y-%m-%d").to_string();
        }
    }

    /// True once `next_delivery_date` has moved past `end_date`
    pub fn past_end_date(&self) -> bool {
        match &self.end_date {
            Some(end) => self.next_delivery_date.as_str() > end.as_str(),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Subscription {
        Subscription {
            id: None,
            subscriber: "user:c".into(),
            product: "product:milk".into(),
            seller: "user:f".into(),
            quantity: 2,
            delivery_time: DeliveryTime::Morning,
            start_date: "2026-03-01".into(),
            end_date: Some("2026-03-03".into()),
            status: SubscriptionStatus::Active,
            shipping_address: ShippingAddress {
                street: "1 Farm Rd".into(),
                city: "Pune".into(),
                state: "MH".into(),
                pincode: "411001".into(),
                phone: None,
            },
            price_per_delivery: 120.0,
            payment_method: SubscriptionPayment::Cod,
            next_delivery_date: "2026-03-01".into(),
            last_delivery_date: None,
            delivery_count: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn advance_moves_one_day_across_month_end() {
        let mut sub = sample();
        sub.next_delivery_date = "2026-02-28".into();
        sub.advance_next_delivery();
        assert_eq!(sub.next_delivery_date, "2026-03-01");
    }

    #[test]
    fn end_date_comparison_is_lexicographic() {
        let mut sub = sample();
        assert!(!sub.past_end_date());
        sub.next_delivery_date = "2026-03-04".into();
        assert!(sub.past_end_date());
        sub.end_date = None;
        assert!(!sub.past_end_date());
    }
}
