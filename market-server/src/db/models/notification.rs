use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use super::serde_helpers;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Order,
    Payment,
    Product,
    System,
    Review,
}

/// In-app notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    /// Recipient user id (`user:key`)
    pub user: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    /// Record this notification refers to (`order:key`, `product:key`, ...)
    #[serde(default)]
    pub related_to: Option<String>,
    pub is_read: bool,
    #[serde(default)]
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        user: String,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        related_to: Option<String>,
    ) -> Self {
        Self {
            id: None,
            user,
            kind,
            title: title.into(),
            message: message.into(),
            related_to,
            is_read: false,
            read_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn id_string(&self) -> String {
        self.id.as_ref().map(|id| id.to_string()).unwrap_or_default()
    }

    pub fn mark_read(&mut self) {
        if !self.is_read {
            self.is_read = true;
            self.read_at = Some(Utc::now());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mark_read_is_idempotent() {
        let mut n = Notification::new(
            "user:c".into(),
            NotificationKind::Order,
            "Order placed",
            "Your order is confirmed",
            Some("order:abc".into()),
        );
        assert!(!n.is_read);
        n.mark_read();
        let first_read_at = n.read_at;
        assert!(n.is_read);
        n.mark_read();
        assert_eq!(n.read_at, first_read_at);
    }
}
