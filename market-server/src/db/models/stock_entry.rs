use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use super::serde_helpers;

/// Why a product's stock level changed
///
/// The sign of the resulting delta is fixed by the kind, not by the caller:
/// inbound kinds add, outbound kinds subtract, and only `Adjustment` carries
/// a caller-chosen sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockChangeKind {
    /// Stock bought or produced
    Purchase,
    /// Stock sold through an order or subscription
    Sale,
    /// Customer return coming back in
    Return,
    Damaged,
    Expired,
    /// Manual correction, signed by the caller
    Adjustment,
}

impl StockChangeKind {
    /// Convert a caller quantity into the delta applied to stock
    ///
    /// For every kind except `Adjustment` the magnitude is taken and the
    /// sign imposed, so `Sale` with quantity 5 or -5 both subtract 5.
    pub fn signed_delta(&self, quantity: i64) -> i64 {
        match self {
            StockChangeKind::Purchase | StockChangeKind::Return => quantity.abs(),
            StockChangeKind::Sale | StockChangeKind::Damaged | StockChangeKind::Expired => {
                -quantity.abs()
            }
            StockChangeKind::Adjustment => quantity,
        }
    }

    pub fn is_outbound(&self) -> bool {
        matches!(
            self,
            StockChangeKind::Sale | StockChangeKind::Damaged | StockChangeKind::Expired
        )
    }
}

/// What a ledger entry is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelatedModel {
    Order,
    Subscription,
    Manual,
}

/// Optional batch tracking on inbound entries
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Batch {
    #[serde(default)]
    pub batch_number: Option<String>,
    /// "YYYY-MM-DD"
    #[serde(default)]
    pub expiry_date: Option<String>,
    /// "YYYY-MM-DD"
    #[serde(default)]
    pub manufacturing_date: Option<String>,
}

/// Append-only stock ledger entry
///
/// `previous_stock + signed_delta == new_stock` holds on every row; the
/// ledger is the source of truth for the product's `stock` field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockEntry {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    /// Product id (`product:key`)
    pub product: String,
    pub kind: StockChangeKind,
    /// Magnitude as given by the caller
    pub quantity: i64,
    /// Delta actually applied, see [`StockChangeKind::signed_delta`]
    pub signed_delta: i64,
    pub previous_stock: i64,
    pub new_stock: i64,
    #[serde(default)]
    pub reason: Option<String>,
    /// Record this change is attributed to (`order:key` / `subscription:key`)
    #[serde(default)]
    pub related_to: Option<String>,
    #[serde(default)]
    pub related_model: Option<RelatedModel>,
    /// User who triggered the change
    #[serde(default)]
    pub performed_by: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub batch: Option<Batch>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outbound_kinds_subtract_regardless_of_sign() {
        assert_eq!(StockChangeKind::Sale.signed_delta(5), -5);
        assert_eq!(StockChangeKind::Sale.signed_delta(-5), -5);
        assert_eq!(StockChangeKind::Damaged.signed_delta(3), -3);
        assert_eq!(StockChangeKind::Expired.signed_delta(-2), -2);
    }

    #[test]
    fn inbound_kinds_add_regardless_of_sign() {
        assert_eq!(StockChangeKind::Purchase.signed_delta(10), 10);
        assert_eq!(StockChangeKind::Purchase.signed_delta(-10), 10);
        assert_eq!(StockChangeKind::Return.signed_delta(4), 4);
    }

    #[test]
    fn adjustment_keeps_caller_sign() {
        assert_eq!(StockChangeKind::Adjustment.signed_delta(7), 7);
        assert_eq!(StockChangeKind::Adjustment.signed_delta(-7), -7);
    }
}
