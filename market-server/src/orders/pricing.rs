//! Order pricing
//!
//! items_price = Σ price × qty
//! tax_price = round(items_price × 5%)
//! shipping_price = 0 above the free-shipping threshold, flat fee below
//! total_amount = items + tax + shipping

use serde::Serialize;

use crate::db::models::OrderItem;

pub const TAX_RATE: f64 = 0.05;
pub const FREE_SHIPPING_THRESHOLD: f64 = 500.0;
pub const FLAT_SHIPPING_FEE: f64 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceBreakdown {
    pub items_price: f64,
    pub tax_price: f64,
    pub shipping_price: f64,
    pub total_amount: f64,
}

pub fn breakdown(items: &[OrderItem]) -> PriceBreakdown {
    let items_price: f64 = items.iter().map(|item| item.line_total()).sum();
    let tax_price = (items_price * TAX_RATE).round();
    let shipping_price = if items_price > FREE_SHIPPING_THRESHOLD {
        0.0
    } else {
        FLAT_SHIPPING_FEE
    };
    PriceBreakdown {
        items_price,
        tax_price,
        shipping_price,
        total_amount: items_price + tax_price + shipping_price,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(price: f64, quantity: i64) -> OrderItem {
        OrderItem {
            product: "product:m".into(),
            name: "Milk".into(),
            price,
            unit: "liter".into(),
            seller: "user:f".into(),
            quantity,
        }
    }

    #[test]
    fn flat_shipping_below_threshold() {
        let b = breakdown(&[item(60.0, 2)]);
        assert_eq!(b.items_price, 120.0);
        assert_eq!(b.tax_price, 6.0);
        assert_eq!(b.shipping_price, FLAT_SHIPPING_FEE);
        assert_eq!(b.total_amount, 166.0);
    }

    #[test]
    fn free_shipping_above_threshold() {
        let b = breakdown(&[item(600.0, 1)]);
        assert_eq!(b.shipping_price, 0.0);
        assert_eq!(b.total_amount, 630.0);
    }

    #[test]
    fn threshold_is_exclusive() {
        // Exactly at the threshold still pays shipping
        let b = breakdown(&[item(500.0, 1)]);
        assert_eq!(b.shipping_price, FLAT_SHIPPING_FEE);
    }

    #[test]
    fn tax_rounds_to_whole_units() {
        // 3 × 21 = 63, 5% = 3.15 -> 3
        let b = breakdown(&[item(21.0, 3)]);
        assert_eq!(b.tax_price, 3.0);
        assert_eq!(b.total_amount, 63.0 + 3.0 + 40.0);
    }

    #[test]
    fn total_is_sum_of_parts() {
        let b = breakdown(&[item(60.0, 3), item(500.0, 1)]);
        assert_eq!(b.total_amount, b.items_price + b.tax_price + b.shipping_price);
    }
}
