//! Inventory Module
//!
//! The append-only stock ledger and the analytics built on top of it.
//! Every change to a product's stock level goes through [`StockLedger`].

pub mod analytics;
pub mod ledger;

pub use analytics::InventoryAnalytics;
pub use ledger::{StockChange, StockLedger};
