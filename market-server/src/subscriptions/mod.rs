//! Subscriptions Module
//!
//! Recurring daily deliveries and the scheduler that materializes them
//! into orders.

pub mod scheduler;

pub use scheduler::SubscriptionScheduler;
