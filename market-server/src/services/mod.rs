//! External-facing collaborators
//!
//! Payment signature verification, the fire-and-forget email gateway and
//! the chatbot.

pub mod chatbot;
pub mod email;
pub mod payment;

pub use chatbot::{ChatService, ChatSessions};
pub use email::EmailService;
pub use payment::{GatewayOrder, PaymentService};
