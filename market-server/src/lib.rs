//! Market Server - dairy and livestock marketplace backend
//!
//! # Module structure
//!
//! ```text
//! market-server/src/
//! ├── core/          # configuration, shared state, HTTP server, tasks
//! ├── auth/          # JWT authentication, Argon2 passwords, middleware
//! ├── api/           # HTTP routes and handlers
//! ├── db/            # embedded SurrealDB: models and repositories
//! ├── inventory/     # append-only stock ledger and analytics
//! ├── orders/        # order lifecycle and pricing
//! ├── subscriptions/ # daily delivery scheduler
//! ├── services/      # payment gateway, email, chatbot
//! └── utils/         # errors, logging, time, validation
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod inventory;
pub mod orders;
pub mod services;
pub mod subscriptions;
pub mod utils;

// Re-export public types
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};
