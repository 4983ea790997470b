//! Shared utilities: error handling, logging, time and input validation.

pub mod error;
pub mod logger;
pub mod time;
pub mod validation;

pub use error::{AppError, AppResponse, AppResult, ok, ok_with_message};
