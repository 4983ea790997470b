//! Authentication module
//!
//! JWT auth with role-based access:
//! - [`JwtService`] - token generation and validation
//! - [`CurrentUser`] - authenticated user context, usable as an extractor
//! - [`require_auth`] - authentication middleware
//! - [`require_admin`] - admin-only middleware

pub mod extractor;
pub mod jwt;
pub mod middleware;
pub mod password;

pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
pub use middleware::{require_admin, require_auth};
pub use password::{hash_password, verify_password};
