//! Identity and Session Lifecycle Module
//!
//! Clean Architecture structure:
//! - `domain/` - Business logic, entities, repository traits
//! - `application/` - Use cases and application services
//! - `infra/` - Database implementations
//! - `presentation/` - HTTP handlers, DTOs, router
//!
//! ## Features
//! - One-time-code gated registration (no account until proof of email)
//! - Login minting signed bearer tokens backed by revocable sessions
//! - Auth gateway reconciling token claims against server-side sessions
//! - Email change and password reset via short-lived challenges
//! - Role changes and account locks with a self-target guard
//!
//! ## Security Model
//! - Passwords hashed with Argon2id, validated against a small policy
//! - Tokens are HMAC-SHA256 signed; possession alone is never sufficient,
//!   a live session row must back the token
//! - Logout and admin lock revoke sessions immediately, ahead of any
//!   cryptographic expiry
//! - Raw passwords, one-time codes, and tokens never appear in logs

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use application::config::IdentityConfig;
pub use error::{IdentityError, IdentityResult};
pub use infra::postgres::PgIdentityRepository;
pub use presentation::router::identity_router;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

// Convenience re-exports
pub mod config {
    pub use crate::application::config::*;
}

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}

pub mod handlers {
    pub use crate::presentation::handlers::*;
}

pub mod store {
    pub use crate::infra::postgres::PgIdentityRepository as IdentityStore;
}

pub mod router {
    pub use crate::presentation::router::*;
}

pub mod middleware {
    pub use crate::presentation::middleware::*;
}
