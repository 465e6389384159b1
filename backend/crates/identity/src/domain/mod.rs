//! Domain Layer
//!
//! Contains entities, value objects, and repository traits.

pub mod entity;
pub mod repository;
pub mod value_object;

// Re-exports
pub use entity::{Account, Session, VerificationEntry, VerificationPurpose};
pub use repository::{
    AccountRepository, CodeCheck, CodeDelivery, SessionRepository, VerificationStore,
};
