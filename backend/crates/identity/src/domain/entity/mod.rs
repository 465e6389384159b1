//! Domain Entities

pub mod account;
pub mod session;
pub mod verification;

pub use account::Account;
pub use session::Session;
pub use verification::{VerificationEntry, VerificationPurpose};
