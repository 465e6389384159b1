//! Value Objects

pub mod account_role;
pub mod email;

pub use account_role::AccountRole;
pub use email::Email;
