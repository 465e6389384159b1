//! Application Layer
//!
//! Use cases orchestrating the domain and repository traits.

pub mod account_admin;
pub mod authorize;
pub mod config;
pub mod email_change;
pub mod password_reset;
pub mod register;
pub mod sign_in;
pub mod sign_out;
pub mod token;

// Re-exports
pub use account_admin::AccountAdminUseCase;
pub use authorize::{AuthorizeRequestUseCase, AuthorizedIdentity};
pub use config::IdentityConfig;
pub use email_change::EmailChangeUseCase;
pub use password_reset::PasswordResetUseCase;
pub use register::{RegisterUseCase, StartRegistrationInput};
pub use sign_in::{SignInOutput, SignInUseCase};
pub use sign_out::SignOutUseCase;
pub use token::{Claims, TokenIssuer};
