//! Shared Kernel - Domain-crossing minimal core
//!
//! The smallest core of vocabulary shared by every backend crate:
//! - Unified error types and result aliases
//! - Typed ID primitives
//!
//! **Design Principle**: only things that are hard to change and mean the
//! same thing across all domains belong here.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;
