//! Infrastructure Layer
//!
//! Repository trait implementations and external collaborators.

pub mod delivery;
pub mod memory;
pub mod postgres;

// Re-exports
pub use delivery::{CapturingCodeDelivery, TracingCodeDelivery};
pub use memory::MemoryIdentityRepository;
pub use postgres::PgIdentityRepository;
