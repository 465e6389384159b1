//! Platform Crate - Technical Infrastructure
//!
//! Shared technical foundations:
//! - Cryptographic utilities (random material, one-time codes, constant-time compare)
//! - Password hashing (Argon2id) and password policy validation

pub mod crypto;
pub mod password;
