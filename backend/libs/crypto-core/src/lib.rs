//! Shared cryptographic helpers for blog services.
//!
//! - `jwt`: RS256 session tokens carried in the session cookie
//! - `password`: Argon2id password hashing

pub mod jwt;
pub mod password;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use password::{hash_password, verify_password, PasswordError};
